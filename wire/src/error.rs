use crate::core::Shape;

/// The error type producers report failures with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;

/// Errors returned by [`Container`](crate::Container) operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
  /// Dependency names were supplied for a target that cannot be invoked.
  #[error("'{name}' is not callable but {deps} dependencies were given")]
  NotCallable { name: String, deps: usize },

  /// A producer's results are not `[value]` or `[value, error]`.
  #[error("invalid producer signature for '{name}': {reason}")]
  InvalidSignature { name: String, reason: String },

  #[error("'{name}' expects {expected} dependencies, {actual} given")]
  ArityMismatch {
    name: String,
    expected: usize,
    actual: usize,
  },

  #[error("'{name}' depends on unknown dependency '{dependency}'")]
  UnknownDependency { name: String, dependency: String },

  /// A stored dependency cannot be adapted to the shape a call site declares.
  #[error("dependency '{dependency}' cannot be provided as {expected}")]
  IncompatibleDependency { dependency: String, expected: Shape },

  #[error("'{name}' holds {found}, not {expected}")]
  TypeMismatch {
    name: String,
    expected: &'static str,
    found: &'static str,
  },

  #[error("'{0}' is already registered")]
  DuplicateName(String),

  /// The producer's own error, unchanged.
  #[error(transparent)]
  ProducerFailed(BoxError),

  #[error("dependency '{0}' not found")]
  NotFound(String),

  #[error("invalid populate target: {reason}")]
  InvalidTarget { reason: String },

  #[error("field '{0}' cannot be assigned")]
  Unassignable(String),

  #[error("field '{field}' requires unresolved dependency '{dependency}'")]
  UnresolvedField { field: String, dependency: String },
}

impl RegistryError {
  /// The producer's error, if this is a `ProducerFailed`.
  pub fn producer_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
    match self {
      RegistryError::ProducerFailed(err) => Some(err.as_ref()),
      _ => None,
    }
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, RegistryError::NotFound(_))
  }
}
