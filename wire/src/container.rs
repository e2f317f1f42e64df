//! The main `Container` struct and its associated methods.

use crate::core::{Dependency, Shape, View};
use crate::error::{RegistryError, Result};
use crate::producer::{Capability, Producer, Slot, SlotKind, Target, TargetKind};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::{self, Any};
use std::sync::Arc;

/// The dependency registry.
///
/// Holds one value per name. It is thread-safe; registrations are atomic,
/// and every producer runs exactly once, at registration time.
#[derive(Default)]
pub struct Container {
  dependencies: DashMap<String, Dependency>,
}

impl Container {
  /// Creates a new, empty `Container`.
  pub fn new() -> Self {
    Self::default()
  }

  // --- PRIVATE HELPERS ---

  fn invoke(&self, name: &str, producer: Box<dyn Producer>, deps: &[&str]) -> Result<Dependency> {
    let signature = producer.signature();
    check_results(name, &signature.results)?;

    if deps.len() != signature.params.len() {
      return Err(RegistryError::ArityMismatch {
        name: name.to_owned(),
        expected: signature.params.len(),
        actual: deps.len(),
      });
    }

    // Resolve everything before adapting, so a miss never leads to a call.
    let resolved = deps
      .iter()
      .map(|dep| {
        self.fetch(dep).map_err(|_| RegistryError::UnknownDependency {
          name: name.to_owned(),
          dependency: (*dep).to_owned(),
        })
      })
      .collect::<Result<Vec<_>>>()?;

    let args = resolved
      .iter()
      .zip(&signature.params)
      .zip(deps)
      .map(|((dependency, shape), dep)| adapt(dep, dependency, shape))
      .collect::<Result<Vec<_>>>()?;

    tracing::trace!(name, deps = ?deps, "invoking producer");
    let slots = producer
      .invoke(args)
      .map_err(|err| RegistryError::InvalidSignature {
        name: name.to_owned(),
        reason: err.to_string(),
      })?;

    take_value(name, &signature.results, slots)
  }

  fn attach(name: &str, dependency: &mut Dependency, capabilities: Vec<Capability>) -> Result<()> {
    for capability in capabilities {
      if !(capability.attach)(dependency) {
        return Err(RegistryError::TypeMismatch {
          name: name.to_owned(),
          expected: capability.concrete,
          found: dependency.type_name(),
        });
      }
    }
    Ok(())
  }

  // --- PUBLIC API ---

  // --- Registration ---

  /// Registers `target` under `name`.
  ///
  /// A producer is invoked right away with the dependencies named in `deps`,
  /// in parameter order. A plain value takes no dependencies. On any error
  /// the container is left unchanged.
  pub fn register(&self, name: &str, target: Target, deps: &[&str]) -> Result<()> {
    if self.dependencies.contains_key(name) {
      return Err(RegistryError::DuplicateName(name.to_owned()));
    }

    let Target { kind, capabilities } = target;
    let mut dependency = match kind {
      TargetKind::Value(dependency) => {
        if !deps.is_empty() {
          return Err(RegistryError::NotCallable {
            name: name.to_owned(),
            deps: deps.len(),
          });
        }
        dependency
      }
      TargetKind::Producer(producer) => self.invoke(name, producer, deps)?,
    };
    Self::attach(name, &mut dependency, capabilities)?;

    match self.dependencies.entry(name.to_owned()) {
      Entry::Occupied(_) => Err(RegistryError::DuplicateName(name.to_owned())),
      Entry::Vacant(slot) => {
        tracing::debug!(name, deps = ?deps, type_name = dependency.type_name(), "registered dependency");
        slot.insert(dependency);
        Ok(())
      }
    }
  }

  /// Shorthand for registering a plain value.
  pub fn register_value<T: Any + Send + Sync>(&self, name: &str, value: T) -> Result<()> {
    self.register(name, Target::value(value), &[])
  }

  // --- Resolution ---

  /// Looks up a dependency by name. Never invokes anything.
  pub fn fetch(&self, name: &str) -> Result<Dependency> {
    tracing::trace!(name, "fetching dependency");
    self
      .dependencies
      .get(name)
      .map(|entry| entry.value().clone())
      .ok_or_else(|| RegistryError::NotFound(name.to_owned()))
  }

  /// Fetches `name` as a shared `T`.
  pub fn resolve<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
    let dependency = self.fetch(name)?;
    dependency
      .downcast::<T>()
      .ok_or_else(|| RegistryError::TypeMismatch {
        name: name.to_owned(),
        expected: any::type_name::<T>(),
        found: dependency.type_name(),
      })
  }

  /// Fetches `name` through its `I` capability view.
  pub fn resolve_capability<I: ?Sized + Any + Send + Sync>(&self, name: &str) -> Result<Arc<I>> {
    self
      .fetch(name)?
      .capability::<I>()
      .ok_or_else(|| RegistryError::IncompatibleDependency {
        dependency: name.to_owned(),
        expected: Shape::capability::<I>(),
      })
  }

  // --- Introspection ---

  pub fn contains(&self, name: &str) -> bool {
    self.dependencies.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.dependencies.len()
  }

  pub fn is_empty(&self) -> bool {
    self.dependencies.is_empty()
  }

  /// Registered names, sorted.
  pub fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self
      .dependencies
      .iter()
      .map(|entry| entry.key().clone())
      .collect();
    names.sort();
    names
  }
}

impl std::fmt::Debug for Container {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Container")
      .field("names", &self.names())
      .finish()
  }
}

fn check_results(name: &str, results: &[SlotKind]) -> Result<()> {
  let reason = match results {
    [SlotKind::Value] | [SlotKind::Value, SlotKind::Error] => return Ok(()),
    [SlotKind::Value, _] => "second result must be an error".to_owned(),
    [_] | [_, _] => "first result must be a value".to_owned(),
    _ => format!("expected 1 or 2 results, found {}", results.len()),
  };
  Err(RegistryError::InvalidSignature {
    name: name.to_owned(),
    reason,
  })
}

fn adapt<'a>(name: &str, dependency: &'a Dependency, shape: &Shape) -> Result<View<'a>> {
  dependency
    .view(shape)
    .ok_or_else(|| RegistryError::IncompatibleDependency {
      dependency: name.to_owned(),
      expected: *shape,
    })
}

fn take_value(name: &str, declared: &[SlotKind], slots: Vec<Slot>) -> Result<Dependency> {
  let invalid = |reason: &str| RegistryError::InvalidSignature {
    name: name.to_owned(),
    reason: reason.to_owned(),
  };

  let returned: Vec<SlotKind> = slots.iter().map(Slot::kind).collect();
  if returned != declared {
    return Err(invalid("returned results differ from the declared signature"));
  }

  let mut slots = slots.into_iter();
  let value = slots.next();
  match slots.next() {
    Some(Slot::Error(Some(err))) => return Err(RegistryError::ProducerFailed(err)),
    Some(Slot::Error(None)) | None => {}
    Some(_) => return Err(invalid("second result must be an error")),
  }

  match value {
    Some(Slot::Value(dependency)) => Ok(dependency),
    _ => Err(invalid("producer returned no value")),
  }
}
