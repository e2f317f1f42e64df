//! Core data structures: the stored dependency and the shape negotiation
//! between a stored value and the call site that consumes it.

use std::any::{self, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// How a call site wants to receive a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
  /// A private copy of the stored value.
  Value,
  /// A shared handle (`Arc<T>`) to the stored value.
  Reference,
  /// A trait-object view (`Arc<dyn Trait>`) registered for the stored value.
  Capability,
}

/// The exact parameter shape a producer or a record field declares.
///
/// For `Value` and `Reference` the `type_id` is the concrete stored type; a
/// value stored as `Arc<T>` also satisfies either shape for `T`. For
/// `Capability` it is the trait object type (`dyn Trait`).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
  pub kind: ShapeKind,
  pub type_id: TypeId,
  pub type_name: &'static str,
  pointer_id: Option<TypeId>,
}

impl Shape {
  pub fn value<T: Any>() -> Self {
    Self {
      kind: ShapeKind::Value,
      type_id: TypeId::of::<T>(),
      type_name: any::type_name::<T>(),
      pointer_id: Some(TypeId::of::<Arc<T>>()),
    }
  }

  pub fn reference<T: Any>() -> Self {
    Self {
      kind: ShapeKind::Reference,
      type_id: TypeId::of::<T>(),
      type_name: any::type_name::<T>(),
      pointer_id: Some(TypeId::of::<Arc<T>>()),
    }
  }

  pub fn capability<I: ?Sized + Any>() -> Self {
    Self {
      kind: ShapeKind::Capability,
      type_id: TypeId::of::<I>(),
      type_name: any::type_name::<I>(),
      pointer_id: None,
    }
  }
}

impl Shape {
  /// Whether a concrete stored type satisfies this shape, either directly or
  /// through one `Arc`.
  fn accepts(&self, stored: TypeId) -> bool {
    stored == self.type_id || Some(stored) == self.pointer_id
  }
}

impl fmt::Debug for Shape {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.kind {
      ShapeKind::Value => write!(f, "{}", self.type_name),
      ShapeKind::Reference => write!(f, "Arc<{}>", self.type_name),
      ShapeKind::Capability => write!(f, "Arc<{}> (capability)", self.type_name),
    }
  }
}

impl fmt::Display for Shape {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

/// A stored value adapted to a requested [`Shape`].
///
/// Views borrow from the [`Dependency`] they were taken from, except
/// `Reference`, which is a fresh strong handle to the same allocation.
pub enum View<'a> {
  /// The concrete stored value, to be cloned by the receiver.
  Value(&'a (dyn Any + Send + Sync)),
  /// A shared handle to the concrete stored value.
  Reference(Arc<dyn Any + Send + Sync>),
  /// An `Arc<dyn Trait>` registered as a capability of the stored value.
  Capability(&'a (dyn Any + Send + Sync)),
}

impl fmt::Debug for View<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      View::Value(_) => f.write_str("View::Value"),
      View::Reference(_) => f.write_str("View::Reference"),
      View::Capability(_) => f.write_str("View::Capability"),
    }
  }
}

/// A value owned by the registry.
///
/// Cloning a `Dependency` clones the handle, not the value. The stored value
/// is never handed out mutably. A stored `Arc<T>` (a producer that returns a
/// pointer) is also readable as a `T`; the pointee is shared, not copied.
#[derive(Clone)]
pub struct Dependency {
  type_id: TypeId,
  type_name: &'static str,
  value: Arc<dyn Any + Send + Sync>,
  capabilities: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Dependency {
  /// Wraps a plain value.
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self::from_arc(Arc::new(value))
  }

  /// Stores an already shared value without adding another indirection.
  pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
    Self {
      type_id: TypeId::of::<T>(),
      type_name: any::type_name::<T>(),
      value,
      capabilities: HashMap::new(),
    }
  }

  pub fn type_id(&self) -> TypeId {
    self.type_id
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub fn is<T: Any>(&self) -> bool {
    self.type_id == TypeId::of::<T>()
  }

  /// Returns a shared handle to the stored value if it is a `T` or an
  /// `Arc<T>`.
  pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    deref_shared(Arc::clone(&self.value))
  }

  /// Borrows the stored value if it is a `T` or an `Arc<T>`.
  pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
    deref_ref(&*self.value)
  }

  /// Returns the registered `I` view of the stored value.
  pub fn capability<I: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<I>> {
    self
      .capabilities
      .get(&TypeId::of::<I>())
      .and_then(|view| view.downcast_ref::<Arc<I>>())
      .cloned()
  }

  pub fn has_capability<I: ?Sized + Any>(&self) -> bool {
    self.capabilities.contains_key(&TypeId::of::<I>())
  }

  /// Registers an `I` view of the stored `T`.
  ///
  /// Returns `false` and leaves the dependency untouched if the stored value
  /// is not a `T`.
  pub(crate) fn expose<T, I>(&mut self, cast: &(dyn Fn(Arc<T>) -> Arc<I> + Send + Sync)) -> bool
  where
    T: Any + Send + Sync,
    I: ?Sized + Any + Send + Sync,
  {
    let Some(concrete) = self.downcast::<T>() else {
      return false;
    };
    let view: Arc<I> = cast(concrete);
    self
      .capabilities
      .insert(TypeId::of::<I>(), Arc::new(view) as Arc<dyn Any + Send + Sync>);
    true
  }

  /// Adapts the stored value to what the call site declares.
  ///
  /// Returns `None` when the stored value cannot take that shape: a
  /// different concrete type for `Value`/`Reference`, or no registered view
  /// for `Capability`.
  pub fn view(&self, shape: &Shape) -> Option<View<'_>> {
    match shape.kind {
      ShapeKind::Value if shape.accepts(self.type_id) => Some(View::Value(&*self.value)),
      ShapeKind::Reference if shape.accepts(self.type_id) => {
        Some(View::Reference(Arc::clone(&self.value)))
      }
      ShapeKind::Capability => self
        .capabilities
        .get(&shape.type_id)
        .map(|view| View::Capability(&**view)),
      _ => None,
    }
  }
}

/// Downcasts to `Arc<T>`, seeing through a stored `Arc<Arc<T>>`.
pub(crate) fn deref_shared<T: Any + Send + Sync>(
  value: Arc<dyn Any + Send + Sync>,
) -> Option<Arc<T>> {
  match value.downcast::<T>() {
    Ok(value) => Some(value),
    Err(value) => value
      .downcast::<Arc<T>>()
      .ok()
      .map(|pointer| Arc::clone(&*pointer)),
  }
}

/// Borrows as `T`, seeing through a stored `Arc<T>`.
pub(crate) fn deref_ref<T: Any>(value: &(dyn Any + Send + Sync)) -> Option<&T> {
  value
    .downcast_ref::<T>()
    .or_else(|| value.downcast_ref::<Arc<T>>().map(|pointer| &**pointer))
}

impl fmt::Debug for Dependency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Dependency")
      .field("type_name", &self.type_name)
      .field("capabilities", &self.capabilities.len())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  trait Named: Send + Sync {
    fn name(&self) -> &str;
  }

  #[derive(Debug, Clone, PartialEq)]
  struct Widget {
    label: String,
  }

  impl Named for Widget {
    fn name(&self) -> &str {
      &self.label
    }
  }

  #[test]
  fn value_view_requires_matching_type() {
    let dep = Dependency::new(7_u32);

    assert!(matches!(dep.view(&Shape::value::<u32>()), Some(View::Value(_))));
    assert!(dep.view(&Shape::value::<u64>()).is_none());
  }

  #[test]
  fn reference_view_shares_the_stored_allocation() {
    let dep = Dependency::new(Widget { label: "a".into() });

    let Some(View::Reference(shared)) = dep.view(&Shape::reference::<Widget>()) else {
      panic!("expected a reference view");
    };
    let shared = shared.downcast::<Widget>().unwrap();
    assert!(Arc::ptr_eq(&shared, &dep.downcast::<Widget>().unwrap()));
  }

  #[test]
  fn capability_view_needs_exposure() {
    let mut dep = Dependency::new(Widget { label: "w".into() });
    assert!(dep.view(&Shape::capability::<dyn Named>()).is_none());

    assert!(dep.expose::<Widget, dyn Named>(&|w| w as Arc<dyn Named>));
    assert!(dep.has_capability::<dyn Named>());

    let named = dep.capability::<dyn Named>().unwrap();
    assert_eq!(named.name(), "w");
  }

  #[test]
  fn expose_rejects_wrong_concrete_type() {
    let mut dep = Dependency::new(1_i32);
    assert!(!dep.expose::<Widget, dyn Named>(&|w| w as Arc<dyn Named>));
    assert!(!dep.has_capability::<dyn Named>());
  }

  #[test]
  fn pointer_result_satisfies_value_and_reference_shapes() {
    let inner = Arc::new(Widget { label: "p".into() });
    let dep = Dependency::new(Arc::clone(&inner));

    assert!(matches!(dep.view(&Shape::value::<Widget>()), Some(View::Value(_))));
    assert!(matches!(dep.view(&Shape::reference::<Widget>()), Some(View::Reference(_))));
    assert!(dep.view(&Shape::value::<String>()).is_none());

    assert_eq!(dep.downcast_ref::<Widget>().map(|w| w.name()), Some("p"));
    assert!(Arc::ptr_eq(&inner, &dep.downcast::<Widget>().unwrap()));
    // The pointer itself is still available.
    assert!(dep.downcast::<Arc<Widget>>().is_some());
  }

  #[test]
  fn from_arc_does_not_double_wrap() {
    let shared = Arc::new(Widget { label: "x".into() });
    let dep = Dependency::from_arc(Arc::clone(&shared));

    assert!(dep.is::<Widget>());
    assert!(Arc::ptr_eq(&shared, &dep.downcast::<Widget>().unwrap()));
  }
}
