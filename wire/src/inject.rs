//! Parameter wrappers that declare how a producer wants each dependency.
//!
//! A producer parameter is one of:
//!
//! - [`Val<T>`]: its own clone of the stored `T`.
//! - [`Ref<T>`]: a shared `Arc<T>` pointing at the stored value.
//! - [`Cap<I>`]: the stored value seen through a trait object `Arc<I>`
//!   registered with [`Target::expose`](crate::Target::expose).

use crate::core::{deref_ref, deref_shared, Shape, View};
use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A type that can be built from a [`View`] of a stored dependency.
pub trait Inject: Sized {
  /// The shape this parameter asks the registry for.
  fn shape() -> Shape;

  /// Builds the parameter from the adapted view.
  ///
  /// Returns `None` if the view does not have the declared shape.
  fn from_view(view: View<'_>) -> Option<Self>;
}

/// A dependency received by value.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Val<T>(pub T);

/// A dependency received as a shared handle.
pub struct Ref<T: ?Sized>(pub Arc<T>);

/// A dependency received through one of its capability views.
pub struct Cap<I: ?Sized>(pub Arc<I>);

impl<T> Val<T> {
  pub fn into_inner(self) -> T {
    self.0
  }
}

impl<T: ?Sized> Ref<T> {
  pub fn into_inner(self) -> Arc<T> {
    self.0
  }
}

impl<I: ?Sized> Cap<I> {
  pub fn into_inner(self) -> Arc<I> {
    self.0
  }
}

impl<T> Deref for Val<T> {
  type Target = T;

  fn deref(&self) -> &T {
    &self.0
  }
}

impl<T: ?Sized> Deref for Ref<T> {
  type Target = T;

  fn deref(&self) -> &T {
    &self.0
  }
}

impl<I: ?Sized> Deref for Cap<I> {
  type Target = I;

  fn deref(&self) -> &I {
    &self.0
  }
}

impl<T: ?Sized> Clone for Ref<T> {
  fn clone(&self) -> Self {
    Ref(Arc::clone(&self.0))
  }
}

impl<I: ?Sized> Clone for Cap<I> {
  fn clone(&self) -> Self {
    Cap(Arc::clone(&self.0))
  }
}

impl<T: fmt::Debug> fmt::Debug for Val<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Val").field(&self.0).finish()
  }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Ref<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Ref").field(&&*self.0).finish()
  }
}

impl<I: ?Sized> fmt::Debug for Cap<I> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Cap<{}>", std::any::type_name::<I>())
  }
}

impl<T: Any + Clone + Send + Sync> Inject for Val<T> {
  fn shape() -> Shape {
    Shape::value::<T>()
  }

  fn from_view(view: View<'_>) -> Option<Self> {
    match view {
      View::Value(value) => deref_ref::<T>(value).cloned().map(Val),
      _ => None,
    }
  }
}

impl<T: Any + Send + Sync> Inject for Ref<T> {
  fn shape() -> Shape {
    Shape::reference::<T>()
  }

  fn from_view(view: View<'_>) -> Option<Self> {
    match view {
      View::Reference(shared) => deref_shared::<T>(shared).map(Ref),
      _ => None,
    }
  }
}

impl<I: ?Sized + Any + Send + Sync> Inject for Cap<I> {
  fn shape() -> Shape {
    Shape::capability::<I>()
  }

  fn from_view(view: View<'_>) -> Option<Self> {
    match view {
      View::Capability(view) => view.downcast_ref::<Arc<I>>().cloned().map(Cap),
      _ => None,
    }
  }
}
