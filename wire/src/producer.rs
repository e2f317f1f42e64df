//! Producers and registration targets.
//!
//! A [`Producer`] describes itself with a [`Signature`] and is invoked once,
//! at registration time, with one [`View`] per declared parameter. Closures
//! become producers through [`Target::producer`] and [`Target::fallible`];
//! anything else can implement the trait directly.

use crate::core::{Dependency, Shape, View};
use crate::error::BoxError;
use crate::inject::Inject;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// The declared kind of a result slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
  /// The produced value.
  Value,
  /// An error-capable slot; nil means success.
  Error,
}

/// A result slot returned from [`Producer::invoke`].
pub enum Slot {
  Value(Dependency),
  /// No value. Only valid next to a non-nil error.
  Absent,
  Error(Option<BoxError>),
}

impl Slot {
  pub fn kind(&self) -> SlotKind {
    match self {
      Slot::Value(_) | Slot::Absent => SlotKind::Value,
      Slot::Error(_) => SlotKind::Error,
    }
  }
}

impl fmt::Debug for Slot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Slot::Value(dep) => f.debug_tuple("Value").field(dep).finish(),
      Slot::Absent => f.write_str("Absent"),
      Slot::Error(err) => f.debug_tuple("Error").field(err).finish(),
    }
  }
}

/// Parameter shapes and result slots of a producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
  pub params: Vec<Shape>,
  pub results: Vec<SlotKind>,
}

impl Signature {
  pub fn new(params: Vec<Shape>, results: Vec<SlotKind>) -> Self {
    Self { params, results }
  }
}

/// Raised by a producer that was handed an argument it cannot use.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvokeError {
  #[error("argument {position} does not match the declared {expected:?}")]
  Argument { position: usize, expected: Shape },
  #[error("expected {expected} arguments, received {actual}")]
  Count { expected: usize, actual: usize },
}

/// A callable registered under a name.
pub trait Producer {
  fn signature(&self) -> Signature;

  /// Runs the producer. `args` holds one view per declared parameter, in
  /// order, already adapted to the declared shapes.
  fn invoke(self: Box<Self>, args: Vec<View<'_>>) -> Result<Vec<Slot>, InvokeError>;
}

type Exposure = Box<dyn Fn(&mut Dependency) -> bool>;

/// A capability view to attach to the produced value.
pub(crate) struct Capability {
  pub(crate) concrete: &'static str,
  pub(crate) attach: Exposure,
}

pub(crate) enum TargetKind {
  Value(Dependency),
  Producer(Box<dyn Producer>),
}

/// What gets registered under a name: a plain value or a producer.
pub struct Target {
  pub(crate) kind: TargetKind,
  pub(crate) capabilities: Vec<Capability>,
}

impl Target {
  /// A plain value, stored as is.
  pub fn value<T: Any + Send + Sync>(value: T) -> Self {
    Self::from_dependency(Dependency::new(value))
  }

  /// A value that is already behind an `Arc`. The registry keeps the same
  /// allocation.
  pub fn shared<T: Any + Send + Sync>(value: Arc<T>) -> Self {
    Self::from_dependency(Dependency::from_arc(value))
  }

  pub fn from_dependency(dependency: Dependency) -> Self {
    Self {
      kind: TargetKind::Value(dependency),
      capabilities: Vec::new(),
    }
  }

  /// A closure with a single result.
  pub fn producer<F, Args>(f: F) -> Self
  where
    Plain<F, Args>: Producer + 'static,
  {
    Self::from_producer(Plain {
      f,
      _args: PhantomData,
    })
  }

  /// A closure returning `Result<T, E>`. An `Err` aborts the registration.
  pub fn fallible<F, Args>(f: F) -> Self
  where
    Fallible<F, Args>: Producer + 'static,
  {
    Self::from_producer(Fallible {
      f,
      _args: PhantomData,
    })
  }

  pub fn from_producer(producer: impl Producer + 'static) -> Self {
    Self {
      kind: TargetKind::Producer(Box::new(producer)),
      capabilities: Vec::new(),
    }
  }

  pub fn is_callable(&self) -> bool {
    matches!(self.kind, TargetKind::Producer(_))
  }

  /// Makes the stored `T` available to consumers asking for `Cap<I>`.
  ///
  /// ```
  /// use fibre_wire::{Cap, Container, Target};
  /// use std::sync::Arc;
  ///
  /// trait Greeter: Send + Sync {
  ///   fn greet(&self) -> String;
  /// }
  ///
  /// struct English;
  /// impl Greeter for English {
  ///   fn greet(&self) -> String {
  ///     "Hello!".to_string()
  ///   }
  /// }
  ///
  /// let container = Container::new();
  /// container
  ///   .register(
  ///     "greeter",
  ///     Target::value(English).expose(|g: Arc<English>| g as Arc<dyn Greeter>),
  ///     &[],
  ///   )
  ///   .unwrap();
  /// container
  ///   .register(
  ///     "banner",
  ///     Target::producer(|Cap(greeter): Cap<dyn Greeter>| greeter.greet()),
  ///     &["greeter"],
  ///   )
  ///   .unwrap();
  ///
  /// assert_eq!(*container.resolve::<String>("banner").unwrap(), "Hello!");
  /// ```
  pub fn expose<T, I>(mut self, cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static) -> Self
  where
    T: Any + Send + Sync,
    I: ?Sized + Any + Send + Sync,
  {
    self.capabilities.push(Capability {
      concrete: std::any::type_name::<T>(),
      attach: Box::new(move |dep: &mut Dependency| dep.expose::<T, I>(&cast)),
    });
    self
  }
}

impl fmt::Debug for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut s = f.debug_struct("Target");
    match &self.kind {
      TargetKind::Value(dep) => s.field("value", dep),
      TargetKind::Producer(p) => s.field("producer", &p.signature()),
    };
    s.field("capabilities", &self.capabilities.len()).finish()
  }
}

/// Adapter for closures with one result. Built by [`Target::producer`].
pub struct Plain<F, Args> {
  f: F,
  _args: PhantomData<fn() -> Args>,
}

/// Adapter for closures returning `Result`. Built by [`Target::fallible`].
pub struct Fallible<F, Args> {
  f: F,
  _args: PhantomData<fn() -> Args>,
}

fn take<A: Inject>(
  args: &mut std::vec::IntoIter<View<'_>>,
  position: &mut usize,
) -> Result<A, InvokeError> {
  let expected = A::shape();
  let at = *position;
  *position += 1;
  let view = args.next().ok_or(InvokeError::Argument { position: at, expected })?;
  A::from_view(view).ok_or(InvokeError::Argument { position: at, expected })
}

macro_rules! count {
  () => { 0usize };
  ($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

macro_rules! impl_producers {
  ($($arg:ident),*) => {
    #[allow(non_snake_case, unused_mut, unused_variables)]
    impl<F, T, $($arg,)*> Producer for Plain<F, ($($arg,)*)>
    where
      F: FnOnce($($arg),*) -> T,
      T: Any + Send + Sync,
      $($arg: Inject,)*
    {
      fn signature(&self) -> Signature {
        Signature::new(vec![$($arg::shape()),*], vec![SlotKind::Value])
      }

      fn invoke(self: Box<Self>, args: Vec<View<'_>>) -> Result<Vec<Slot>, InvokeError> {
        let total = count!($($arg)*);
        if args.len() != total {
          return Err(InvokeError::Count { expected: total, actual: args.len() });
        }
        let mut args = args.into_iter();
        let mut position = 0;
        $(let $arg = take::<$arg>(&mut args, &mut position)?;)*
        let this = *self;
        let value = (this.f)($($arg),*);
        Ok(vec![Slot::Value(Dependency::new(value))])
      }
    }

    #[allow(non_snake_case, unused_mut, unused_variables)]
    impl<F, T, E, $($arg,)*> Producer for Fallible<F, ($($arg,)*)>
    where
      F: FnOnce($($arg),*) -> Result<T, E>,
      T: Any + Send + Sync,
      E: Into<BoxError>,
      $($arg: Inject,)*
    {
      fn signature(&self) -> Signature {
        Signature::new(vec![$($arg::shape()),*], vec![SlotKind::Value, SlotKind::Error])
      }

      fn invoke(self: Box<Self>, args: Vec<View<'_>>) -> Result<Vec<Slot>, InvokeError> {
        let total = count!($($arg)*);
        if args.len() != total {
          return Err(InvokeError::Count { expected: total, actual: args.len() });
        }
        let mut args = args.into_iter();
        let mut position = 0;
        $(let $arg = take::<$arg>(&mut args, &mut position)?;)*
        let this = *self;
        Ok(match (this.f)($($arg),*) {
          Ok(value) => vec![Slot::Value(Dependency::new(value)), Slot::Error(None)],
          Err(err) => vec![Slot::Absent, Slot::Error(Some(err.into()))],
        })
      }
    }
  };
}

impl_producers!();
impl_producers!(A1);
impl_producers!(A1, A2);
impl_producers!(A1, A2, A3);
impl_producers!(A1, A2, A3, A4);
impl_producers!(A1, A2, A3, A4, A5);
impl_producers!(A1, A2, A3, A4, A5, A6);
impl_producers!(A1, A2, A3, A4, A5, A6, A7);
impl_producers!(A1, A2, A3, A4, A5, A6, A7, A8);
