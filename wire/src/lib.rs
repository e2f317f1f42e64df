//! # Fibre Wire
//!
//! A small, thread-safe dependency registry for wiring an application together
//! at startup.
//!
//! Values and producers are registered under names. A producer is a closure
//! (or any [`Producer`]) whose parameters are filled from previously
//! registered names; it runs once, at registration time, and its result is
//! stored under the new name. Stored values are later fetched by name or
//! injected into the tagged fields of a [`Record`].
//!
//! ## Core Concepts
//!
//! - **Container**: The registry. Names are unique; registration is atomic.
//! - **Target**: What gets registered: a value, or a producer with its
//!   dependency names.
//! - **Shapes**: Each producer parameter declares how it wants its dependency:
//!   [`Val<T>`] (a clone), [`Ref<T>`] (a shared `Arc<T>`), or [`Cap<I>`] (a
//!   trait-object view exposed with [`Target::expose`]).
//! - **Records**: Structs implementing [`Record`] can be populated field by
//!   field from `di:"name"` tags.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_wire::{Container, Target, Val};
//!
//! let container = Container::new();
//!
//! container.register("cfg", Target::value(String::from("hello")), &[]).unwrap();
//! container
//!   .register(
//!     "greeter",
//!     Target::producer(|Val(cfg): Val<String>| cfg + "!"),
//!     &["cfg"],
//!   )
//!   .unwrap();
//!
//! let greeting = container.resolve::<String>("greeter").unwrap();
//! assert_eq!(*greeting, "hello!");
//! ```
//!
//! Producers that can fail return a `Result`; the error aborts the
//! registration and is handed back unchanged.
//!
//! ```
//! use fibre_wire::{Container, Target};
//!
//! let container = Container::new();
//! let err = container
//!   .register("bad", Target::fallible(|| Err::<i32, _>("boom")), &[])
//!   .unwrap_err();
//!
//! assert_eq!(err.to_string(), "boom");
//! assert!(container.fetch("bad").unwrap_err().is_not_found());
//! ```

mod container;
mod core;
mod error;
mod inject;
mod macros;
mod populate;
mod producer;

pub use crate::container::Container;
pub use crate::core::{Dependency, Shape, ShapeKind, View};
pub use crate::error::{BoxError, RegistryError, Result};
pub use crate::inject::{Cap, Inject, Ref, Val};
pub use crate::populate::{Field, Record, Tag, TAG_KEY};
pub use crate::producer::{Fallible, InvokeError, Plain, Producer, Signature, Slot, SlotKind, Target};
