//! Public macros for ergonomic resolution from a container.

/// Resolves a dependency from a container, panicking if it is missing or has
/// another type.
///
/// For a non-panicking version, use [`maybe_resolve!`] or
/// `Container::resolve` directly.
///
/// # Panics
///
/// If the name is not registered, or the stored value is not the requested
/// type or does not expose the requested capability.
///
/// # Examples
///
/// ```
/// use fibre_wire::{resolve, Container};
///
/// let container = Container::new();
/// container.register_value("message", String::from("hello")).unwrap();
///
/// let message = resolve!(&container, String, "message");
/// assert_eq!(*message, "hello");
/// ```
///
/// ```
/// use fibre_wire::{resolve, Container, Target};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync { fn greet(&self) -> String; }
/// struct EnglishGreeter;
/// impl Greeter for EnglishGreeter { fn greet(&self) -> String { "Hello!".to_string() } }
///
/// let container = Container::new();
/// container
///   .register(
///     "greeter",
///     Target::value(EnglishGreeter).expose(|g: Arc<EnglishGreeter>| g as Arc<dyn Greeter>),
///     &[],
///   )
///   .unwrap();
///
/// let greeter = resolve!(&container, trait Greeter, "greeter");
/// assert_eq!(greeter.greet(), "Hello!");
/// ```
#[macro_export]
macro_rules! resolve {
    // Arm for a capability view: resolve!(container, trait MyTrait, "name")
    ($container:expr, trait $trait_ident:ident, $name:expr) => {
        $crate::Container::resolve_capability::<dyn $trait_ident>($container, $name)
            .unwrap_or_else(|err| {
                panic!(
                    "Failed to resolve required capability {} from '{}': {}",
                    std::any::type_name::<dyn $trait_ident>(),
                    $name,
                    err
                )
            })
    };

    // Arm for a concrete type: resolve!(container, MyService, "name")
    ($container:expr, $type:ty, $name:expr) => {
        $crate::Container::resolve::<$type>($container, $name).unwrap_or_else(|err| {
            panic!(
                "Failed to resolve required dependency {}: {}",
                std::any::type_name::<$type>(),
                err
            )
        })
    };
}

/// Resolves a dependency from a container, returning `None` if it is missing
/// or has another type.
///
/// # Examples
///
/// ```
/// use fibre_wire::{maybe_resolve, Container};
///
/// let container = Container::new();
/// container.register_value("port", 8080_u16).unwrap();
///
/// assert_eq!(maybe_resolve!(&container, u16, "port").as_deref(), Some(&8080));
/// assert!(maybe_resolve!(&container, u16, "missing").is_none());
/// assert!(maybe_resolve!(&container, String, "port").is_none());
/// ```
#[macro_export]
macro_rules! maybe_resolve {
    ($container:expr, trait $trait_ident:ident, $name:expr) => {
        $crate::Container::resolve_capability::<dyn $trait_ident>($container, $name).ok()
    };

    ($container:expr, $type:ty, $name:expr) => {
        $crate::Container::resolve::<$type>($container, $name).ok()
    };
}
