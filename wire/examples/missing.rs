use fibre_wire::{resolve, Container, RegistryError, Target, Val};
use std::panic;

#[derive(Debug)]
struct InvalidPort(String);

impl std::fmt::Display for InvalidPort {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "invalid port: {}", self.0)
  }
}

impl std::error::Error for InvalidPort {}

fn main() {
  let container = Container::new();
  container.register_value("raw_port", String::from("eighty")).unwrap();

  // --- A producer that fails ---
  println!("Registering a producer that rejects its input...");
  let err = container
    .register(
      "port",
      Target::fallible(|Val(raw): Val<String>| {
        raw.parse::<u16>().map_err(|_| InvalidPort(raw))
      }),
      &["raw_port"],
    )
    .unwrap_err();
  println!("Registration failed as expected: {}", err);
  assert!(err.producer_error().unwrap().is::<InvalidPort>());

  // Nothing was stored under the failed name.
  match container.fetch("port") {
    Err(RegistryError::NotFound(name)) => println!("'{}' is not registered.", name),
    other => panic!("unexpected lookup result: {:?}", other),
  }

  // --- Depending on a name that does not exist ---
  let err = container
    .register(
      "listener",
      Target::producer(|Val(port): Val<u16>| format!("0.0.0.0:{}", port)),
      &["port"],
    )
    .unwrap_err();
  println!("Dependent registration failed too: {}", err);

  // --- Using the panicking `resolve!` macro ---
  println!("\nAttempting to resolve with resolve!...");
  let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
    // This line will panic!
    let _port = resolve!(&container, u16, "port");
  }));
  assert!(result.is_err(), "resolve! should have panicked.");
  println!("Successfully caught the expected panic from resolve!.");
}
