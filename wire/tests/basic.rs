use fibre_wire::{Container, Ref, RegistryError, Target, Val};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// --- Test Fixtures ---

#[derive(Debug, Clone, PartialEq, Eq)]
struct SimpleService {
  id: u32,
  label: String,
}

#[derive(Debug)]
struct Boom;

impl std::fmt::Display for Boom {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("boom")
  }
}

impl std::error::Error for Boom {}

// --- Basic Tests ---

#[test]
fn test_value_then_producer_end_to_end() {
  let container = Container::new();

  container
    .register("cfg", Target::value(String::from("hello")), &[])
    .unwrap();
  container
    .register(
      "greeter",
      Target::producer(|Val(cfg): Val<String>| cfg + "!"),
      &["cfg"],
    )
    .unwrap();

  assert_eq!(*container.resolve::<String>("greeter").unwrap(), "hello!");
  // The input is untouched.
  assert_eq!(*container.resolve::<String>("cfg").unwrap(), "hello");
}

#[test]
fn test_failing_producer_end_to_end() {
  let container = Container::new();

  let err = container
    .register("bad", Target::fallible(|| Err::<i32, _>(Boom)), &[])
    .unwrap_err();

  assert!(err.to_string().contains("boom"));
  assert!(matches!(err, RegistryError::ProducerFailed(_)));
  assert!(err.producer_error().unwrap().downcast_ref::<Boom>().is_some());
  assert!(matches!(
    container.fetch("bad"),
    Err(RegistryError::NotFound(name)) if name == "bad"
  ));
}

#[test]
fn test_fallible_producer_success_is_stored() {
  let container = Container::new();

  container
    .register(
      "service",
      Target::fallible(|| {
        Ok::<_, Boom>(SimpleService {
          id: 7,
          label: "seven".into(),
        })
      }),
      &[],
    )
    .unwrap();

  let service = container.resolve::<SimpleService>("service").unwrap();
  assert_eq!(service.id, 7);
}

#[test]
fn test_duplicate_name_is_rejected_and_keeps_first_value() {
  let container = Container::new();

  container.register_value("name", String::from("first")).unwrap();
  let err = container
    .register_value("name", String::from("second"))
    .unwrap_err();

  assert!(matches!(err, RegistryError::DuplicateName(ref n) if n == "name"));
  assert_eq!(*container.resolve::<String>("name").unwrap(), "first");
  assert_eq!(container.len(), 1);
}

#[test]
fn test_duplicate_name_does_not_invoke_producer() {
  static CALLS: AtomicUsize = AtomicUsize::new(0);
  let container = Container::new();
  container.register_value("taken", 1_u8).unwrap();

  let err = container
    .register(
      "taken",
      Target::producer(|| {
        CALLS.fetch_add(1, Ordering::SeqCst);
        2_u8
      }),
      &[],
    )
    .unwrap_err();

  assert!(matches!(err, RegistryError::DuplicateName(_)));
  assert_eq!(CALLS.load(Ordering::SeqCst), 0);
  assert_eq!(*container.resolve::<u8>("taken").unwrap(), 1);
}

#[test]
fn test_arity_mismatch_never_invokes_producer() {
  let counter = Arc::new(AtomicUsize::new(0));
  let container = Container::new();
  container.register_value("a", 1_i32).unwrap();
  container.register_value("b", 2_i32).unwrap();
  container.register_value("c", 3_i32).unwrap();

  for deps in [&["a"][..], &["a", "b", "c"][..]] {
    let calls = Arc::clone(&counter);
    let err = container
      .register(
        "sum",
        Target::producer(move |Val(a): Val<i32>, Val(b): Val<i32>| {
          calls.fetch_add(1, Ordering::SeqCst);
          a + b
        }),
        deps,
      )
      .unwrap_err();

    match err {
      RegistryError::ArityMismatch {
        name,
        expected,
        actual,
      } => {
        assert_eq!(name, "sum");
        assert_eq!(expected, 2);
        assert_eq!(actual, deps.len());
      }
      other => panic!("expected ArityMismatch, got {other:?}"),
    }
  }

  assert_eq!(counter.load(Ordering::SeqCst), 0);
  assert!(container.fetch("sum").unwrap_err().is_not_found());
}

#[test]
fn test_arity_is_checked_before_names_resolve() {
  let container = Container::new();

  let err = container
    .register(
      "needs_one",
      Target::producer(|Val(x): Val<i32>| x),
      &["missing", "also_missing"],
    )
    .unwrap_err();

  assert!(matches!(err, RegistryError::ArityMismatch { .. }));
}

#[test]
fn test_unknown_dependency_aborts_before_invocation() {
  static CALLS: AtomicUsize = AtomicUsize::new(0);
  let container = Container::new();
  container.register_value("present", 1_i32).unwrap();

  let err = container
    .register(
      "pair",
      Target::producer(|Val(a): Val<i32>, Val(b): Val<i32>| {
        CALLS.fetch_add(1, Ordering::SeqCst);
        (a, b)
      }),
      &["present", "absent"],
    )
    .unwrap_err();

  match err {
    RegistryError::UnknownDependency { name, dependency } => {
      assert_eq!(name, "pair");
      assert_eq!(dependency, "absent");
    }
    other => panic!("expected UnknownDependency, got {other:?}"),
  }
  assert_eq!(CALLS.load(Ordering::SeqCst), 0);
  assert!(!container.contains("pair"));
}

#[test]
fn test_non_callable_with_deps_is_rejected() {
  let container = Container::new();
  container.register_value("base", 1_i32).unwrap();

  let err = container
    .register("constant", Target::value(5_i32), &["base"])
    .unwrap_err();

  assert!(matches!(err, RegistryError::NotCallable { deps: 1, .. }));
  assert!(!container.contains("constant"));
}

#[test]
fn test_fetch_is_a_pure_lookup() {
  static CALLS: AtomicUsize = AtomicUsize::new(0);
  let container = Container::new();

  container
    .register(
      "counted",
      Target::producer(|| CALLS.fetch_add(1, Ordering::SeqCst) + 100),
      &[],
    )
    .unwrap();
  assert_eq!(CALLS.load(Ordering::SeqCst), 1);

  for _ in 0..3 {
    assert_eq!(*container.resolve::<usize>("counted").unwrap(), 100);
  }
  assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

#[test]
fn test_reference_parameter_receives_stored_value() {
  let container = Container::new();
  let original = SimpleService {
    id: 42,
    label: "answer".into(),
  };
  container.register_value("service", original.clone()).unwrap();

  container
    .register(
      "copy",
      Target::producer(|Ref(service): Ref<SimpleService>| SimpleService {
        id: service.id,
        label: service.label.clone(),
      }),
      &["service"],
    )
    .unwrap();

  assert_eq!(*container.resolve::<SimpleService>("copy").unwrap(), original);
}

#[test]
fn test_reference_parameter_shares_the_stored_allocation() {
  let container = Container::new();
  container
    .register_value("service", SimpleService {
      id: 1,
      label: "one".into(),
    })
    .unwrap();

  container
    .register(
      "holder",
      Target::producer(|Ref(service): Ref<SimpleService>| service),
      &["service"],
    )
    .unwrap();

  let stored = container.resolve::<SimpleService>("service").unwrap();
  let held = container.resolve::<Arc<SimpleService>>("holder").unwrap();
  assert!(Arc::ptr_eq(&stored, &*held));
}

#[test]
fn test_value_parameter_receives_shared_registration() {
  let container = Container::new();
  let shared = Arc::new(SimpleService {
    id: 9,
    label: "nine".into(),
  });
  container
    .register("service", Target::shared(Arc::clone(&shared)), &[])
    .unwrap();

  container
    .register(
      "label",
      Target::producer(|Val(service): Val<SimpleService>| service.label),
      &["service"],
    )
    .unwrap();

  assert_eq!(*container.resolve::<String>("label").unwrap(), "nine");
  // Registering an Arc keeps the caller's allocation.
  assert!(Arc::ptr_eq(
    &shared,
    &container.resolve::<SimpleService>("service").unwrap()
  ));
}

#[test]
fn test_pointer_result_is_consumed_by_value_and_by_reference() {
  let container = Container::new();
  let original = Arc::new(SimpleService {
    id: 1,
    label: "one".into(),
  });
  let produced = Arc::clone(&original);

  container
    .register("svc", Target::producer(move || produced), &[])
    .unwrap();
  container
    .register(
      "by_val",
      Target::producer(|Val(service): Val<SimpleService>| service),
      &["svc"],
    )
    .unwrap();
  container
    .register(
      "by_ref",
      Target::producer(|Ref(service): Ref<SimpleService>| service),
      &["svc"],
    )
    .unwrap();

  assert_eq!(*container.resolve::<SimpleService>("by_val").unwrap(), *original);
  let shared = container.resolve::<Arc<SimpleService>>("by_ref").unwrap();
  assert!(Arc::ptr_eq(&original, &*shared));
  assert!(Arc::ptr_eq(
    &original,
    &container.resolve::<SimpleService>("svc").unwrap()
  ));
}

#[test]
fn test_wrong_parameter_type_is_caught_before_invocation() {
  static CALLS: AtomicUsize = AtomicUsize::new(0);
  let container = Container::new();
  container.register_value("number", 5_i64).unwrap();

  let err = container
    .register(
      "text",
      Target::producer(|Val(s): Val<String>| {
        CALLS.fetch_add(1, Ordering::SeqCst);
        s
      }),
      &["number"],
    )
    .unwrap_err();

  assert!(matches!(
    err,
    RegistryError::IncompatibleDependency { ref dependency, .. } if dependency == "number"
  ));
  assert_eq!(CALLS.load(Ordering::SeqCst), 0);
  assert!(!container.contains("text"));
}

#[test]
fn test_resolve_with_wrong_type_reports_both_types() {
  let container = Container::new();
  container.register_value("port", 8080_u16).unwrap();

  match container.resolve::<String>("port").unwrap_err() {
    RegistryError::TypeMismatch {
      name,
      expected,
      found,
    } => {
      assert_eq!(name, "port");
      assert_eq!(expected, std::any::type_name::<String>());
      assert_eq!(found, "u16");
    }
    other => panic!("expected TypeMismatch, got {other:?}"),
  }
}

#[test]
fn test_names_are_case_sensitive() {
  let container = Container::new();
  container.register_value("Config", 1_u8).unwrap();
  container.register_value("config", 2_u8).unwrap();

  assert_eq!(container.names(), vec!["Config".to_string(), "config".to_string()]);
  assert_eq!(*container.resolve::<u8>("config").unwrap(), 2);
}
