use fibre_wire::{Container, Field, Record, Ref, Target, Val};
use std::sync::Arc;

struct Database {
  url: String,
}

#[derive(Default)]
struct Handler {
  banner: String,
  db: Option<Arc<Database>>,
  requests: u64,
}

impl Record for Handler {
  fn fields(&mut self) -> Vec<Field<'_>> {
    vec![
      Field::new("banner", r#"di:"banner""#).value(&mut self.banner),
      Field::new("db", r#"di:"db""#).shared(&mut self.db),
      // No `di` tag: left alone.
      Field::new("requests", r#"json:"requests""#).value(&mut self.requests),
    ]
  }
}

fn main() {
  let container = Container::new();

  container
    .register_value("url", String::from("postgres://localhost/app"))
    .unwrap();
  container
    .register(
      "db",
      Target::producer(|Val(url): Val<String>| Database { url }),
      &["url"],
    )
    .unwrap();
  container
    .register(
      "banner",
      Target::producer(|Ref(db): Ref<Database>| format!("connected to {}", db.url)),
      &["db"],
    )
    .unwrap();

  let mut handler = Handler::default();
  container.populate(&mut handler).unwrap();

  println!("{}", handler.banner);
  println!("requests served: {}", handler.requests);

  let db = handler.db.expect("db is injected");
  assert!(Arc::ptr_eq(&db, &container.resolve::<Database>("db").unwrap()));
  assert_eq!(handler.banner, "connected to postgres://localhost/app");
}
