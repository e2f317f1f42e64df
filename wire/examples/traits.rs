use fibre_wire::{Cap, Container, Target, Val};
use std::sync::Arc;

// --- Abstraction and Implementations ---
trait MessageSender: Send + Sync {
  fn send(&self, to: &str, message: &str) -> String;
}

struct EmailSender;
impl MessageSender for EmailSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending email to {}: '{}'", to, message)
  }
}

struct SmsSender;
impl MessageSender for SmsSender {
  fn send(&self, to: &str, message: &str) -> String {
    format!("Sending SMS to {}: '{}'", to, message)
  }
}

// A service that only knows about the abstraction.
struct Notifier {
  primary: Arc<dyn MessageSender>,
  fallback: Arc<dyn MessageSender>,
  recipient: String,
}

impl Notifier {
  fn notify(&self, message: &str) -> [String; 2] {
    [
      self.primary.send(&self.recipient, message),
      self.fallback.send(&self.recipient, message),
    ]
  }
}

fn main() {
  let container = Container::new();

  // --- Registration ---
  // Both implementations are exposed through the same capability.
  container
    .register(
      "email",
      Target::value(EmailSender).expose(|s: Arc<EmailSender>| s as Arc<dyn MessageSender>),
      &[],
    )
    .unwrap();
  container
    .register(
      "sms",
      Target::value(SmsSender).expose(|s: Arc<SmsSender>| s as Arc<dyn MessageSender>),
      &[],
    )
    .unwrap();
  container
    .register_value("recipient", String::from("ops@example.com"))
    .unwrap();

  // The dependency list picks which implementation goes where.
  container
    .register(
      "notifier",
      Target::producer(
        |Cap(primary): Cap<dyn MessageSender>,
         Cap(fallback): Cap<dyn MessageSender>,
         Val(recipient): Val<String>| Notifier {
          primary,
          fallback,
          recipient,
        },
      ),
      &["email", "sms", "recipient"],
    )
    .unwrap();

  // --- Resolution ---
  let notifier = container.resolve::<Notifier>("notifier").unwrap();
  let [first, second] = notifier.notify("Hello from Fibre!");

  println!("{}", first);
  println!("{}", second);

  assert!(first.contains("email"));
  assert!(second.contains("SMS"));
}
