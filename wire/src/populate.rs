//! Field injection: assigning registered dependencies to tagged record fields.
//!
//! A record describes its fields through [`Record`]. Each [`Field`] carries a
//! struct tag in the conventional `key:"value"` form; fields whose tag has a
//! value under [`TAG_KEY`] receive the dependency registered under that
//! value.
//!
//! ```
//! use fibre_wire::{Container, Field, Record};
//!
//! #[derive(Default)]
//! struct Handler {
//!   greeting: String,
//!   retries: u32,
//! }
//!
//! impl Record for Handler {
//!   fn fields(&mut self) -> Vec<Field<'_>> {
//!     vec![
//!       Field::new("greeting", r#"di:"greeting""#).value(&mut self.greeting),
//!       Field::new("retries", r#"json:"retries""#).value(&mut self.retries),
//!     ]
//!   }
//! }
//!
//! let container = Container::new();
//! container.register_value("greeting", String::from("hello")).unwrap();
//!
//! let mut handler = Handler::default();
//! container.populate(&mut handler).unwrap();
//! assert_eq!(handler.greeting, "hello");
//! assert_eq!(handler.retries, 0);
//! ```

use crate::container::Container;
use crate::core::{Shape, View};
use crate::error::{RegistryError, Result};
use crate::inject::{Cap, Inject, Ref, Val};
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// The tag key that marks an injectable field.
pub const TAG_KEY: &str = "di";

/// A struct whose fields can be populated from a [`Container`].
pub trait Record {
  /// Describes every field, in declaration order.
  fn fields(&mut self) -> Vec<Field<'_>>;
}

struct Assign<'a> {
  shape: Shape,
  write: Box<dyn FnOnce(View<'_>) -> bool + 'a>,
}

/// One field of a [`Record`].
///
/// A field built with only [`Field::new`] is read-only: if it is tagged,
/// populating fails with [`RegistryError::Unassignable`].
pub struct Field<'a> {
  name: &'a str,
  tag: &'a str,
  assign: Option<Assign<'a>>,
}

impl<'a> Field<'a> {
  pub fn new(name: &'a str, tag: &'a str) -> Self {
    Self {
      name,
      tag,
      assign: None,
    }
  }

  pub fn name(&self) -> &str {
    self.name
  }

  pub fn tag(&self) -> Tag<'a> {
    Tag(self.tag)
  }

  pub fn is_writable(&self) -> bool {
    self.assign.is_some()
  }

  /// Writes a clone of a stored `T` into `target`.
  pub fn value<T: Any + Clone + Send + Sync>(self, target: &'a mut T) -> Self {
    self.with(move |Val(value): Val<T>| *target = value)
  }

  /// Writes a shared handle to a stored `T` into `target`.
  pub fn shared<T: Any + Send + Sync>(self, target: &'a mut Option<Arc<T>>) -> Self {
    self.with(move |Ref(value): Ref<T>| *target = Some(value))
  }

  /// Writes the `I` capability view of the stored value into `target`.
  pub fn capability<I: ?Sized + Any + Send + Sync>(self, target: &'a mut Option<Arc<I>>) -> Self {
    self.with(move |Cap(value): Cap<I>| *target = Some(value))
  }

  /// Makes the field writable through any parameter type.
  pub fn with<A: Inject + 'a>(mut self, write: impl FnOnce(A) + 'a) -> Self {
    self.assign = Some(Assign {
      shape: A::shape(),
      write: Box::new(move |view: View<'_>| match A::from_view(view) {
        Some(value) => {
          write(value);
          true
        }
        None => false,
      }),
    });
    self
  }
}

impl fmt::Debug for Field<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Field")
      .field("name", &self.name)
      .field("tag", &self.tag)
      .field("shape", &self.assign.as_ref().map(|assign| assign.shape))
      .finish()
  }
}

/// A struct tag: space-separated `key:"value"` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a>(pub &'a str);

impl Tag<'_> {
  /// Returns the unquoted value stored under `key`.
  ///
  /// Scanning stops at the first malformed pair. A value with an invalid
  /// escape counts as absent.
  pub fn lookup(&self, key: &str) -> Option<String> {
    let mut rest = self.0;
    loop {
      rest = rest.trim_start_matches(' ');
      if rest.is_empty() {
        return None;
      }

      let name_len = rest
        .find(|c: char| c <= ' ' || c == ':' || c == '"' || c == '\u{7f}')
        .unwrap_or(rest.len());
      if name_len == 0 || !rest[name_len..].starts_with(":\"") {
        return None;
      }
      let name = &rest[..name_len];
      rest = &rest[name_len + 1..];

      let bytes = rest.as_bytes();
      let mut end = 1;
      while end < bytes.len() && bytes[end] != b'"' {
        if bytes[end] == b'\\' {
          end += 1;
        }
        end += 1;
      }
      if end >= bytes.len() {
        return None;
      }
      let quoted = &rest[1..end];
      rest = &rest[end + 1..];

      if name == key {
        return unescape(quoted);
      }
    }
  }
}

/// Resolves the escapes of a double-quoted tag value. Unknown escapes, raw
/// newlines and out-of-range code points are rejected.
fn unescape(quoted: &str) -> Option<String> {
  if quoted.contains('\n') {
    return None;
  }
  if !quoted.contains('\\') {
    return Some(quoted.to_owned());
  }

  let mut out: Vec<u8> = Vec::with_capacity(quoted.len());
  let mut chars = quoted.chars();
  while let Some(c) = chars.next() {
    if c != '\\' {
      let mut buf = [0; 4];
      out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
      continue;
    }
    let simple = match chars.next()? {
      'a' => b'\x07',
      'b' => b'\x08',
      'f' => b'\x0c',
      'n' => b'\n',
      'r' => b'\r',
      't' => b'\t',
      'v' => b'\x0b',
      '\\' => b'\\',
      '"' => b'"',
      'x' => u8::try_from(hex(&mut chars, 2)?).ok()?,
      'u' => {
        push_char(&mut out, hex(&mut chars, 4)?)?;
        continue;
      }
      'U' => {
        push_char(&mut out, hex(&mut chars, 8)?)?;
        continue;
      }
      first @ '0'..='7' => {
        let mut code = first.to_digit(8)?;
        for _ in 0..2 {
          code = code * 8 + chars.next()?.to_digit(8)?;
        }
        u8::try_from(code).ok()?
      }
      _ => return None,
    };
    out.push(simple);
  }
  String::from_utf8(out).ok()
}

fn hex(chars: &mut std::str::Chars<'_>, digits: usize) -> Option<u32> {
  let mut code = 0;
  for _ in 0..digits {
    code = code * 16 + chars.next()?.to_digit(16)?;
  }
  Some(code)
}

fn push_char(out: &mut Vec<u8>, code: u32) -> Option<()> {
  let c = char::from_u32(code)?;
  let mut buf = [0; 4];
  out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
  Some(())
}

impl Container {
  /// Assigns a dependency to every field tagged with [`TAG_KEY`].
  ///
  /// Fields are processed in order and the first failure aborts. Fields
  /// assigned before the failure keep their new values.
  pub fn populate<R: Record + ?Sized>(&self, target: &mut R) -> Result<()> {
    self.populate_with_key(target, TAG_KEY)
  }

  /// Like [`populate`](Self::populate), with a custom tag key.
  pub fn populate_with_key<R: Record + ?Sized>(&self, target: &mut R, key: &str) -> Result<()> {
    let fields = target.fields();

    let mut seen = HashSet::with_capacity(fields.len());
    for field in &fields {
      if field.name.is_empty() {
        return Err(RegistryError::InvalidTarget {
          reason: "record has an unnamed field".to_owned(),
        });
      }
      if !seen.insert(field.name) {
        return Err(RegistryError::InvalidTarget {
          reason: format!("field '{}' is declared twice", field.name),
        });
      }
    }

    let mut assigned = 0;
    for field in fields {
      let dependency_name = match field.tag().lookup(key) {
        Some(name) if !name.is_empty() => name,
        _ => continue,
      };

      let dependency =
        self
          .fetch(&dependency_name)
          .map_err(|_| RegistryError::UnresolvedField {
            field: field.name.to_owned(),
            dependency: dependency_name.clone(),
          })?;

      let Some(assign) = field.assign else {
        return Err(RegistryError::Unassignable(field.name.to_owned()));
      };

      let incompatible = || RegistryError::IncompatibleDependency {
        dependency: dependency_name.clone(),
        expected: assign.shape,
      };
      let view = dependency.view(&assign.shape).ok_or_else(incompatible)?;
      if !(assign.write)(view) {
        return Err(incompatible());
      }

      tracing::trace!(field = field.name, dependency = %dependency_name, "assigned field");
      assigned += 1;
    }

    tracing::debug!(
      record = std::any::type_name::<R>(),
      assigned,
      "populated record"
    );
    Ok(())
  }
}
