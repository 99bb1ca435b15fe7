use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;

static MODULE_PATH_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?:\w+::)").expect("static regex is valid"));

/// `std::any::type_name` without the module paths, e.g. `Option<String>`.
pub fn pretty_type_name<T: ?Sized>() -> Cow<'static, str> {
  MODULE_PATH_RE.replace_all(std::any::type_name::<T>(), "")
}

/// Unwrapping helpers for values whose presence is an internal invariant of the bundler.
pub trait OptionExt<T> {
  fn unpack(self) -> T;

  fn unpack_ref(&self) -> &T;

  fn unpack_ref_mut(&mut self) -> &mut T;
}

impl<T> OptionExt<T> for Option<T> {
  /// Like `unwrap`, but the panic message names the expected type.
  fn unpack(self) -> T {
    match self {
      Some(v) => v,
      None => {
        panic!("Got `None` value when calling `OptionExt::unpack()` on `{}`", pretty_type_name::<T>())
      }
    }
  }

  fn unpack_ref(&self) -> &T {
    self.as_ref().unpack()
  }

  fn unpack_ref_mut(&mut self) -> &mut T {
    self.as_mut().unpack()
  }
}

#[test]
fn test_pretty_type_name() {
  struct Chunk;
  assert_eq!(pretty_type_name::<std::option::Option<std::string::String>>(), "Option<String>");
  assert_eq!(pretty_type_name::<Vec<Chunk>>(), "Vec<Chunk>");
}

#[test]
#[should_panic(expected = "on `u32`")]
fn test_unpack_panics_with_type_name() {
  None::<u32>.unpack();
}
