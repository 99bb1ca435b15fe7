use std::{borrow::Cow, ffi::OsStr, path::Path};

use sugar_path::SugarPath;

pub trait PathExt {
  fn expect_to_str(&self) -> &str;

  fn expect_to_slash(&self) -> String;

  fn representative_file_name(&self) -> Cow<str>;
}

impl PathExt for Path {
  fn expect_to_str(&self) -> &str {
    self.to_str().unwrap_or_else(|| {
      panic!("Failed to convert {:?} to valid utf8 str", self.display());
    })
  }

  fn expect_to_slash(&self) -> String {
    self
      .to_slash()
      .unwrap_or_else(|| panic!("Failed to convert {:?} to slash str", self.display()))
      .into_owned()
  }

  /// The name a chunk should get when this module is its entry. Directory-style entries such as
  /// `vue/index.js` are named after the directory.
  fn representative_file_name(&self) -> Cow<str> {
    let file_name =
      self.file_stem().map_or_else(|| self.to_string_lossy(), |stem| stem.to_string_lossy());

    match &*file_name {
      "index" | "mod" => self
        .parent()
        .and_then(Self::file_stem)
        .map(OsStr::to_string_lossy)
        .map_or(file_name, |parent_dir_name| parent_dir_name),
      _ => file_name,
    }
  }
}

/// Import specifier pointing from the output file `from` to the output file `to`, both relative to
/// the output directory. Always starts with `./` or `../`.
pub fn relative_import_specifier(from: &str, to: &str) -> String {
  let root = Path::new("/");
  let from_dir = root.join(from);
  let from_dir = from_dir.parent().unwrap_or(root);
  let relative = root.join(to).relative(from_dir);
  let relative = relative.as_path().to_slash_lossy();
  if relative.starts_with("../") { relative.into_owned() } else { format!("./{relative}") }
}

#[test]
fn test_representative_file_name() {
  let cwd = Path::new(".").join("project");
  let path = cwd.join("src").join("vue.js");
  assert_eq!(path.representative_file_name(), "vue");

  let path = cwd.join("vue").join("index.js");
  assert_eq!(path.representative_file_name(), "vue");

  let path = cwd.join("vue").join("mod.ts");
  assert_eq!(path.representative_file_name(), "vue");
}

#[test]
fn test_relative_import_specifier() {
  assert_eq!(relative_import_specifier("main.js", "shared-abc.js"), "./shared-abc.js");
  assert_eq!(relative_import_specifier("entries/a.js", "shared.js"), "../shared.js");
  assert_eq!(relative_import_specifier("a.js", "chunks/b.js"), "./chunks/b.js");
}
