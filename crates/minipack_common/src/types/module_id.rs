use std::path::Path;

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};
use sugar_path::SugarPath;

/// `ModuleId` is the unique string identifier for each module.
/// - It will be used to identify the module in the whole bundle.
/// - Plugins may keep a `ModuleId` to track the module across hooks and rebuilds.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(ArcStr);

impl ModuleId {
  pub fn new(value: impl Into<ArcStr>) -> Self {
    Self(value.into())
  }

  pub fn inner(&self) -> &ArcStr {
    &self.0
  }

  /// The id relative to `cwd` with forward slashes, so it is the same on every machine.
  pub fn stabilize(&self, cwd: &Path) -> String {
    if self.starts_with("data:") {
      return format!("<{}>", self.0);
    }
    if self.as_path().is_absolute() {
      self.relative(cwd).as_path().to_slash_lossy().into_owned()
    } else {
      self.to_string()
    }
  }
}

impl std::ops::Deref for ModuleId {
  type Target = str;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl AsRef<str> for ModuleId {
  fn as_ref(&self) -> &str {
    self
  }
}

impl std::fmt::Display for ModuleId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<ArcStr> for ModuleId {
  fn from(value: ArcStr) -> Self {
    Self::new(value)
  }
}

impl From<&str> for ModuleId {
  fn from(value: &str) -> Self {
    Self::new(value)
  }
}

#[test]
fn test_stabilize() {
  let cwd = Path::new("/project");
  assert_eq!(ModuleId::from("/project/src/main.js").stabilize(cwd), "src/main.js");
  assert_eq!(ModuleId::from("/lib/x.js").stabilize(cwd), "../lib/x.js");
  assert_eq!(ModuleId::from("react").stabilize(cwd), "react");
}
