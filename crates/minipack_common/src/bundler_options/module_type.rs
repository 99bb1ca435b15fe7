use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
  Js,
  Jsx,
  Ts,
  Tsx,
  Json,
  Text,
  Empty,
  Custom(String),
}

impl ModuleType {
  pub fn from_extension(id: &str) -> Self {
    let ext = id.rsplit_once('.').map_or("", |(_, ext)| ext);
    match ext {
      "jsx" => Self::Jsx,
      "ts" | "mts" | "cts" => Self::Ts,
      "tsx" => Self::Tsx,
      "json" => Self::Json,
      "txt" => Self::Text,
      _ => Self::Js,
    }
  }

  /// The module type asserted by an import attribute, e.g. `with { type: "json" }`.
  pub fn from_import_attribute(value: &str) -> Self {
    match value {
      "js" | "javascript" => Self::Js,
      "json" => Self::Json,
      "text" => Self::Text,
      other => Self::Custom(other.to_string()),
    }
  }
}

impl Display for ModuleType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Js => write!(f, "js"),
      Self::Jsx => write!(f, "jsx"),
      Self::Ts => write!(f, "ts"),
      Self::Tsx => write!(f, "tsx"),
      Self::Json => write!(f, "json"),
      Self::Text => write!(f, "text"),
      Self::Empty => write!(f, "empty"),
      Self::Custom(ty) => write!(f, "{ty}"),
    }
  }
}

#[test]
fn test_from_extension() {
  assert_eq!(ModuleType::from_extension("/src/a.mts"), ModuleType::Ts);
  assert_eq!(ModuleType::from_extension("/src/data.json"), ModuleType::Json);
  assert_eq!(ModuleType::from_extension("/src/no_ext"), ModuleType::Js);
  assert_eq!(ModuleType::from_import_attribute("css"), ModuleType::Custom("css".to_string()));
}
