use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
  Node,
  #[default]
  Browser,
  Neutral,
}

impl Platform {
  /// Export conditions tried when resolving bare specifiers.
  pub fn condition_names(self) -> Vec<String> {
    let conditions: &[&str] = match self {
      Self::Node => &["import", "node", "default"],
      Self::Browser => &["import", "browser", "default"],
      Self::Neutral => &["import", "default"],
    };
    conditions.iter().map(ToString::to_string).collect()
  }

  pub fn main_fields(self) -> Vec<String> {
    let fields: &[&str] = match self {
      Self::Node => &["module", "main"],
      Self::Browser => &["browser", "module", "main"],
      Self::Neutral => &[],
    };
    fields.iter().map(ToString::to_string).collect()
  }
}
