use std::borrow::Cow;

use serde::{Deserialize, Deserializer};

#[derive(Debug, Default, Clone)]
pub struct InputItem {
  pub name: Option<String>,
  pub import: String,
}

impl From<&str> for InputItem {
  fn from(value: &str) -> Self {
    Self { name: None, import: value.to_string() }
  }
}

impl From<Cow<'_, str>> for InputItem {
  fn from(value: Cow<'_, str>) -> Self {
    Self { name: None, import: value.to_string() }
  }
}

impl<'de> Deserialize<'de> for InputItem {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
      Import(String),
      Named { name: Option<String>, import: String },
    }

    Ok(match Raw::deserialize(deserializer)? {
      Raw::Import(import) => Self { name: None, import },
      Raw::Named { name, import } => Self { name, import },
    })
  }
}
