use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StrOrBytes {
  Str(String),
  Bytes(Vec<u8>),
}

impl Default for StrOrBytes {
  fn default() -> Self {
    Self::Str(String::new())
  }
}

impl StrOrBytes {
  pub fn as_bytes(&self) -> &[u8] {
    match self {
      Self::Str(s) => s.as_bytes(),
      Self::Bytes(b) => b,
    }
  }

  pub fn try_into_string(self) -> anyhow::Result<String> {
    match self {
      Self::Str(s) => Ok(s),
      Self::Bytes(b) => Ok(String::from_utf8(b)?),
    }
  }
}

impl From<String> for StrOrBytes {
  fn from(s: String) -> Self {
    Self::Str(s)
  }
}

impl From<&str> for StrOrBytes {
  fn from(s: &str) -> Self {
    Self::Str(s.to_string())
  }
}

impl From<Vec<u8>> for StrOrBytes {
  fn from(b: Vec<u8>) -> Self {
    Self::Bytes(b)
  }
}
