use serde::{Deserialize, Serialize};

/// Whether evaluating a module can be observed by others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideEffects {
  True,
  False,
  /// Not analyzed yet, treated as having side effects.
  #[default]
  Unknown,
}

impl SideEffects {
  pub fn has_side_effects(self) -> bool {
    !matches!(self, Self::False)
  }
}

impl From<bool> for SideEffects {
  fn from(value: bool) -> Self {
    if value { Self::True } else { Self::False }
  }
}
