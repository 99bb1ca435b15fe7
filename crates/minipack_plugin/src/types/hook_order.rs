use serde::Deserialize;

use crate::HookFilter;

/// Tier of a registration. Every `Pre` registration of a hook kind runs before every `Normal`
/// one, which runs before every `Post` one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookOrder {
  Pre,
  #[default]
  Normal,
  Post,
}

#[derive(Debug, Clone, Default)]
pub struct HookOptions {
  pub order: HookOrder,
  pub filter: Option<HookFilter>,
}

impl HookOptions {
  pub fn new(order: HookOrder) -> Self {
    Self { order, filter: None }
  }

  #[must_use]
  pub fn with_filter(mut self, filter: HookFilter) -> Self {
    self.filter = Some(filter);
    self
  }
}

impl From<HookOrder> for HookOptions {
  fn from(order: HookOrder) -> Self {
    Self::new(order)
  }
}

impl From<HookFilter> for HookOptions {
  fn from(filter: HookFilter) -> Self {
    Self::default().with_filter(filter)
  }
}
