use minipack_utils::pattern_filter::FilterPattern;
use serde::Deserialize;

/// Forces every module whose id matches `test` into the chunk called `name`.
#[derive(Debug, Clone, Deserialize)]
pub struct ManualChunkGroup {
  pub name: String,
  pub test: FilterPattern,
}

impl ManualChunkGroup {
  pub fn new(name: impl Into<String>, test: FilterPattern) -> Self {
    Self { name: name.into(), test }
  }
}

/// Size and count thresholds applied to common chunks. There are no built-in defaults: a missing
/// threshold disables the corresponding split or merge.
///
/// Sizes are measured in bytes of transformed module code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AdvancedChunksOptions {
  pub min_size: Option<usize>,
  pub max_size: Option<usize>,
  pub min_module_count: Option<usize>,
  pub max_module_count: Option<usize>,
}

impl AdvancedChunksOptions {
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }

  pub fn exceeds_max(&self, size: usize, module_count: usize) -> bool {
    self.max_size.is_some_and(|max| size > max)
      || self.max_module_count.is_some_and(|max| module_count > max)
  }

  pub fn below_min(&self, size: usize, module_count: usize) -> bool {
    self.min_size.is_some_and(|min| size < min)
      || self.min_module_count.is_some_and(|min| module_count < min)
  }
}

#[test]
fn test_thresholds() {
  let options =
    AdvancedChunksOptions { max_module_count: Some(2), min_size: Some(10), ..Default::default() };
  assert!(options.exceeds_max(0, 3));
  assert!(!options.exceeds_max(1000, 2));
  assert!(options.below_min(9, 100));
  assert!(!AdvancedChunksOptions::default().below_min(0, 0));
}
