use minipack_utils::pattern_filter::{FilterPattern, FilterResult, filter};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringFilter {
  #[serde(default)]
  pub include: Vec<FilterPattern>,
  #[serde(default)]
  pub exclude: Vec<FilterPattern>,
}

impl StringFilter {
  pub fn include(patterns: impl IntoIterator<Item = FilterPattern>) -> Self {
    Self { include: patterns.into_iter().collect(), exclude: vec![] }
  }

  #[must_use]
  pub fn with_exclude(mut self, patterns: impl IntoIterator<Item = FilterPattern>) -> Self {
    self.exclude.extend(patterns);
    self
  }

  fn matches_id(&self, id: &str) -> bool {
    filter(&self.include, &self.exclude, id) == FilterResult::Include
  }

  // Code patterns test for a substring rather than a whole-string glob.
  fn matches_code(&self, code: &str) -> bool {
    let contains = |pattern: &FilterPattern| match pattern {
      FilterPattern::Glob(needle) => code.contains(needle.as_str()),
      FilterPattern::Regex(re) => re.is_match(code),
    };
    if self.exclude.iter().any(contains) {
      return false;
    }
    self.include.is_empty() || self.include.iter().any(contains)
  }
}

/// Narrows a registration to the modules it cares about. Evaluated before the callback is invoked,
/// so a skipped registration costs nothing even when it lives behind the bridge.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookFilter {
  pub id: Option<StringFilter>,
  pub code: Option<StringFilter>,
}

impl HookFilter {
  pub fn id(filter: StringFilter) -> Self {
    Self { id: Some(filter), code: None }
  }

  pub fn code(filter: StringFilter) -> Self {
    Self { id: None, code: Some(filter) }
  }

  /// Values the hook does not receive are not filtered on.
  pub fn is_match(&self, id: Option<&str>, code: Option<&str>) -> bool {
    let id_matches = match (&self.id, id) {
      (Some(filter), Some(id)) => filter.matches_id(id),
      _ => true,
    };
    let code_matches = match (&self.code, code) {
      (Some(filter), Some(code)) => filter.matches_code(code),
      _ => true,
    };
    id_matches && code_matches
  }
}

#[test]
fn test_hook_filter() {
  let filter = HookFilter {
    id: Some(
      StringFilter::include([FilterPattern::glob("**/*.ts")])
        .with_exclude([FilterPattern::glob("**/node_modules/**")]),
    ),
    code: Some(StringFilter::include([FilterPattern::glob("import.meta")])),
  };

  assert!(filter.is_match(Some("/src/a.ts"), Some("console.log(import.meta.url)")));
  assert!(!filter.is_match(Some("/src/a.ts"), Some("console.log(1)")));
  assert!(!filter.is_match(Some("/src/a.js"), None));
  assert!(!filter.is_match(Some("/node_modules/x/a.ts"), None));
  assert!(filter.is_match(None, Some("import.meta")));

  let parsed: HookFilter =
    serde_json::from_str(r#"{ "id": { "include": [{ "regex": "\\.vue$" }] } }"#).unwrap();
  assert!(parsed.is_match(Some("/src/App.vue"), None));
  assert!(!parsed.is_match(Some("/src/App.js"), None));
}
