use regex::Regex;
use serde::{Deserialize, Deserializer};

/// A module id matcher: either a glob (`**/node_modules/**`) or a regular expression.
///
/// In JSON configuration a plain string is a glob and `{ "regex": "..." }` is a regular expression.
#[derive(Debug, Clone)]
pub enum FilterPattern {
  Glob(String),
  Regex(Regex),
}

impl FilterPattern {
  pub fn glob(pattern: impl Into<String>) -> Self {
    Self::Glob(pattern.into())
  }

  pub fn regex(source: &str) -> Result<Self, regex::Error> {
    Regex::new(source).map(Self::Regex)
  }

  pub fn matches(&self, value: &str) -> bool {
    match self {
      Self::Glob(glob) => glob == value || fast_glob::glob_match(glob, value),
      Self::Regex(re) => re.is_match(value),
    }
  }
}

impl PartialEq for FilterPattern {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Self::Glob(a), Self::Glob(b)) => a == b,
      (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
      _ => false,
    }
  }
}

impl<'de> Deserialize<'de> for FilterPattern {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
      Glob(String),
      Regex { regex: String },
    }

    match Raw::deserialize(deserializer)? {
      Raw::Glob(glob) => Ok(Self::Glob(glob)),
      Raw::Regex { regex } => Self::regex(&regex).map_err(serde::de::Error::custom),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
  Include,
  Exclude,
}

/// Exclusions win over inclusions. An empty include list includes everything that is not
/// excluded.
pub fn filter(include: &[FilterPattern], exclude: &[FilterPattern], value: &str) -> FilterResult {
  if exclude.iter().any(|pattern| pattern.matches(value)) {
    return FilterResult::Exclude;
  }
  if include.is_empty() || include.iter().any(|pattern| pattern.matches(value)) {
    FilterResult::Include
  } else {
    FilterResult::Exclude
  }
}

#[test]
fn test_filter() {
  let include = vec![FilterPattern::glob("/src/**/*.js")];
  let exclude = vec![FilterPattern::regex(r"\.test\.js$").unwrap()];

  assert_eq!(filter(&include, &exclude, "/src/a/b.js"), FilterResult::Include);
  assert_eq!(filter(&include, &exclude, "/src/a/b.test.js"), FilterResult::Exclude);
  assert_eq!(filter(&include, &exclude, "/lib/b.js"), FilterResult::Exclude);
  assert_eq!(filter(&[], &[], "anything"), FilterResult::Include);
}

#[test]
fn test_filter_pattern_matches_exact_id() {
  assert!(FilterPattern::glob("lodash").matches("lodash"));
  assert!(!FilterPattern::glob("lodash").matches("lodash-es"));
}
