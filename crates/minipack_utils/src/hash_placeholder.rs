use std::{borrow::Cow, sync::LazyLock};

use regex::{Captures, Regex};
use rustc_hash::FxHashMap;

use crate::indexmap::FxIndexSet;

const HASH_PLACEHOLDER_LEFT: &str = "!~{";
const HASH_PLACEHOLDER_RIGHT: &str = "}~";
const HASH_PLACEHOLDER_OVERHEAD: usize = HASH_PLACEHOLDER_LEFT.len() + HASH_PLACEHOLDER_RIGHT.len();
const CHARACTERS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub const MIN_HASH_SIZE: usize = HASH_PLACEHOLDER_OVERHEAD + 1;
pub const MAX_HASH_SIZE: usize = 22;

static HASH_PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"!~\{[0-9a-z]{1,17}\}~").expect("static regex is valid")
});

/// Hands out unique placeholders of a fixed length. A placeholder stands in for a content hash
/// in a file name until every chunk has been rendered.
#[derive(Debug, Default)]
pub struct HashPlaceholderGenerator {
  next_index: usize,
}

impl HashPlaceholderGenerator {
  pub fn generate(&mut self, hash_len: usize) -> String {
    let hash_len = hash_len.clamp(MIN_HASH_SIZE, MAX_HASH_SIZE);
    let mut digits = to_base36(self.next_index);
    self.next_index += 1;
    let width = hash_len - HASH_PLACEHOLDER_OVERHEAD;
    if digits.len() < width {
      digits = "0".repeat(width - digits.len()) + &digits;
    }
    format!("{HASH_PLACEHOLDER_LEFT}{digits}{HASH_PLACEHOLDER_RIGHT}")
  }
}

fn to_base36(mut value: usize) -> String {
  let mut buf = Vec::new();
  loop {
    buf.push(CHARACTERS[value % 36]);
    value /= 36;
    if value == 0 {
      break;
    }
  }
  buf.reverse();
  String::from_utf8(buf).unwrap_or_default()
}

/// Placeholders referenced by `source`, in order of first appearance.
pub fn extract_hash_placeholders(source: &str) -> FxIndexSet<String> {
  HASH_PLACEHOLDER_RE.find_iter(source).map(|m| m.as_str().to_string()).collect()
}

pub fn replace_placeholder_with_hash<'a>(
  source: &'a str,
  final_hashes: &FxHashMap<String, String>,
) -> Cow<'a, str> {
  HASH_PLACEHOLDER_RE.replace_all(source, |caps: &Captures| {
    let placeholder = &caps[0];
    final_hashes.get(placeholder).cloned().unwrap_or_else(|| placeholder.to_string())
  })
}

#[test]
fn test_hash_placeholder() {
  let mut generator = HashPlaceholderGenerator::default();
  let first = generator.generate(8);
  let second = generator.generate(8);
  assert_eq!(first, "!~{000}~");
  assert_eq!(second, "!~{001}~");
  assert_eq!(first.len(), 8);

  let source = format!("import './main-{second}.js';\nimport './dep-{first}.js';");
  let placeholders = extract_hash_placeholders(&source);
  assert_eq!(placeholders.iter().collect::<Vec<_>>(), vec![&second, &first]);

  let mut hashes = FxHashMap::default();
  hashes.insert(first, "abcdefgh".to_string());
  hashes.insert(second, "12345678".to_string());
  assert_eq!(
    replace_placeholder_with_hash(&source, &hashes),
    "import './main-12345678.js';\nimport './dep-abcdefgh.js';"
  );
}
