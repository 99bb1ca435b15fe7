use base_encode::to_string;
use xxhash_rust::xxh3::xxh3_128;

use crate::base64::to_url_safe_base64;

const CHARACTERS_BASE64: &[u8] =
  b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
const CHARACTERS_BASE36: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const CHARACTERS_BASE16: &[u8] = b"0123456789abcdef";

pub fn xxhash_base64_url(input: &[u8]) -> String {
  to_url_safe_base64(xxh3_128(input).to_le_bytes())
}

/// Hash `input` and encode the 128-bit digest in base 64, 36 or 16. Bases 36 and 16 only use
/// lowercase letters and digits. Other bases fall back to the nearest of the three. Inputs of
/// exactly 16 bytes are treated as a digest already.
pub fn xxhash_with_base(input: &[u8], base: u8) -> String {
  let digest = if input.len() == 16 { input } else { &xxh3_128(input).to_le_bytes() };
  let (base, characters) = match base {
    ..=16 => (16, CHARACTERS_BASE16),
    17..=36 => (36, CHARACTERS_BASE36),
    _ => (64, CHARACTERS_BASE64),
  };
  // Every digit is below `base`, which is the length of `characters`.
  to_string(digest, base, characters).unwrap_or_default()
}

/// Content hash used in output file names: base36 so it is safe on case-insensitive file systems.
pub fn content_hash(input: &[u8], len: usize) -> String {
  let mut hash = xxhash_with_base(input, 36);
  hash.truncate(len);
  hash
}

#[test]
fn test_xxhash_with_base() {
  assert_eq!(&xxhash_with_base(b"hello", 64), "YOFJeqs95x38-Gwetwem1");
  assert_eq!(&xxhash_with_base(b"hello", 36), "bpwli5k6mqm0gij09mxrh9npj");
  assert_eq!(&xxhash_with_base(b"hello", 16), "1838525eaacf79c77f3e1b07adc1e9b5");
}

#[test]
fn test_xxhash_alphabets() {
  let is_lower_alnum = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
  for input in [&b"hello"[..], b"", b"export default 1;\n"] {
    assert!(xxhash_with_base(input, 36).chars().all(is_lower_alnum));
    let is_lower_hex = |c: char| c.is_ascii_digit() || ('a'..='f').contains(&c);
    assert!(xxhash_with_base(input, 16).chars().all(is_lower_hex));
  }
  assert_eq!(xxhash_with_base(b"hello", 10), xxhash_with_base(b"hello", 16));
}

#[test]
fn test_content_hash() {
  assert_eq!(content_hash(b"hello", 8), "bpwli5k6");
  assert_eq!(content_hash(b"hello", 8), content_hash(b"hello", 8));
  assert_ne!(content_hash(b"hello", 8), content_hash(b"hello!", 8));
}
