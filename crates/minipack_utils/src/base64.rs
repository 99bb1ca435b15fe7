pub fn to_url_safe_base64(input: impl AsRef<[u8]>) -> String {
  base64_simd::URL_SAFE_NO_PAD.encode_to_string(input)
}

#[test]
fn test_to_url_safe_base64() {
  assert_eq!(to_url_safe_base64(b"hello"), "aGVsbG8");
  assert_eq!(to_url_safe_base64([0xfb, 0xff]), "-_8");
}
