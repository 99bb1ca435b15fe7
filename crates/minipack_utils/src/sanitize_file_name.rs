/// Replace every character that is not safe in an output file name with `_`.
pub fn sanitize_file_name(name: &str) -> String {
  name
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
    .collect()
}

#[test]
fn test_sanitize_file_name() {
  assert_eq!(sanitize_file_name("\0+a=Z_0-"), "__a_Z_0-");
  assert_eq!(sanitize_file_name("vendor.react"), "vendor.react");
  assert_eq!(sanitize_file_name("@scope/pkg"), "_scope_pkg");
}
