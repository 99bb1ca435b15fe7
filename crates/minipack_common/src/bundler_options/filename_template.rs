use minipack_utils::concat_string;

/// A file name pattern such as `[name]-[hash:10].js`.
///
/// Supported placeholders: `[name]`, `[hash]`, `[hash:N]`, `[ext]` (without the dot) and
/// `[extname]` (with the dot).
#[derive(Debug, Clone)]
pub struct FilenameTemplate {
  template: String,
}

impl FilenameTemplate {
  pub fn new(template: String) -> Self {
    Self { template }
  }

  pub fn template(&self) -> &str {
    &self.template
  }

  pub fn has_hash_pattern(&self) -> bool {
    self.template.contains("[hash]") || self.template.contains("[hash:")
  }

  /// Renders the template. `hash_replacer` is called once per hash pattern with the requested
  /// length, if any.
  pub fn render(
    &self,
    name: Option<&str>,
    extname: Option<&str>,
    mut hash_replacer: Option<impl FnMut(Option<usize>) -> String>,
  ) -> String {
    let mut rendered = String::with_capacity(self.template.len());
    let mut rest = self.template.as_str();

    while let Some(start) = rest.find('[') {
      rendered.push_str(&rest[..start]);
      let Some(end) = rest[start..].find(']').map(|end| start + end) else {
        rest = &rest[start..];
        break;
      };
      let pattern = &rest[start + 1..end];
      let replacement = match pattern {
        "name" => name.map(ToString::to_string),
        "ext" => extname.map(|ext| ext.trim_start_matches('.').to_string()),
        "extname" => extname.map(|ext| {
          if ext.is_empty() || ext.starts_with('.') {
            ext.to_string()
          } else {
            concat_string!(".", ext)
          }
        }),
        "hash" => hash_replacer.as_mut().map(|replacer| replacer(None)),
        _ => pattern
          .strip_prefix("hash:")
          .and_then(|len| len.parse::<usize>().ok())
          .and_then(|len| hash_replacer.as_mut().map(|replacer| replacer(Some(len)))),
      };
      match replacement {
        Some(replacement) => rendered.push_str(&replacement),
        None => rendered.push_str(&rest[start..=end]),
      }
      rest = &rest[end + 1..];
    }
    rendered.push_str(rest);
    rendered
  }
}

#[test]
fn test_render() {
  let template = FilenameTemplate::new("[name]-[hash:6].js".to_string());
  assert!(template.has_hash_pattern());
  let hash = |len: Option<usize>| "x".repeat(len.unwrap_or(8));
  let rendered = template.render(Some("main"), None, Some(hash));
  assert_eq!(rendered, "main-xxxxxx.js");

  let template = FilenameTemplate::new("assets/[name][extname]".to_string());
  assert!(!template.has_hash_pattern());
  let rendered = template.render(Some("logo"), Some("svg"), None::<fn(Option<usize>) -> String>);
  assert_eq!(rendered, "assets/logo.svg");

  let template = FilenameTemplate::new("[name].[ext]?[unknown]".to_string());
  let rendered = template.render(Some("a"), Some(".txt"), None::<fn(Option<usize>) -> String>);
  assert_eq!(rendered, "a.txt?[unknown]");
}
