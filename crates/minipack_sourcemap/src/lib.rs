mod collapse;
mod lines_count;
mod remap;
mod source;
mod source_joiner;

pub use crate::{
  collapse::collapse_sourcemaps,
  lines_count::lines_count,
  remap::remap_edited,
  source::{Source, SourceMapSource},
  source_joiner::SourceJoiner,
};
pub use oxc_sourcemap::{ConcatSourceMapBuilder, JSONSourceMap, SourceMap, SourceMapBuilder};

/// A map sending every line of `content` back to the same line of `source_id`.
pub fn line_sourcemap(source_id: &str, content: &str) -> SourceMap {
  let mut builder = SourceMapBuilder::default();
  let source = builder.set_source_and_content(source_id, content);
  for line in 0..=lines_count(content) {
    builder.add_token(line, 0, line, 0, Some(source), None);
  }
  builder.into_sourcemap()
}

#[test]
fn test_line_sourcemap() {
  let map = line_sourcemap("/src/a.js", "a\nb\nc");
  assert_eq!(map.get_tokens().count(), 3);
  assert!(map.to_json_string().contains("/src/a.js"));
}
