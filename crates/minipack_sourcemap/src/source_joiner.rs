use oxc_sourcemap::{ConcatSourceMapBuilder, SourceMap};

use crate::Source;

/// Joins sources line by line, each on its own line, and stitches their maps together.
#[derive(Default)]
pub struct SourceJoiner<'source> {
  inner: Vec<Box<dyn Source + Send + 'source>>,
  prepend_source: Vec<Box<dyn Source + Send + 'source>>,
  enable_sourcemap: bool,
}

impl<'source> SourceJoiner<'source> {
  pub fn new(enable_sourcemap: bool) -> Self {
    Self { enable_sourcemap, ..Default::default() }
  }

  pub fn append_source<T: Source + Send + 'source>(&mut self, source: T) {
    self.inner.push(Box::new(source));
  }

  pub fn prepend_source(&mut self, source: Box<dyn Source + Send + 'source>) {
    self.prepend_source.push(source);
  }

  pub fn join(&self) -> (String, Option<SourceMap>) {
    let sources = self.prepend_source.iter().chain(self.inner.iter());
    let capacity = sources.clone().map(|source| source.content().len() + 1).sum();
    let mut code = String::with_capacity(capacity);
    let mut concat_map = self.enable_sourcemap.then(ConcatSourceMapBuilder::default);
    let mut line_offset = 0;

    for (idx, source) in sources.enumerate() {
      if idx > 0 {
        code.push('\n');
      }
      code.push_str(source.content());
      if let (Some(concat_map), Some(map)) = (concat_map.as_mut(), source.sourcemap()) {
        concat_map.add_sourcemap(map, line_offset);
      }
      line_offset += source.lines_count() + 1;
    }

    (code, concat_map.map(ConcatSourceMapBuilder::into_sourcemap))
  }
}

#[test]
fn test_source_joiner() {
  use crate::{line_sourcemap, SourceMapSource};

  let mut joiner = SourceJoiner::new(true);
  joiner.append_source("//#region a.js");
  joiner.append_source(SourceMapSource::new("a\nb".to_string(), line_sourcemap("a.js", "a\nb")));
  joiner.append_source("//#endregion");
  joiner.prepend_source(Box::new("import './dep.js';"));

  let (code, map) = joiner.join();
  assert_eq!(code, "import './dep.js';\n//#region a.js\na\nb\n//#endregion");
  let map = map.unwrap();
  let lines = map.get_tokens().map(|token| token.get_dst_line()).collect::<Vec<_>>();
  assert_eq!(lines, vec![2, 3]);
}
