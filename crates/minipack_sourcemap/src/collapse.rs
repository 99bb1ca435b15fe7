use oxc_sourcemap::{SourceMap, SourceMapBuilder};

/// Collapses a chain of maps into one map from the last generated code to `source_content`.
///
/// Each map in `chain` describes the output of the map before it, the first one describing
/// `source_content` itself. Mappings that cannot be traced all the way back are dropped.
pub fn collapse_sourcemaps(
  chain: &[&SourceMap],
  source_id: &str,
  source_content: &str,
) -> Option<SourceMap> {
  let (last, earlier) = chain.split_last()?;
  let tables = earlier.iter().map(|map| map.generate_lookup_table()).collect::<Vec<_>>();

  let mut builder = SourceMapBuilder::default();
  let source = builder.set_source_and_content(source_id, source_content);
  'tokens: for token in last.get_tokens() {
    if token.get_source_id().is_none() {
      continue;
    }
    let (mut line, mut col) = (token.get_src_line(), token.get_src_col());
    let mut name = token.get_name_id().and_then(|id| last.get_name(id));
    for (map, table) in earlier.iter().zip(&tables).rev() {
      let Some(traced) = map.lookup_token(table, line, col) else { continue 'tokens };
      if traced.get_source_id().is_none() {
        continue 'tokens;
      }
      (line, col) = (traced.get_src_line(), traced.get_src_col());
      name = traced.get_name_id().and_then(|id| map.get_name(id)).or(name);
    }
    let name = name.map(|name| builder.add_name(name));
    builder.add_token(token.get_dst_line(), token.get_dst_col(), line, col, Some(source), name);
  }
  Some(builder.into_sourcemap())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::line_sourcemap;

  #[test]
  fn test_collapse_through_a_banner() {
    let original = "let a = 1;\nconsole.log(a);";
    // A transform put two banner lines on top.
    let mut banner = SourceMapBuilder::default();
    let src = banner.set_source_and_content("a.js", original);
    banner.add_token(2, 0, 0, 0, Some(src), None);
    banner.add_token(3, 0, 1, 0, Some(src), None);
    let banner = banner.into_sourcemap();
    let transformed = "// one\n// two\nlet a = 1;\nconsole.log(a);";
    let lines = line_sourcemap("a.js", transformed);

    let map = collapse_sourcemaps(&[&banner, &lines], "/src/a.js", original).unwrap();
    let tokens = map
      .get_tokens()
      .map(|token| (token.get_dst_line(), token.get_src_line()))
      .collect::<Vec<_>>();
    // The banner lines have nothing to point at.
    assert_eq!(tokens, vec![(2, 0), (3, 1)]);
    assert_eq!(map.get_source(0), Some("/src/a.js"));
    assert_eq!(map.get_source_content(0), Some(original));
  }

  #[test]
  fn test_collapse_keeps_names() {
    let mut renamed = SourceMapBuilder::default();
    let src = renamed.set_source_and_content("a.js", "let value;");
    let name = renamed.add_name("value");
    renamed.add_token(0, 4, 0, 4, Some(src), Some(name));
    let renamed = renamed.into_sourcemap();

    let mut outer = SourceMapBuilder::default();
    let src = outer.set_source_and_content("a.js", "let v;");
    outer.add_token(0, 2, 0, 4, Some(src), None);
    let outer = outer.into_sourcemap();

    let map = collapse_sourcemaps(&[&renamed, &outer], "a.js", "let value;").unwrap();
    let token = map.get_tokens().next().unwrap();
    assert_eq!((token.get_dst_col(), token.get_src_col()), (2, 4));
    assert_eq!(token.get_name_id().and_then(|id| map.get_name(id)), Some("value"));
  }

  #[test]
  fn test_collapse_nothing() {
    assert!(collapse_sourcemaps(&[], "a.js", "").is_none());
  }
}
