use std::sync::Arc;

use memchr::memchr_iter;
use oxc_sourcemap::{SourceMap, Token};

/// Moves the generated positions of `map` from `before` to `after`, where `after` is `before`
/// with `edits` applied.
///
/// Edits are `(start, end, replacement_len)` byte ranges of `before`, sorted and disjoint.
/// Mappings inside a replaced range are dropped. Columns count UTF-16 code units.
pub fn remap_edited(
  map: &SourceMap,
  before: &str,
  after: &str,
  edits: &[(usize, usize, usize)],
) -> SourceMap {
  let (before_lines, after_lines) = (line_starts(before), line_starts(after));
  let tokens = map
    .get_tokens()
    .filter_map(|token| {
      let offset = to_offset(before, &before_lines, token.get_dst_line(), token.get_dst_col())?;
      let (line, col) = to_position(after, &after_lines, shift(offset, edits)?)?;
      Some(Token::new(
        line,
        col,
        token.get_src_line(),
        token.get_src_col(),
        token.get_source_id(),
        token.get_name_id(),
      ))
    })
    .collect();

  SourceMap::new(
    map.get_file().map(Arc::from),
    map.get_names().map(Arc::from).collect(),
    map.get_source_root().map(String::from),
    map.get_sources().map(Arc::from).collect(),
    map.get_source_contents().map(|contents| contents.map(Arc::from).collect()),
    tokens,
    None,
  )
}

fn line_starts(text: &str) -> Vec<usize> {
  std::iter::once(0).chain(memchr_iter(b'\n', text.as_bytes()).map(|idx| idx + 1)).collect()
}

fn to_offset(text: &str, line_starts: &[usize], line: u32, col: u32) -> Option<usize> {
  let line = usize::try_from(line).ok()?;
  let start = *line_starts.get(line)?;
  let end = line_starts.get(line + 1).map_or(text.len(), |next| next - 1);
  let mut units = 0;
  for (offset, ch) in text.get(start..end)?.char_indices() {
    if units >= col {
      return Some(start + offset);
    }
    units += if ch.len_utf16() == 2 { 2 } else { 1 };
  }
  Some(end)
}

fn to_position(text: &str, line_starts: &[usize], offset: usize) -> Option<(u32, u32)> {
  let line = line_starts.partition_point(|start| *start <= offset).checked_sub(1)?;
  let col = text.get(line_starts[line]..offset)?.encode_utf16().count();
  Some((u32::try_from(line).ok()?, u32::try_from(col).ok()?))
}

/// Where `offset` of the edited text ends up, `None` when an edit replaced it.
fn shift(offset: usize, edits: &[(usize, usize, usize)]) -> Option<usize> {
  let (mut added, mut removed) = (0, 0);
  for &(start, end, replacement_len) in edits {
    if start >= offset {
      break;
    }
    if end > offset {
      return None;
    }
    added += replacement_len;
    removed += end - start;
  }
  Some(offset + added - removed)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::SourceMapBuilder;

  fn map_of(content: &str, positions: &[(u32, u32)]) -> SourceMap {
    let mut builder = SourceMapBuilder::default();
    let src = builder.set_source_and_content("a.js", content);
    for &(line, col) in positions {
      builder.add_token(line, col, line, col, Some(src), None);
    }
    builder.into_sourcemap()
  }

  fn generated(map: &SourceMap) -> Vec<(u32, u32)> {
    map.get_tokens().map(|token| (token.get_dst_line(), token.get_dst_col())).collect()
  }

  #[test]
  fn test_columns_follow_a_longer_specifier() {
    let before = "import('./b');\nfoo();";
    let after = "import(\"./chunks/b-1234.js\");\nfoo();";
    let edits = [(7, 12, "\"./chunks/b-1234.js\"".len())];
    let map = map_of(before, &[(0, 0), (0, 7), (0, 9), (0, 12), (1, 0)]);

    let remapped = remap_edited(&map, before, after, &edits);
    // The token inside the old specifier went with it.
    assert_eq!(generated(&remapped), vec![(0, 0), (0, 7), (0, 27), (1, 0)]);
    let token = remapped.get_tokens().nth(2).unwrap();
    assert_eq!((token.get_src_line(), token.get_src_col()), (0, 12));
    assert_eq!(remapped.get_source_content(0), Some(before));
  }

  #[test]
  fn test_blanked_statement_keeps_lines() {
    let before = "import './a';\nlet x = 1; import './b'; x;";
    let after = "\nlet x = 1;  x;";
    let edits = [(0, 13, 0), (25, 38, 0)];
    let map = map_of(before, &[(0, 0), (1, 0), (1, 4), (1, 26)]);

    let remapped = remap_edited(&map, before, after, &edits);
    assert_eq!(generated(&remapped), vec![(0, 0), (1, 0), (1, 4), (1, 13)]);
  }

  #[test]
  fn test_columns_count_utf16_units() {
    let before = "let s = '😀'; import('./b');";
    let after = "let s = '😀'; import(\"./b.js\");";
    let start = before.find("'./b'").unwrap();
    let edits = [(start, start + 5, 8)];
    // The emoji takes two UTF-16 units, so `)` sits at column 26.
    let map = map_of(before, &[(0, 26)]);

    let remapped = remap_edited(&map, before, after, &edits);
    assert_eq!(generated(&remapped), vec![(0, 29)]);
  }
}
