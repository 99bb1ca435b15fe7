use minipack_common::{ChunkIdx, NormalModule};
use minipack_sourcemap::{
  SourceJoiner, SourceMap, SourceMapSource, line_sourcemap, remap_edited,
};
use minipack_utils::{
  concat_string,
  option_ext::OptionExt,
  path_ext::relative_import_specifier,
  rayon::{IntoParallelRefIterator, ParallelIterator},
};

use super::GenerateStage;
use crate::chunk_graph::ChunkGraph;

struct RenderedModule<'a> {
  stable_id: &'a str,
  code: String,
  map: Option<SourceMap>,
}

impl GenerateStage<'_> {
  fn preliminary_filename_of(chunk_graph: &ChunkGraph, chunk_idx: ChunkIdx) -> &str {
    chunk_graph.chunk_table[chunk_idx].preliminary_filename.as_deref().unpack()
  }

  /// Concatenates the modules of a chunk in execution order. Cross-chunk dependencies become
  /// side-effect imports in front of the first module.
  pub(super) fn render_chunk(
    &self,
    chunk_graph: &ChunkGraph,
    chunk_idx: ChunkIdx,
  ) -> (String, Option<SourceMap>) {
    let chunk = &chunk_graph.chunk_table[chunk_idx];
    let filename = Self::preliminary_filename_of(chunk_graph, chunk_idx);

    let rendered_modules = chunk
      .modules
      .par_iter()
      .filter_map(|idx| self.module_graph[*idx].as_normal())
      .map(|module| self.render_module(module, chunk_graph, chunk_idx, filename))
      .collect::<Vec<_>>();

    let mut source_joiner = SourceJoiner::new(self.options.sourcemap);
    for importee in &chunk.cross_chunk_imports {
      let importee_filename = Self::preliminary_filename_of(chunk_graph, *importee);
      source_joiner.append_source(concat_string!(
        "import \"",
        relative_import_specifier(filename, importee_filename),
        "\";"
      ));
    }

    for RenderedModule { stable_id, code, map } in rendered_modules {
      source_joiner.append_source(concat_string!("//#region ", stable_id));
      match map {
        Some(map) => source_joiner.append_source(SourceMapSource::new(code, map)),
        None => source_joiner.append_source(code),
      }
      source_joiner.append_source("//#endregion");
    }

    source_joiner.join()
  }

  /// Import statements of modules in the same chunk are blanked, newlines kept so the module map
  /// still lines up. Specifiers of modules in other chunks point at those chunks instead.
  fn render_module<'m>(
    &self,
    module: &'m NormalModule,
    chunk_graph: &ChunkGraph,
    chunk_idx: ChunkIdx,
    filename: &str,
  ) -> RenderedModule<'m> {
    // (start, end, replacement)
    let mut edits: Vec<(usize, usize, String)> = vec![];
    for rec in &module.import_records {
      let Some(importee) = rec.resolved_module() else { continue };
      let importee_chunk = if rec.kind.is_static() {
        chunk_graph.module_to_chunk[importee]
      } else {
        chunk_graph.entry_chunk_of(importee)
      };
      // Externals are left as they are.
      let Some(importee_chunk) = importee_chunk else { continue };

      if rec.kind.is_static() && importee_chunk == chunk_idx {
        let (start, end) = (rec.statement_span.start as usize, rec.statement_span.end as usize);
        let newlines = module.code[start..end].chars().filter(|c| *c == '\n').collect();
        edits.push((start, end, newlines));
      } else {
        let importee_filename = Self::preliminary_filename_of(chunk_graph, importee_chunk);
        let specifier = relative_import_specifier(filename, importee_filename);
        let (start, end) = (rec.specifier_span.start as usize, rec.specifier_span.end as usize);
        edits.push((start, end, concat_string!("\"", specifier, "\"")));
      }
    }
    edits.sort_by_key(|(start, _, _)| *start);

    let source = module.code.as_str();
    let mut code = String::with_capacity(source.len());
    // (start, end, replacement length) of the edits applied
    let mut applied = Vec::with_capacity(edits.len());
    let mut last_end = 0;
    for (start, end, replacement) in edits {
      // Edits never overlap; a nested one would be inside a blanked statement.
      if start < last_end {
        continue;
      }
      code.push_str(&source[last_end..start]);
      code.push_str(&replacement);
      applied.push((start, end, replacement.len()));
      last_end = end;
    }
    code.push_str(&source[last_end..]);

    let map = self.options.sourcemap.then(|| match &module.sourcemap {
      Some(map) if applied.is_empty() => Some(SourceMap::clone(map)),
      Some(map) => Some(remap_edited(map, source, &code, &applied)),
      None if module.is_virtual() => None,
      None => Some(line_sourcemap(&module.stable_id, &module.source)),
    });

    RenderedModule { stable_id: &module.stable_id, code, map: map.flatten() }
  }
}
