use minipack_common::ChunkIdx;
use minipack_utils::indexmap::FxIndexSet;
use oxc_index::{IndexVec, index_vec};

use super::ChunkStage;
use crate::chunk_graph::ChunkGraph;

type IndexCrossChunkImports = IndexVec<ChunkIdx, FxIndexSet<ChunkIdx>>;

impl ChunkStage<'_> {
  /// A chunk statically imports every chunk holding a static dependency of its modules. An entry
  /// chunk whose entry module lives elsewhere imports that chunk as well. Dynamic imports point at
  /// the entry chunk of their target.
  pub(super) fn compute_cross_chunk_links(&self, chunk_graph: &mut ChunkGraph) {
    let chunk_count = chunk_graph.chunk_table.len();
    let mut cross_chunk_imports: IndexCrossChunkImports =
      index_vec![FxIndexSet::default(); chunk_count];
    let mut cross_chunk_dynamic_imports: IndexCrossChunkImports =
      index_vec![FxIndexSet::default(); chunk_count];

    for (chunk_idx, chunk) in chunk_graph.chunk_table.iter_enumerated() {
      if let Some(owner) =
        chunk.entry_module_idx().and_then(|module| chunk_graph.module_to_chunk[module])
      {
        if owner != chunk_idx {
          cross_chunk_imports[chunk_idx].insert(owner);
        }
      }

      for module_idx in &chunk.modules {
        for rec in self.module_graph[*module_idx].import_records() {
          let Some(importee) = rec.resolved_module() else { continue };
          let (importee_chunk, imports) = if rec.kind.is_static() {
            (chunk_graph.module_to_chunk[importee], &mut cross_chunk_imports)
          } else {
            (chunk_graph.entry_chunk_of(importee), &mut cross_chunk_dynamic_imports)
          };
          // Externals have no chunk.
          if let Some(importee_chunk) = importee_chunk.filter(|idx| *idx != chunk_idx) {
            imports[chunk_idx].insert(importee_chunk);
          }
        }
      }
    }

    for ((chunk, mut imports), mut dynamic_imports) in
      chunk_graph.chunk_table.iter_mut().zip(cross_chunk_imports).zip(cross_chunk_dynamic_imports)
    {
      imports.sort_unstable();
      dynamic_imports.sort_unstable();
      chunk.cross_chunk_imports = imports.into_iter().collect();
      chunk.cross_chunk_dynamic_imports = dynamic_imports.into_iter().collect();
    }
  }
}
