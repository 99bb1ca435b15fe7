use minipack_common::{Chunk, ChunkIdx, RenderedChunk};
use minipack_utils::option_ext::OptionExt;

use crate::{chunk_graph::ChunkGraph, module_graph::ModuleGraph};

/// Metadata handed to `render_chunk`. File names still carry their hash placeholders.
pub fn generate_rendered_chunk(
  chunk: &Chunk,
  chunk_graph: &ChunkGraph,
  module_graph: &ModuleGraph,
) -> RenderedChunk {
  let filename_of =
    |idx: ChunkIdx| chunk_graph.chunk_table[idx].preliminary_filename.unpack_ref().as_arc_str();

  RenderedChunk {
    name: chunk.name.clone().unpack(),
    filename: chunk.preliminary_filename.unpack_ref().as_arc_str().clone(),
    is_entry: chunk.is_entry(),
    is_dynamic_entry: chunk.is_dynamic_entry(),
    facade_module_id: chunk.entry_module_idx().map(|idx| module_graph[idx].id().clone()),
    module_ids: chunk.modules.iter().map(|idx| module_graph[*idx].id().clone()).collect(),
    imports: chunk.cross_chunk_imports.iter().map(|idx| filename_of(*idx).clone()).collect(),
    dynamic_imports: chunk
      .cross_chunk_dynamic_imports
      .iter()
      .map(|idx| filename_of(*idx).clone())
      .collect(),
  }
}
