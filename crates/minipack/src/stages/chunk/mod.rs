mod advanced_chunks;
mod code_splitting;
mod cross_chunk_links;
mod sort_modules;

use minipack_common::{Chunk, EntryPoint, ModuleIdx, SharedOptions};
use minipack_error::BuildResult;

use crate::{
  chunk_graph::ChunkGraph, module_graph::ModuleGraph,
  utils::chunk::validate_options_for_multi_chunk_output::validate_options_for_multi_chunk_output,
};

pub struct ChunkStageOutput {
  pub chunk_graph: ChunkGraph,
  /// Normal modules in execution order.
  pub sorted_modules: Vec<ModuleIdx>,
  pub warnings: Vec<anyhow::Error>,
}

/// Partitions a complete module graph into chunks.
pub struct ChunkStage<'a> {
  module_graph: &'a mut ModuleGraph,
  entry_points: &'a [EntryPoint],
  options: &'a SharedOptions,
  sorted_modules: Vec<ModuleIdx>,
  warnings: Vec<anyhow::Error>,
}

impl<'a> ChunkStage<'a> {
  pub fn new(
    module_graph: &'a mut ModuleGraph,
    entry_points: &'a [EntryPoint],
    options: &'a SharedOptions,
  ) -> Self {
    Self { module_graph, entry_points, options, sorted_modules: vec![], warnings: vec![] }
  }

  #[tracing::instrument(level = "debug", skip_all)]
  pub fn build(mut self) -> BuildResult<ChunkStageOutput> {
    self.sort_modules();

    let chunks = self.split_chunks();
    let mut chunk_graph = self.create_chunk_graph(chunks);
    if chunk_graph.chunk_table.len() > 1 {
      validate_options_for_multi_chunk_output(self.options)?;
    }
    self.compute_cross_chunk_links(&mut chunk_graph);

    tracing::debug!(
      "{} modules in {} chunks",
      self.sorted_modules.len(),
      chunk_graph.chunk_table.len()
    );

    Ok(ChunkStageOutput {
      chunk_graph,
      sorted_modules: self.sorted_modules,
      warnings: self.warnings,
    })
  }

  fn create_chunk_graph(&self, chunks: Vec<Chunk>) -> ChunkGraph {
    let mut chunk_graph = ChunkGraph::new(self.module_graph.len());

    for mut chunk in chunks {
      let modules = std::mem::take(&mut chunk.modules);
      let entry_module = chunk.entry_module_idx();
      // Empty facades execute where their entry module does.
      chunk.exec_order = modules
        .first()
        .copied()
        .or(entry_module)
        .map_or(u32::MAX, |idx| self.module_graph[idx].exec_order());

      let chunk_idx = chunk_graph.add_chunk(chunk);
      if let Some(entry_module) = entry_module {
        // Two entries of the same module share the first chunk as dynamic import target.
        chunk_graph.entry_module_to_entry_chunk.entry(entry_module).or_insert(chunk_idx);
      }
      for module_idx in modules {
        chunk_graph.add_module_to_chunk(module_idx, chunk_idx);
      }
    }

    chunk_graph
  }
}
