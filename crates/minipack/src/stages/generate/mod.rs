mod generate_chunk_name_and_preliminary_filenames;
mod render_chunk;
mod render_chunk_to_assets;

use arcstr::ArcStr;
use minipack_common::{BuildGeneration, ModuleIdx, Output, SharedOptions};
use minipack_error::BuildResult;
use minipack_plugin::SharedPluginDriver;

use crate::{chunk_graph::ChunkGraph, module_graph::ModuleGraph};

/// Names, renders and hashes the chunks of a build.
pub struct GenerateStage<'a> {
  module_graph: &'a ModuleGraph,
  options: &'a SharedOptions,
  plugin_driver: &'a SharedPluginDriver,
  generation: &'a BuildGeneration,
}

impl<'a> GenerateStage<'a> {
  pub fn new(
    module_graph: &'a ModuleGraph,
    options: &'a SharedOptions,
    plugin_driver: &'a SharedPluginDriver,
    generation: &'a BuildGeneration,
  ) -> Self {
    Self { module_graph, options, plugin_driver, generation }
  }

  /// Chunks in chunk order, then assets ordered by file name.
  #[tracing::instrument(level = "debug", skip_all)]
  pub async fn generate(
    &self,
    chunk_graph: &mut ChunkGraph,
    emitted_chunk_modules: &[(ArcStr, ModuleIdx)],
  ) -> BuildResult<Vec<Output>> {
    self.generate_chunk_name_and_preliminary_filenames(chunk_graph);
    self.render_chunk_to_assets(chunk_graph, emitted_chunk_modules).await
  }
}
