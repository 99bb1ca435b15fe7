use std::{path::Path, sync::Arc};

use arcstr::ArcStr;
use futures::future::try_join_all;
use minipack_common::{ChunkIdx, FilenameTemplate, ModuleIdx, Output, OutputAsset, OutputChunk};
use minipack_error::BuildResult;
use minipack_utils::{concat_string, option_ext::OptionExt, xxhash::content_hash};
use oxc_index::IndexVec;
use rustc_hash::FxHashMap;

use super::GenerateStage;
use crate::{
  chunk_graph::ChunkGraph,
  types::{
    IndexInstantiatedChunks,
    instantiated_chunk::{FinalizedChunk, InstantiatedChunk},
  },
  utils::chunk::{
    finalize_chunks::finalize_assets, generate_rendered_chunk::generate_rendered_chunk,
  },
};

impl GenerateStage<'_> {
  pub(super) async fn render_chunk_to_assets(
    &self,
    chunk_graph: &ChunkGraph,
    emitted_chunk_modules: &[(ArcStr, ModuleIdx)],
  ) -> BuildResult<Vec<Output>> {
    let instantiated_chunks = self.instantiate_chunks(chunk_graph).await?;
    self.generation.ensure_fresh()?;
    let finalized_chunks = finalize_assets(instantiated_chunks);

    let filenames = finalized_chunks
      .iter()
      .map(|chunk| (chunk.origin_chunk, chunk.filename.clone()))
      .collect::<FxHashMap<ChunkIdx, ArcStr>>();

    let file_emitter = self.plugin_driver.file_emitter();
    for (reference_id, module_idx) in emitted_chunk_modules {
      if let Some(filename) =
        chunk_graph.entry_chunk_of(*module_idx).and_then(|chunk_idx| filenames.get(&chunk_idx))
      {
        file_emitter.set_file_name(reference_id.clone(), filename.clone());
      }
    }

    let mut output = Vec::with_capacity(finalized_chunks.len());
    let mut assets = vec![];
    for FinalizedChunk {
      origin_chunk,
      filename,
      mut content,
      map,
      preliminary_filename,
      rendered_chunk,
    } in finalized_chunks
    {
      let chunk = &chunk_graph.chunk_table[origin_chunk];
      let sourcemap_filename = map.as_ref().map(|_| concat_string!(filename, ".map"));
      if let (Some(map), Some(sourcemap_filename)) = (&map, &sourcemap_filename) {
        let basename = Path::new(sourcemap_filename.as_str())
          .file_name()
          .map_or_else(|| sourcemap_filename.clone(), |name| name.to_string_lossy().into_owned());
        content.push_str("\n//# sourceMappingURL=");
        content.push_str(&basename);
        assets.push(OutputAsset {
          filename: sourcemap_filename.as_str().into(),
          source: map.to_json_string().into(),
          names: vec![],
        });
      }

      let imports = |chunks: &[ChunkIdx]| {
        chunks.iter().filter_map(|idx| filenames.get(idx).cloned()).collect::<Vec<_>>()
      };
      output.push(Output::Chunk(Box::new(OutputChunk {
        name: rendered_chunk.name.clone(),
        filename,
        code: content,
        map,
        sourcemap_filename,
        is_entry: rendered_chunk.is_entry,
        is_dynamic_entry: rendered_chunk.is_dynamic_entry,
        facade_module_id: rendered_chunk.facade_module_id.clone(),
        module_ids: rendered_chunk.module_ids.clone(),
        imports: imports(&chunk.cross_chunk_imports),
        dynamic_imports: imports(&chunk.cross_chunk_dynamic_imports),
        preliminary_filename: preliminary_filename.to_string(),
      })));
    }

    assets.extend(self.emitted_assets());
    assets.sort_unstable_by(|a, b| a.filename.cmp(&b.filename));
    output.extend(assets.into_iter().map(|asset| Output::Asset(Box::new(asset))));

    Ok(output)
  }

  /// Renders every chunk, then pipes it through the `render_chunk` hooks. Chunks are rendered
  /// concurrently, the hooks of one chunk run one after another.
  async fn instantiate_chunks(
    &self,
    chunk_graph: &ChunkGraph,
  ) -> BuildResult<IndexInstantiatedChunks> {
    let tasks = chunk_graph.chunk_table.iter_enumerated().map(|(chunk_idx, chunk)| async move {
      let (content, map) = self.render_chunk(chunk_graph, chunk_idx);
      let rendered_chunk =
        Arc::new(generate_rendered_chunk(chunk, chunk_graph, self.module_graph));
      let content = self
        .plugin_driver
        .render_chunk(self.generation, content.into(), &rendered_chunk)
        .await?;

      anyhow::Ok(InstantiatedChunk {
        origin_chunk: chunk_idx,
        content: content.to_string(),
        map,
        preliminary_filename: chunk.preliminary_filename.clone().unpack(),
        rendered_chunk,
      })
    });

    Ok(try_join_all(tasks).await?.into_iter().collect::<IndexVec<_, _>>())
  }

  /// Plugin assets named with their fixed file name or the asset file name template.
  fn emitted_assets(&self) -> Vec<OutputAsset> {
    let file_emitter = self.plugin_driver.file_emitter();
    let template = FilenameTemplate::new(self.options.asset_filenames.clone());

    file_emitter
      .emitted_assets()
      .into_iter()
      .map(|(reference_id, asset)| {
        let filename: ArcStr = match &asset.file_name {
          Some(file_name) => file_name.as_str().into(),
          None => {
            let name = Path::new(asset.name.as_deref().unwrap_or("asset"));
            let stem = name.file_stem().map(|stem| stem.to_string_lossy());
            let extname = name
              .extension()
              .map(|ext| concat_string!(".", ext.to_string_lossy()))
              .unwrap_or_default();
            let source = asset.source.as_bytes();
            template
              .render(
                stem.as_deref(),
                Some(&extname),
                Some(|len: Option<usize>| content_hash(source, len.unwrap_or(8))),
              )
              .into()
          }
        };
        file_emitter.set_file_name(reference_id, filename.clone());
        OutputAsset { filename, source: asset.source, names: asset.name.into_iter().collect() }
      })
      .collect()
  }
}
