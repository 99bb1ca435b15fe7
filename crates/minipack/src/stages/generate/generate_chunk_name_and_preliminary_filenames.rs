use std::{collections::hash_map::Entry, path::Path};

use arcstr::ArcStr;
use minipack_common::{ChunkIdx, ChunkKind};
use minipack_utils::{
  concat_string, hash_placeholder::HashPlaceholderGenerator,
  sanitize_file_name::sanitize_file_name,
};
use oxc_index::IndexVec;
use rustc_hash::FxHashMap;

use super::GenerateStage;
use crate::chunk_graph::ChunkGraph;

impl GenerateStage<'_> {
  /// File names must not depend on the machine or the order tasks finished in: names come from
  /// stable module data and are deconflicted in chunk order.
  pub(super) fn generate_chunk_name_and_preliminary_filenames(
    &self,
    chunk_graph: &mut ChunkGraph,
  ) {
    let index_pre_generated_names: IndexVec<ChunkIdx, ArcStr> = chunk_graph
      .chunk_table
      .iter()
      .map(|chunk| {
        if let Some(name) = &chunk.name {
          return name.clone();
        }
        match &chunk.kind {
          ChunkKind::EntryPoint { module, is_user_defined } => {
            let module = &self.module_graph[*module];
            if *is_user_defined {
              Path::new(module.id().inner().as_str())
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map_or(arcstr::literal!("input"), |stem| sanitize_file_name(stem).into())
            } else {
              let repr_name =
                module.as_normal().map_or("chunk", |module| module.repr_name.as_str());
              sanitize_file_name(repr_name).into()
            }
          }
          ChunkKind::Manual { group } => sanitize_file_name(group).into(),
          // The last executed module names a common chunk.
          ChunkKind::Common => chunk
            .modules
            .last()
            .and_then(|idx| self.module_graph[*idx].as_normal())
            .map_or(arcstr::literal!("chunk"), |module| {
              sanitize_file_name(&module.repr_name).into()
            }),
        }
      })
      .collect::<Vec<_>>()
      .into();

    let mut hash_placeholder_generator = HashPlaceholderGenerator::default();
    let mut used_name_counts: FxHashMap<ArcStr, u32> = FxHashMap::default();
    let mut make_unique_name = |name: &ArcStr| {
      let mut candidate = name.clone();
      loop {
        match used_name_counts.entry(candidate.clone()) {
          Entry::Occupied(mut occ) => {
            let next_count = *occ.get();
            occ.insert(next_count + 1);
            candidate =
              ArcStr::from(concat_string!(name, itoa::Buffer::new().format(next_count)).as_str());
          }
          Entry::Vacant(vac) => {
            let name = vac.key().clone();
            vac.insert(2);
            break name;
          }
        }
      }
    };

    for chunk_idx in &chunk_graph.sorted_chunk_idx_vec {
      let chunk = &mut chunk_graph.chunk_table[*chunk_idx];
      let name = &index_pre_generated_names[*chunk_idx];
      // Chunk names may repeat, only file names are deconflicted.
      chunk.name = Some(name.clone());
      let preliminary_filename = chunk.generate_preliminary_filename(
        self.options,
        name,
        &mut hash_placeholder_generator,
        &mut make_unique_name,
      );
      tracing::trace!("chunk {name} is written to {}", &*preliminary_filename);
      chunk.preliminary_filename = Some(preliminary_filename);
    }
  }
}
