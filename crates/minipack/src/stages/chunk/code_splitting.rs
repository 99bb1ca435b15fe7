use arcstr::ArcStr;
use itertools::Itertools;
use minipack_common::{
  Chunk, ChunkKind, EntryPointKind, Module, ModuleIdx, NormalModule, ResolvedImportRecord,
};
use minipack_error::BuildWarning;
use minipack_utils::{
  bitset::BitSet, indexmap::FxIndexMap, sanitize_file_name::sanitize_file_name,
};
use oxc_index::{IndexVec, index_vec};

use super::{
  ChunkStage,
  advanced_chunks::{ModuleWeight, apply_advanced_chunks},
};

impl ChunkStage<'_> {
  /// Sets bit `entry_index` on every module the entry reaches without crossing a dynamic import.
  fn determine_reachable_modules_for_entry(
    &self,
    entry_module: ModuleIdx,
    entry_index: u32,
    module_bits: &mut IndexVec<ModuleIdx, BitSet>,
  ) {
    let mut stack = vec![entry_module];
    while let Some(idx) = stack.pop() {
      let Some(Module::Normal(module)) = self.module_graph.get(idx) else { continue };
      if module_bits[idx].has_bit(entry_index) {
        continue;
      }
      module_bits[idx].set_bit(entry_index);
      stack.extend(
        module
          .import_records
          .iter()
          .filter(|rec| rec.kind.is_static())
          .filter_map(ResolvedImportRecord::resolved_module),
      );
    }
  }

  fn manual_group_of(&self, module: &NormalModule) -> Option<usize> {
    self
      .options
      .manual_chunks
      .iter()
      .position(|group| group.test.matches(&module.id) || group.test.matches(&module.stable_id))
  }

  /// Chunks in their final order: entry chunks in entry order, manual chunks in group order, then
  /// common chunks ordered by the entries that share them. Modules inside every chunk are in
  /// execution order.
  #[allow(clippy::cast_possible_truncation)]
  pub(super) fn split_chunks(&mut self) -> Vec<Chunk> {
    let entry_count = self.entry_points.len() as u32;
    let mut module_bits = index_vec![BitSet::new(entry_count); self.module_graph.len()];
    for (entry_index, entry) in self.entry_points.iter().enumerate() {
      self.determine_reachable_modules_for_entry(entry.idx, entry_index as u32, &mut module_bits);
    }

    let mut entry_chunks = self
      .entry_points
      .iter()
      .enumerate()
      .map(|(entry_index, entry)| {
        let mut bits = BitSet::new(entry_count);
        bits.set_bit(entry_index as u32);
        let kind = ChunkKind::EntryPoint {
          module: entry.idx,
          is_user_defined: entry.kind != EntryPointKind::DynamicImport,
        };
        let mut chunk = Chunk::new(entry.name.clone(), bits, vec![], kind);
        if let EntryPointKind::Emitted { reference_id, file_name } = &entry.kind {
          chunk.reference_id = Some(reference_id.clone());
          chunk.file_name.clone_from(file_name);
        }
        chunk
      })
      .collect::<Vec<_>>();

    let manual_groups = &self.options.manual_chunks;
    let mut manual_modules = vec![Vec::new(); manual_groups.len()];
    let mut common_modules: FxIndexMap<BitSet, Vec<ModuleIdx>> = FxIndexMap::default();

    for &idx in &self.sorted_modules {
      let Some(module) = self.module_graph[idx].as_normal() else { continue };
      let bits = &module_bits[idx];
      if bits.is_empty() {
        continue;
      }

      if let Some(group_index) = self.manual_group_of(module) {
        manual_modules[group_index].push(idx);
      } else if bits.count_ones() == 1 {
        let entry_index = bits.iter_ones().next().unwrap_or_default() as usize;
        entry_chunks[entry_index].modules.push(idx);
      } else {
        common_modules.entry(bits.clone()).or_default().push(idx);
      }
    }

    let mut manual_chunks = vec![];
    for (group, modules) in manual_groups.iter().zip(manual_modules) {
      if modules.is_empty() {
        self.warnings.push(BuildWarning::UnusedManualChunkGroup(group.name.clone()).into());
        continue;
      }
      let mut bits = BitSet::new(entry_count);
      modules.iter().for_each(|idx| bits.union(&module_bits[*idx]));
      let name = ArcStr::from(sanitize_file_name(&group.name));
      manual_chunks.push(Chunk::new(
        Some(name),
        bits,
        modules,
        ChunkKind::Manual { group: group.name.as_str().into() },
      ));
    }

    let mut common_chunks = common_modules
      .into_iter()
      .sorted_by_cached_key(|(bits, _)| bits.iter_ones().collect::<Vec<_>>())
      .map(|(bits, modules)| Chunk::new(None, bits, modules, ChunkKind::Common))
      .collect::<Vec<_>>();

    let advanced_chunks = &self.options.advanced_chunks;
    if !advanced_chunks.is_empty() {
      let module_graph = &*self.module_graph;
      common_chunks = apply_advanced_chunks(advanced_chunks, common_chunks, |idx| {
        let module = &module_graph[idx];
        ModuleWeight {
          size: module.as_normal().map_or(0, NormalModule::size),
          side_effect_free: !module.side_effects().has_side_effects(),
          exec_order: module.exec_order(),
        }
      });
    }

    entry_chunks.into_iter().chain(manual_chunks).chain(common_chunks).collect()
  }
}
