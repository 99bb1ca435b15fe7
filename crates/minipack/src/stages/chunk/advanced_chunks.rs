use minipack_common::{AdvancedChunksOptions, Chunk, ChunkKind, ModuleIdx};

#[derive(Debug, Clone, Copy)]
pub struct ModuleWeight {
  pub size: usize,
  pub side_effect_free: bool,
  pub exec_order: u32,
}

/// Splits common chunks above a max threshold, then merges common chunks below a min threshold
/// into a chunk loaded by at least the same entries.
pub fn apply_advanced_chunks(
  options: &AdvancedChunksOptions,
  chunks: Vec<Chunk>,
  weight_of: impl Fn(ModuleIdx) -> ModuleWeight,
) -> Vec<Chunk> {
  let mut chunks = chunks
    .into_iter()
    .flat_map(|chunk| split_oversized_chunk(options, chunk, &weight_of))
    .collect::<Vec<_>>();
  merge_undersized_chunks(options, &mut chunks, &weight_of);
  chunks
}

fn chunk_size(modules: &[ModuleIdx], weight_of: &impl Fn(ModuleIdx) -> ModuleWeight) -> usize {
  modules.iter().map(|idx| weight_of(*idx).size).sum()
}

/// Contiguous parts in execution order. A module larger than the max gets a part of its own.
fn split_oversized_chunk(
  options: &AdvancedChunksOptions,
  chunk: Chunk,
  weight_of: &impl Fn(ModuleIdx) -> ModuleWeight,
) -> Vec<Chunk> {
  if !options.exceeds_max(chunk_size(&chunk.modules, weight_of), chunk.modules.len()) {
    return vec![chunk];
  }

  let mut parts = vec![];
  let mut current = vec![];
  let mut current_size = 0;
  for idx in chunk.modules {
    let size = weight_of(idx).size;
    if !current.is_empty() && options.exceeds_max(current_size + size, current.len() + 1) {
      parts.push(std::mem::take(&mut current));
      current_size = 0;
    }
    current.push(idx);
    current_size += size;
  }
  if !current.is_empty() {
    parts.push(current);
  }

  tracing::debug!("Split a common chunk of {} into {} parts", chunk.bits, parts.len());
  parts
    .into_iter()
    .map(|modules| Chunk::new(None, chunk.bits.clone(), modules, ChunkKind::Common))
    .collect()
}

/// Only chunks made of side-effect free modules move: loading them from more entries than
/// before must not be observable.
fn merge_undersized_chunks(
  options: &AdvancedChunksOptions,
  chunks: &mut Vec<Chunk>,
  weight_of: &impl Fn(ModuleIdx) -> ModuleWeight,
) {
  for from in 0..chunks.len() {
    let chunk = &chunks[from];
    let size = chunk_size(&chunk.modules, weight_of);
    if chunk.modules.is_empty()
      || !options.below_min(size, chunk.modules.len())
      || !chunk.modules.iter().all(|idx| weight_of(*idx).side_effect_free)
    {
      continue;
    }

    // The closest superset wins: fewest entries first, then smallest size, then chunk order.
    let target = chunks
      .iter()
      .enumerate()
      .filter(|(to, other)| {
        *to != from
          && !other.modules.is_empty()
          && chunk.bits.is_subset_of(&other.bits)
          && !options.exceeds_max(
            chunk_size(&other.modules, weight_of) + size,
            other.modules.len() + chunk.modules.len(),
          )
      })
      .min_by_key(|(to, other)| {
        (other.bits.count_ones(), chunk_size(&other.modules, weight_of), *to)
      })
      .map(|(to, _)| to);

    if let Some(to) = target {
      let modules = std::mem::take(&mut chunks[from].modules);
      let target = &mut chunks[to];
      tracing::debug!("Merge {} modules into the common chunk {}", modules.len(), target.bits);
      target.modules.extend(modules);
      target.modules.sort_by_key(|idx| weight_of(*idx).exec_order);
    }
  }

  chunks.retain(|chunk| !chunk.modules.is_empty());
}

#[cfg(test)]
mod tests {
  use minipack_common::{AdvancedChunksOptions, Chunk, ChunkKind, ModuleIdx};
  use minipack_utils::bitset::BitSet;
  use oxc_index::Idx;

  use super::{ModuleWeight, apply_advanced_chunks};

  fn bits(ones: &[u32]) -> BitSet {
    let mut bits = BitSet::new(8);
    ones.iter().for_each(|bit| bits.set_bit(*bit));
    bits
  }

  fn chunk(ones: &[u32], modules: &[usize]) -> Chunk {
    let modules = modules.iter().map(|i| ModuleIdx::new(*i)).collect();
    Chunk::new(None, bits(ones), modules, ChunkKind::Common)
  }

  /// Module `i` weighs `10 * (i + 1)` bytes and executes in index order. Modules from 100 on
  /// have side effects.
  fn weight(idx: ModuleIdx) -> ModuleWeight {
    let i = idx.index();
    ModuleWeight {
      size: 10 * (i + 1),
      side_effect_free: i < 100,
      exec_order: u32::try_from(i).unwrap(),
    }
  }

  fn modules_of(chunks: &[Chunk]) -> Vec<Vec<usize>> {
    chunks.iter().map(|chunk| chunk.modules.iter().map(|idx| idx.index()).collect()).collect()
  }

  #[test]
  fn splits_by_module_count() {
    let options = AdvancedChunksOptions { max_module_count: Some(2), ..Default::default() };
    let chunks = apply_advanced_chunks(&options, vec![chunk(&[0, 1], &[0, 1, 2, 3, 4])], weight);
    assert_eq!(modules_of(&chunks), vec![vec![0, 1], vec![2, 3], vec![4]]);
    assert!(chunks.iter().all(|chunk| chunk.bits == bits(&[0, 1])));
  }

  #[test]
  fn splits_by_size_keeping_large_modules_alone() {
    let options = AdvancedChunksOptions { max_size: Some(35), ..Default::default() };
    // Sizes: 10, 20, 30, 40.
    let chunks = apply_advanced_chunks(&options, vec![chunk(&[0, 1], &[0, 1, 2, 3])], weight);
    assert_eq!(modules_of(&chunks), vec![vec![0, 1], vec![2], vec![3]]);
  }

  #[test]
  fn merges_into_the_closest_superset() {
    let options = AdvancedChunksOptions { min_size: Some(25), ..Default::default() };
    let chunks = apply_advanced_chunks(
      &options,
      vec![chunk(&[0, 1], &[0]), chunk(&[0, 1, 2, 3], &[5, 6]), chunk(&[0, 1, 2], &[3, 4])],
      weight,
    );
    assert_eq!(modules_of(&chunks), vec![vec![5, 6], vec![0, 3, 4]]);
  }

  #[test]
  fn keeps_chunks_with_side_effects() {
    let options = AdvancedChunksOptions { min_module_count: Some(2), ..Default::default() };
    let chunks = apply_advanced_chunks(
      &options,
      vec![chunk(&[0, 1], &[100]), chunk(&[0, 1, 2], &[3, 4])],
      weight,
    );
    assert_eq!(modules_of(&chunks), vec![vec![100], vec![3, 4]]);
  }

  #[test]
  fn does_not_merge_past_the_max() {
    let options =
      AdvancedChunksOptions { min_size: Some(15), max_size: Some(40), ..Default::default() };
    let chunks = apply_advanced_chunks(
      &options,
      vec![chunk(&[0, 1], &[0]), chunk(&[0, 1, 2], &[1]), chunk(&[0, 1, 2], &[2])],
      weight,
    );
    // Module 0 (10 bytes) joins module 1 (20 bytes). Module 2 (30 bytes) is above the min.
    assert_eq!(modules_of(&chunks), vec![vec![0, 1], vec![2]]);
  }
}
