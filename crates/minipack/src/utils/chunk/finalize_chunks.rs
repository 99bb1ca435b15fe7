use std::hash::Hash;

use minipack_common::AssetIdx;
use minipack_utils::{
  hash_placeholder::{extract_hash_placeholders, replace_placeholder_with_hash},
  indexmap::FxIndexSet,
  rayon::{IntoParallelIterator, IntoParallelRefIterator, ParallelIterator},
  xxhash::{xxhash_base64_url, xxhash_with_base},
};
use oxc_index::IndexVec;
use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::Xxh3;

use crate::types::{IndexInstantiatedChunks, instantiated_chunk::FinalizedChunk};

/// Second naming pass: every hash placeholder in file names and contents is replaced with the
/// hash of the chunk owning it.
///
/// A chunk hash covers its own content, its preliminary file name and the content of every chunk
/// it reaches through placeholders, so a change deep in `a -> b -> c` renames `a` as well.
pub fn finalize_assets(chunks: IndexInstantiatedChunks) -> Vec<FinalizedChunk> {
  let owner_of = chunks
    .iter_enumerated()
    .flat_map(|(idx, chunk)| {
      let placeholders = chunk.preliminary_filename.hash_placeholder().unwrap_or_default();
      placeholders.iter().map(move |placeholder| (placeholder.as_str(), idx))
    })
    .collect::<FxHashMap<_, _>>();

  let direct_deps: IndexVec<AssetIdx, Vec<AssetIdx>> = chunks
    .par_iter()
    .map(|chunk| {
      extract_hash_placeholders(&chunk.content)
        .iter()
        .filter_map(|placeholder| owner_of.get(placeholder.as_str()).copied())
        .collect::<Vec<_>>()
    })
    .collect::<Vec<_>>()
    .into();

  let content_hashes: IndexVec<AssetIdx, String> = chunks
    .par_iter()
    .map(|chunk| xxhash_base64_url(chunk.content.as_bytes()))
    .collect::<Vec<_>>()
    .into();

  let final_hashes: IndexVec<AssetIdx, String> = chunks
    .indices()
    .collect::<Vec<_>>()
    .into_par_iter()
    .map(|idx| {
      let mut hasher = Xxh3::default();
      content_hashes[idx].hash(&mut hasher);
      // Chunks with the same content still get different hashes.
      chunks[idx].preliminary_filename.hash(&mut hasher);
      for dep in transitive_deps(idx, &direct_deps) {
        content_hashes[dep].hash(&mut hasher);
      }
      // Base36 keeps names apart on case-insensitive file systems.
      xxhash_with_base(&hasher.digest128().to_le_bytes(), 36)
    })
    .collect::<Vec<_>>()
    .into();

  let mut hash_by_placeholder = FxHashMap::default();
  for (placeholder, idx) in owner_of {
    let hash = &final_hashes[idx];
    let len = placeholder.len().min(hash.len());
    hash_by_placeholder.insert(placeholder.to_string(), hash[..len].to_string());
  }

  chunks
    .into_iter()
    .collect::<Vec<_>>()
    .into_par_iter()
    .map(|mut chunk| {
      let replace = |source: &str| {
        replace_placeholder_with_hash(source, &hash_by_placeholder).into_owned()
      };
      chunk.content = replace(&chunk.content);
      let filename = replace(&chunk.preliminary_filename);
      chunk.finalize(filename)
    })
    .collect()
}

/// Chunks reachable from `start`, in discovery order. `start` itself only shows up when it sits
/// on a cycle.
fn transitive_deps(
  start: AssetIdx,
  direct_deps: &IndexVec<AssetIdx, Vec<AssetIdx>>,
) -> FxIndexSet<AssetIdx> {
  let mut visited = FxIndexSet::default();
  let mut stack = direct_deps[start].iter().rev().copied().collect::<Vec<_>>();
  while let Some(idx) = stack.pop() {
    if visited.insert(idx) {
      stack.extend(direct_deps[idx].iter().rev().copied());
    }
  }
  visited
}

#[cfg(test)]
mod tests {
  use oxc_index::index_vec;

  use super::*;

  #[test]
  fn collects_dependencies_through_cycles() {
    let deps: IndexVec<AssetIdx, Vec<AssetIdx>> = index_vec![
      vec![AssetIdx::from(1usize)],
      vec![AssetIdx::from(2usize)],
      vec![AssetIdx::from(1usize)],
    ];
    let reached = transitive_deps(AssetIdx::from(0usize), &deps);
    assert_eq!(reached.into_iter().map(AssetIdx::index).collect::<Vec<_>>(), [1, 2]);
  }
}
