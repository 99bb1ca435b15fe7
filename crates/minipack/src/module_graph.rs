use std::ops::{Index, IndexMut};

use arcstr::ArcStr;
use minipack_common::{ImportKind, Module, ModuleIdx, ModuleState, ResolvedId};
use minipack_utils::{indexmap::FxIndexSet, option_ext::OptionExt};
use oxc_index::IndexVec;
use rustc_hash::{FxHashMap, FxHashSet};

const LIFECYCLE: [ModuleState; 7] = [
  ModuleState::Pending,
  ModuleState::Resolving,
  ModuleState::Resolved,
  ModuleState::Loading,
  ModuleState::Loaded,
  ModuleState::Transforming,
  ModuleState::Ready,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleEdge {
  /// The importee for outgoing edges, the importer for incoming ones.
  pub module: ModuleIdx,
  pub kind: ImportKind,
}

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
  #[error("Module {id:?} cannot go from `{from}` to `{to}`")]
  IllegalTransition { id: ArcStr, from: ModuleState, to: ModuleState },
  #[error("Module {id:?} is `{state}` and cannot import other modules yet")]
  UnresolvedImporter { id: ArcStr, state: ModuleState },
}

/// Modules of one build and the import edges between them.
///
/// The graph is only mutated by the module loader's receive loop. After a successful build it is
/// kept as the cache of the next one: changed modules are [`invalidate`](Self::invalidate)d, the
/// rest are reused as they are.
#[derive(Debug, Default)]
pub struct ModuleGraph {
  modules: IndexVec<ModuleIdx, Option<Module>>,
  resolved_ids: IndexVec<ModuleIdx, ResolvedId>,
  states: IndexVec<ModuleIdx, ModuleState>,
  dependencies: IndexVec<ModuleIdx, Vec<ModuleEdge>>,
  importers: IndexVec<ModuleIdx, Vec<ModuleEdge>>,
  /// Live modules. An invalidated module keeps its slot, so indices stay stable, but leaves
  /// this map.
  ids: FxHashMap<ArcStr, ModuleIdx>,
}

impl ModuleGraph {
  /// Allocates a `Pending` slot for `resolved_id`. Returns the existing slot and `false` if the id
  /// is already known.
  pub fn add_module(&mut self, resolved_id: ResolvedId) -> (ModuleIdx, bool) {
    if let Some(idx) = self.ids.get(&resolved_id.id) {
      return (*idx, false);
    }
    let idx = self.modules.push(None);
    self.states.push(ModuleState::Pending);
    self.dependencies.push(Vec::new());
    self.importers.push(Vec::new());
    self.ids.insert(resolved_id.id.clone(), idx);
    self.resolved_ids.push(resolved_id);
    (idx, true)
  }

  pub fn get_idx(&self, id: &str) -> Option<ModuleIdx> {
    self.ids.get(id).copied()
  }

  /// The id a slot was created for. Still available after the slot was invalidated.
  pub fn resolved_id(&self, idx: ModuleIdx) -> &ResolvedId {
    &self.resolved_ids[idx]
  }

  /// Ids of the modules that are files on disk, leaving out external and virtual ones. Includes
  /// modules that have not finished loading.
  pub fn file_ids(&self) -> impl Iterator<Item = &ArcStr> {
    self
      .ids
      .iter()
      .filter(|(id, idx)| !id.starts_with('\0') && !self.resolved_ids[**idx].external)
      .map(|(id, _)| id)
  }

  pub fn state(&self, idx: ModuleIdx) -> ModuleState {
    self.states[idx]
  }

  pub fn transition(&mut self, idx: ModuleIdx, next: ModuleState) -> Result<(), GraphError> {
    let current = self.states[idx];
    if !current.can_transition_to(next) {
      return Err(GraphError::IllegalTransition {
        id: self.resolved_ids[idx].id.clone(),
        from: current,
        to: next,
      });
    }
    tracing::trace!("{} {current} -> {next}", self.resolved_ids[idx].id);
    self.states[idx] = next;
    Ok(())
  }

  /// Walks the regular lifecycle from the current state up to `target`, one transition at a time.
  pub fn advance_to(&mut self, idx: ModuleIdx, target: ModuleState) -> Result<(), GraphError> {
    let position = |state| LIFECYCLE.iter().position(|candidate| *candidate == state);
    match (position(self.states[idx]), position(target)) {
      (Some(from), Some(to)) if from < to => {
        for state in &LIFECYCLE[from + 1..=to] {
          self.transition(idx, *state)?;
        }
        Ok(())
      }
      _ => self.transition(idx, target),
    }
  }

  pub fn set_module(&mut self, module: Module) {
    let idx = module.idx();
    self.modules[idx] = Some(module);
  }

  pub fn get(&self, idx: ModuleIdx) -> Option<&Module> {
    self.modules.get(idx).and_then(Option::as_ref)
  }

  pub fn get_mut(&mut self, idx: ModuleIdx) -> Option<&mut Module> {
    self.modules.get_mut(idx).and_then(Option::as_mut)
  }

  /// Live modules in index order.
  pub fn modules(&self) -> impl Iterator<Item = &Module> {
    self.modules.iter().flatten()
  }

  pub fn modules_mut(&mut self) -> impl Iterator<Item = &mut Module> {
    self.modules.iter_mut().flatten()
  }

  /// Number of slots, invalidated ones included.
  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ids.is_empty()
  }

  /// Edges may only leave a module whose id is known. Several edges between the same pair of
  /// modules are fine, so are cycles.
  pub fn add_edge(
    &mut self,
    from: ModuleIdx,
    to: ModuleIdx,
    kind: ImportKind,
  ) -> Result<(), GraphError> {
    let state = self.states[from];
    if !state.is_at_least_resolved() {
      return Err(GraphError::UnresolvedImporter { id: self.resolved_ids[from].id.clone(), state });
    }
    self.dependencies[from].push(ModuleEdge { module: to, kind });
    self.importers[to].push(ModuleEdge { module: from, kind });
    Ok(())
  }

  pub fn dependencies(&self, idx: ModuleIdx) -> &[ModuleEdge] {
    &self.dependencies[idx]
  }

  pub fn importers(&self, idx: ModuleIdx) -> &[ModuleEdge] {
    &self.importers[idx]
  }

  /// No live module is waiting for work.
  pub fn is_complete(&self) -> bool {
    self.ids.values().all(|idx| self.states[*idx].is_terminal())
  }

  /// Forward closure over static and dynamic edges, in discovery order.
  pub fn reachable_from(
    &self,
    entries: impl IntoIterator<Item = ModuleIdx>,
  ) -> FxIndexSet<ModuleIdx> {
    self.closure(entries, &self.dependencies)
  }

  /// Every module that imports one of `seeds`, directly or not. The seeds are part of the result.
  pub fn importers_closure(
    &self,
    seeds: impl IntoIterator<Item = ModuleIdx>,
  ) -> FxIndexSet<ModuleIdx> {
    self.closure(seeds, &self.importers)
  }

  fn closure(
    &self,
    seeds: impl IntoIterator<Item = ModuleIdx>,
    edges: &IndexVec<ModuleIdx, Vec<ModuleEdge>>,
  ) -> FxIndexSet<ModuleIdx> {
    let mut visited = FxIndexSet::default();
    let mut stack = seeds.into_iter().collect::<Vec<_>>();
    stack.reverse();
    while let Some(idx) = stack.pop() {
      if !visited.insert(idx) {
        continue;
      }
      stack.extend(edges[idx].iter().rev().map(|edge| edge.module));
    }
    visited
  }

  /// Drops a module from the graph. Its outgoing and incoming edges go first, so no edge is
  /// left pointing at an empty slot.
  pub fn invalidate(&mut self, idx: ModuleIdx) -> Option<Module> {
    for edge in std::mem::take(&mut self.dependencies[idx]) {
      self.importers[edge.module].retain(|importer| importer.module != idx);
    }
    for edge in std::mem::take(&mut self.importers[idx]) {
      self.dependencies[edge.module].retain(|dependency| dependency.module != idx);
    }
    self.ids.remove(&self.resolved_ids[idx].id);
    self.states[idx] = ModuleState::Pending;
    self.modules[idx].take()
  }

  /// Flags the side-effect free modules no one imports bindings from. `entries` are the modules
  /// the chunks expose, their bindings always count as used.
  pub fn mark_tree_shakeable(&mut self, entries: impl IntoIterator<Item = ModuleIdx>) {
    let mut used_for_bindings = entries.into_iter().collect::<FxHashSet<_>>();
    for module in self.modules() {
      for record in module.import_records() {
        let Some(target) = record.resolved_module() else { continue };
        if !(record.kind.is_static() && record.is_plain_import()) {
          used_for_bindings.insert(target);
        }
      }
    }
    for module in self.modules.iter_mut().flatten() {
      if let Module::Normal(module) = module {
        module.tree_shakeable =
          !module.side_effects.has_side_effects() && !used_for_bindings.contains(&module.idx);
      }
    }
  }
}

impl Index<ModuleIdx> for ModuleGraph {
  type Output = Module;

  fn index(&self, idx: ModuleIdx) -> &Self::Output {
    self.modules[idx].as_ref().unpack()
  }
}

impl IndexMut<ModuleIdx> for ModuleGraph {
  fn index_mut(&mut self, idx: ModuleIdx) -> &mut Self::Output {
    self.modules[idx].as_mut().unpack()
  }
}

#[cfg(test)]
mod tests {
  use minipack_common::{ExternalModule, ImportKind, ModuleId, ModuleState, ResolvedId};

  use super::{GraphError, ModuleGraph};

  fn advance_to_resolved(graph: &mut ModuleGraph, id: &str) -> minipack_common::ModuleIdx {
    let (idx, inserted) = graph.add_module(ResolvedId::new(id));
    assert!(inserted);
    graph.transition(idx, ModuleState::Resolving).unwrap();
    graph.transition(idx, ModuleState::Resolved).unwrap();
    idx
  }

  #[test]
  fn rejects_illegal_transitions() {
    let mut graph = ModuleGraph::default();
    let (idx, _) = graph.add_module(ResolvedId::new("/a.js"));
    assert!(matches!(
      graph.transition(idx, ModuleState::Loading),
      Err(GraphError::IllegalTransition { from: ModuleState::Pending, .. })
    ));
    graph.transition(idx, ModuleState::Failed).unwrap();
    assert!(graph.transition(idx, ModuleState::Resolving).is_err());
    assert!(graph.is_complete());
  }

  #[test]
  fn advances_along_the_lifecycle() {
    let mut graph = ModuleGraph::default();
    let (idx, _) = graph.add_module(ResolvedId::new("/a.js"));
    graph.advance_to(idx, ModuleState::Resolved).unwrap();
    assert_eq!(graph.state(idx), ModuleState::Resolved);
    graph.transition(idx, ModuleState::Loading).unwrap();
    graph.advance_to(idx, ModuleState::Ready).unwrap();
    assert_eq!(graph.state(idx), ModuleState::Ready);
    assert!(graph.advance_to(idx, ModuleState::Loaded).is_err());
    assert!(graph.advance_to(idx, ModuleState::Failed).is_err());
  }

  #[test]
  fn edges_need_a_resolved_importer() {
    let mut graph = ModuleGraph::default();
    let (a, _) = graph.add_module(ResolvedId::new("/a.js"));
    let b = advance_to_resolved(&mut graph, "/b.js");
    assert!(matches!(
      graph.add_edge(a, b, ImportKind::Import),
      Err(GraphError::UnresolvedImporter { state: ModuleState::Pending, .. })
    ));
    graph.add_edge(b, a, ImportKind::Import).unwrap();
    graph.add_edge(b, a, ImportKind::DynamicImport).unwrap();
    assert_eq!(graph.dependencies(b).len(), 2);
    assert_eq!(graph.importers(a).len(), 2);
    assert!(!graph.is_complete());
  }

  #[test]
  fn closures_and_invalidation() {
    let mut graph = ModuleGraph::default();
    let a = advance_to_resolved(&mut graph, "/a.js");
    let b = advance_to_resolved(&mut graph, "/b.js");
    let c = advance_to_resolved(&mut graph, "/c.js");
    let d = advance_to_resolved(&mut graph, "/d.js");
    graph.add_edge(a, b, ImportKind::Import).unwrap();
    graph.add_edge(b, c, ImportKind::Import).unwrap();
    graph.add_edge(c, b, ImportKind::Import).unwrap();
    graph.add_edge(a, d, ImportKind::DynamicImport).unwrap();

    assert_eq!(graph.reachable_from([a]).into_iter().collect::<Vec<_>>(), vec![a, b, c, d]);
    assert_eq!(graph.reachable_from([c]).into_iter().collect::<Vec<_>>(), vec![c, b]);
    assert_eq!(graph.importers_closure([c]).into_iter().collect::<Vec<_>>(), vec![c, b, a]);

    graph.set_module(ExternalModule::new(c, ModuleId::from("/c.js")).into());
    assert!(graph.invalidate(c).is_some());
    assert!(graph.get(c).is_none());
    assert_eq!(graph.get_idx("/c.js"), None);
    assert_eq!(graph.resolved_id(c).id, "/c.js");
    assert!(graph.dependencies(b).is_empty());
    assert!(graph.importers(b).iter().all(|edge| edge.module == a));
    assert!(graph.add_module(ResolvedId::new("/c.js")).1);
  }
}
