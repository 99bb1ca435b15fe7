use std::iter;

use minipack_common::{ModuleIdx, ResolvedImportRecord};
use minipack_error::BuildWarning;
use minipack_utils::indexmap::FxIndexSet;
use rustc_hash::{FxHashMap, FxHashSet};

use super::ChunkStage;

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
enum Status {
  ToBeExecuted(ModuleIdx),
  WaitForExit(ModuleIdx),
}

impl ChunkStage<'_> {
  /// Depth-first over static imports, starting from the entries in order. A module executes after
  /// everything it imports; in a cycle, the edge discovered first wins.
  pub(super) fn sort_modules(&mut self) {
    let mut execution_stack = self
      .entry_points
      .iter()
      .rev()
      .map(|entry| Status::ToBeExecuted(entry.idx))
      .collect::<Vec<_>>();

    let mut executed_ids = FxHashSet::default();
    let mut stack_indexes_of_executing_id = FxHashMap::default();

    let mut next_exec_order = 0;
    let mut circular_dependencies = FxIndexSet::default();
    let mut sorted_modules = Vec::with_capacity(self.module_graph.len());

    while let Some(status) = execution_stack.pop() {
      match status {
        Status::ToBeExecuted(id) => {
          if executed_ids.contains(&id) {
            if let Some(index) = stack_indexes_of_executing_id.get(&id).copied() {
              // Still executing, so `id` imports itself through the chain above it.
              let cycle = execution_stack[index..]
                .iter()
                .filter_map(|action| match action {
                  Status::ToBeExecuted(_) => None,
                  Status::WaitForExit(id) => Some(*id),
                })
                .chain(iter::once(id))
                .collect::<Box<[_]>>();
              circular_dependencies.insert(cycle);
            }
          } else {
            executed_ids.insert(id);
            execution_stack.push(Status::WaitForExit(id));
            stack_indexes_of_executing_id.insert(id, execution_stack.len() - 1);

            execution_stack.extend(
              self.module_graph[id]
                .import_records()
                .iter()
                .filter(|rec| rec.kind.is_static())
                .filter_map(ResolvedImportRecord::resolved_module)
                .rev()
                .map(Status::ToBeExecuted),
            );
          }
        }
        Status::WaitForExit(id) => {
          let module = &mut self.module_graph[id];
          module.set_exec_order(next_exec_order);
          if module.is_normal() {
            sorted_modules.push(id);
          }
          next_exec_order += 1;
          stack_indexes_of_executing_id.remove(&id);
        }
      }
    }

    for cycle in circular_dependencies {
      let paths = cycle
        .iter()
        .map(|id| self.module_graph[*id].stable_id().to_string())
        .collect::<Vec<_>>();
      self.warnings.push(BuildWarning::CircularDependency(paths).into());
    }

    self.sorted_modules = sorted_modules;
  }
}
