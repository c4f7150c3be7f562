// src/graph.rs

//! Dependency graph over operations
//!
//! Provides graph construction, topological sorting, cycle detection,
//! and parallel batching for plan execution ordering. Operations refer
//! to their prerequisites by id; edges naming ids that are not in the
//! graph are treated as already satisfied, since the resolver may have
//! dropped a redundant prerequisite (an existing directory, say).

use crate::error::{Error, Result};
use crate::operation::{Operation, OperationId};
use std::collections::HashMap;

/// A directed acyclic graph of operations
///
/// Construction is O(n + e). Node order is the insertion order of the
/// input slice; all traversal output is deterministic given equal input.
#[derive(Debug)]
pub struct DependencyGraph {
    ops: Vec<Operation>,
    index: HashMap<OperationId, usize>,
    deps: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Build a graph from each operation's dependency list
    pub fn build(operations: Vec<Operation>) -> Self {
        let mut index = HashMap::with_capacity(operations.len());
        for (i, op) in operations.iter().enumerate() {
            index.insert(op.id().clone(), i);
        }
        let deps = operations
            .iter()
            .map(|op| {
                op.dependencies()
                    .iter()
                    .filter_map(|id| index.get(id).copied())
                    .collect()
            })
            .collect();
        Self {
            ops: operations,
            index,
            deps,
        }
    }

    /// Number of operations in the graph
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// True if an operation with this id is in the graph
    pub fn has_operation(&self, id: &OperationId) -> bool {
        self.index.contains_key(id)
    }

    /// In-graph dependencies of an operation, as an owned copy
    pub fn dependencies(&self, id: &OperationId) -> Vec<Operation> {
        let Some(&i) = self.index.get(id) else {
            return Vec::new();
        };
        self.deps[i].iter().map(|&d| self.ops[d].clone()).collect()
    }

    /// All operations, in insertion order
    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    /// Find a dependency cycle, if any.
    ///
    /// The returned list is a witness walk: its first and last elements
    /// are the same operation, and each consecutive pair `(a, b)`
    /// satisfies "b is a dependency of a". A self-loop comes back as a
    /// one-element list.
    pub fn find_cycle(&self) -> Option<Vec<Operation>> {
        let n = self.ops.len();
        let mut visited = vec![false; n];
        let mut on_stack = vec![false; n];
        let mut parent: Vec<Option<usize>> = vec![None; n];

        for start in 0..n {
            if visited[start] {
                continue;
            }
            if let Some((from, to)) =
                self.dfs_cycle(start, &mut visited, &mut on_stack, &mut parent)
            {
                if from == to {
                    return Some(vec![self.ops[from].clone()]);
                }
                // Walk the discovery path back from the closing edge to
                // the cycle start, then close the loop.
                let mut chain = vec![from];
                let mut current = from;
                while let Some(p) = parent[current] {
                    chain.push(p);
                    current = p;
                    if p == to {
                        break;
                    }
                }
                chain.reverse();
                let mut cycle: Vec<Operation> =
                    chain.into_iter().map(|i| self.ops[i].clone()).collect();
                cycle.push(self.ops[to].clone());
                return Some(cycle);
            }
        }
        None
    }

    fn dfs_cycle(
        &self,
        u: usize,
        visited: &mut [bool],
        on_stack: &mut [bool],
        parent: &mut [Option<usize>],
    ) -> Option<(usize, usize)> {
        visited[u] = true;
        on_stack[u] = true;

        for &v in &self.deps[u] {
            if !visited[v] {
                parent[v] = Some(u);
                if let Some(found) = self.dfs_cycle(v, visited, on_stack, parent) {
                    return Some(found);
                }
            } else if on_stack[v] {
                return Some((u, v));
            }
        }

        on_stack[u] = false;
        None
    }

    /// Dependency-respecting order: every dependency appears before its
    /// dependents. Ties between independent operations are broken by
    /// insertion order, so equal inputs produce identical output.
    pub fn topological_sort(&self) -> Result<Vec<Operation>> {
        if let Some(cycle) = self.find_cycle() {
            return Err(Error::CyclicDependency {
                cycle: cycle.iter().map(Operation::to_string).collect(),
            });
        }

        let mut visited = vec![false; self.ops.len()];
        let mut order = Vec::with_capacity(self.ops.len());
        for i in 0..self.ops.len() {
            self.post_order(i, &mut visited, &mut order);
        }
        Ok(order.into_iter().map(|i| self.ops[i].clone()).collect())
    }

    fn post_order(&self, u: usize, visited: &mut [bool], out: &mut Vec<usize>) {
        if visited[u] {
            return;
        }
        visited[u] = true;
        for &v in &self.deps[u] {
            self.post_order(v, visited, out);
        }
        out.push(u);
    }

    /// Partition into batches: every operation in batch `k` depends only
    /// on operations in earlier batches, so a whole batch may execute
    /// concurrently. An empty graph yields an empty plan; a cyclic graph
    /// yields only the acyclic prefix (callers sort first, which rejects
    /// cycles).
    pub fn parallelization_plan(&self) -> Vec<Vec<Operation>> {
        let n = self.ops.len();
        let mut placed = vec![false; n];
        let mut remaining = n;
        let mut batches = Vec::new();

        while remaining > 0 {
            let batch: Vec<usize> = (0..n)
                .filter(|&i| !placed[i] && self.deps[i].iter().all(|&d| placed[d]))
                .collect();
            if batch.is_empty() {
                break;
            }
            for &i in &batch {
                placed[i] = true;
                remaining -= 1;
            }
            batches.push(batch.into_iter().map(|i| self.ops[i].clone()).collect());
        }
        batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::FilePath;

    fn file(p: &str) -> FilePath {
        FilePath::new(p).unwrap()
    }

    fn op(n: usize) -> Operation {
        Operation::dir_create(file(&format!("/home/u/d{n}")))
    }

    #[test]
    fn test_sort_puts_dependencies_first() {
        let a = op(1);
        let b = op(2).with_dependency(a.id().clone());
        let c = op(3).with_dependency(b.id().clone());
        let graph = DependencyGraph::build(vec![c.clone(), b.clone(), a.clone()]);

        let sorted = graph.topological_sort().unwrap();
        let pos = |needle: &Operation| {
            sorted
                .iter()
                .position(|o| o.id() == needle.id())
                .expect("operation present")
        };
        assert!(pos(&a) < pos(&b));
        assert!(pos(&b) < pos(&c));
    }

    #[test]
    fn test_sort_is_deterministic_for_equal_inputs() {
        let ops: Vec<Operation> = (0..6).map(op).collect();
        let graph_a = DependencyGraph::build(ops.clone());
        let graph_b = DependencyGraph::build(ops);

        let ids_a: Vec<_> = graph_a
            .topological_sort()
            .unwrap()
            .iter()
            .map(|o| o.id().clone())
            .collect();
        let ids_b: Vec<_> = graph_b
            .topological_sort()
            .unwrap()
            .iter()
            .map(|o| o.id().clone())
            .collect();
        assert_eq!(ids_a, ids_b);
    }

    #[test]
    fn test_cycle_is_rejected_with_witness() {
        let mut a = op(1);
        let b = op(2).with_dependency(a.id().clone());
        a = a.with_dependency(b.id().clone());
        let graph = DependencyGraph::build(vec![a.clone(), b.clone()]);

        let err = graph.topological_sort().unwrap_err();
        match err {
            Error::CyclicDependency { cycle } => {
                assert!(cycle.contains(&a.to_string()));
                assert!(cycle.contains(&b.to_string()));
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn test_cycle_witness_walks_dependency_edges() {
        let mut a = op(1);
        let b = op(2).with_dependency(a.id().clone());
        let c = op(3).with_dependency(b.id().clone());
        a = a.with_dependency(c.id().clone());
        let graph = DependencyGraph::build(vec![a, b, c]);

        let cycle = graph.find_cycle().expect("cycle present");
        assert!(cycle.len() >= 2);
        assert_eq!(cycle.first().unwrap().id(), cycle.last().unwrap().id());
        for pair in cycle.windows(2) {
            assert!(
                pair[0].dependencies().contains(pair[1].id()),
                "{} should depend on {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_self_loop_is_a_one_element_cycle() {
        let mut a = op(1);
        let a_id = a.id().clone();
        a = a.with_dependency(a_id);
        let graph = DependencyGraph::build(vec![a.clone()]);

        let cycle = graph.find_cycle().expect("self-loop found");
        assert_eq!(cycle.len(), 1);
        assert_eq!(cycle[0].id(), a.id());
    }

    #[test]
    fn test_acyclic_graph_has_no_cycle() {
        let a = op(1);
        let b = op(2).with_dependency(a.id().clone());
        let graph = DependencyGraph::build(vec![a, b]);
        assert!(graph.find_cycle().is_none());
    }

    #[test]
    fn test_unknown_dependency_is_treated_as_satisfied() {
        let ghost = op(9);
        let a = op(1).with_dependency(ghost.id().clone());
        let graph = DependencyGraph::build(vec![a]);

        let sorted = graph.topological_sort().unwrap();
        assert_eq!(sorted.len(), 1);
    }

    #[test]
    fn test_parallel_batches_respect_dependencies() {
        let a = op(1);
        let b = op(2);
        let c = op(3).with_dependency(a.id().clone());
        let d = op(4)
            .with_dependency(b.id().clone())
            .with_dependency(c.id().clone());
        let graph = DependencyGraph::build(vec![a.clone(), b.clone(), c.clone(), d.clone()]);

        let batches = graph.parallelization_plan();
        assert_eq!(batches.len(), 3);
        let batch_of = |needle: &Operation| {
            batches
                .iter()
                .position(|batch| batch.iter().any(|o| o.id() == needle.id()))
                .expect("operation placed")
        };
        assert_eq!(batch_of(&a), 0);
        assert_eq!(batch_of(&b), 0);
        assert_eq!(batch_of(&c), 1);
        assert_eq!(batch_of(&d), 2);

        for (k, batch) in batches.iter().enumerate() {
            for member in batch {
                for dep in member.dependencies() {
                    if graph.has_operation(dep) {
                        let dep_batch = batches
                            .iter()
                            .position(|b| b.iter().any(|o| o.id() == dep))
                            .unwrap();
                        assert!(dep_batch < k);
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_graph() {
        let graph = DependencyGraph::build(Vec::new());
        assert!(graph.is_empty());
        assert!(graph.topological_sort().unwrap().is_empty());
        assert!(graph.parallelization_plan().is_empty());
        assert!(graph.find_cycle().is_none());
    }

    #[test]
    fn test_dependencies_query_is_a_copy() {
        let a = op(1);
        let b = op(2).with_dependency(a.id().clone());
        let graph = DependencyGraph::build(vec![a.clone(), b.clone()]);

        let deps = graph.dependencies(b.id());
        assert_eq!(deps.len(), 1);
        assert!(deps[0].same_effect(&a));
        assert!(graph.dependencies(a.id()).is_empty());
    }
}
