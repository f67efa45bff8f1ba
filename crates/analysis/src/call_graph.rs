//! Call graph over AST node ids.
//!
//! Callers are functions, or contracts for calls made during the
//! constructor phase; edges point at statically resolved callees. The
//! verification driver aggregates per-scope assertion sets over the
//! transitive closure, so an assertion deep in a call chain is checked
//! once per transaction entry point that can reach it.

use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::ast::NodeId;

/// Caller → callee-set map.
#[derive(Debug, Default)]
pub struct CallGraph {
    edges: HashMap<NodeId, BTreeSet<NodeId>>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_edge(&mut self, caller: NodeId, callee: NodeId) {
        self.edges.entry(caller).or_default().insert(callee);
    }

    pub fn callees(&self, caller: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.edges
            .get(&caller)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Every node reachable from `root` through call edges, including
    /// `root` itself. Breadth-first; cycles are fine.
    pub fn reachable_from(&self, root: NodeId) -> BTreeSet<NodeId> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([root]);
        while let Some(node) = queue.pop_front() {
            if !seen.insert(node) {
                continue;
            }
            for callee in self.callees(node) {
                if !seen.contains(&callee) {
                    queue.push_back(callee);
                }
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reachability_is_transitive() {
        let mut graph = CallGraph::new();
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);
        graph.add_edge(10, 11);

        let reachable = graph.reachable_from(1);
        assert_eq!(reachable, BTreeSet::from([1, 2, 3]));
        assert!(!reachable.contains(&11));
    }

    #[test]
    fn root_is_always_reachable() {
        let graph = CallGraph::new();
        assert_eq!(graph.reachable_from(5), BTreeSet::from([5]));
    }

    #[test]
    fn cycles_terminate() {
        let mut graph = CallGraph::new();
        graph.add_edge(1, 2);
        graph.add_edge(2, 1);
        assert_eq!(graph.reachable_from(1), BTreeSet::from([1, 2]));
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut graph = CallGraph::new();
        graph.add_edge(1, 2);
        graph.add_edge(1, 2);
        assert_eq!(graph.callees(1).count(), 1);
    }
}
