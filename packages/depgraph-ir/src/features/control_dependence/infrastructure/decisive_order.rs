/*
 * Decisive (Order) Dependence
 *
 * Non-termination sensitive control dependence computed directly on the
 * CDGraph, without post-dominators:
 *
 *   must-reach(A) = least fixpoint containing A, plus every node with at
 *                   least one successor whose successors are all in the set
 *
 *   P decides A   iff P has >= 2 successors, some successor is in
 *                 must-reach(A) and some successor is not
 *
 * Every maximal path (including infinite ones) from a node in
 * must-reach(A) visits A. Exit nodes never join the set unless they are A.
 *
 * Decisive order dependence (optional): P decides the order of {A, B} when
 * every maximal path from P visits both, one successor of P must reach A
 * before B and another must reach B before A. The pair is flattened into
 * (P, A) and (P, B).
 *
 * Complexity: O(N * (N + E)) for the decisive part. The order part is
 * cubic in the number of always-visited nodes per decision and is off by
 * default.
 */

use petgraph::graph::NodeIndex;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use tracing::trace;

use crate::features::control_dependence::domain::{CDGraph, ControlDependenceRelation};

/// Must-reach set indexed by `NodeIndex::index()`
type ReachSet = Vec<bool>;

/// Decisive dependence calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisiveOrderDependence {
    order_dependence: bool,
}

impl DecisiveOrderDependence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also compute decisive order dependence
    pub fn with_order_dependence(mut self, enabled: bool) -> Self {
        self.order_dependence = enabled;
        self
    }

    pub fn compute(&self, graph: &CDGraph) -> ControlDependenceRelation {
        let mut relation = ControlDependenceRelation::new();

        let decisions: Vec<NodeIndex> = graph.nodes().filter(|n| graph.is_decision(*n)).collect();
        if decisions.is_empty() {
            trace!("'{}' has no decision nodes", graph.name());
            return relation;
        }

        let reach: Vec<ReachSet> = graph
            .nodes()
            .map(|target| must_reach(graph, target, None))
            .collect();

        for target in graph.nodes() {
            let target_reach = &reach[target.index()];
            for &decision in &decisions {
                if splits(graph, decision, target_reach) {
                    relation.add(decision, target);
                }
            }
        }

        if self.order_dependence {
            add_order_dependence(graph, &decisions, &reach, &mut relation);
        }

        trace!(
            "'{}': {} decisions, {} dependence pairs",
            graph.name(),
            decisions.len(),
            relation.len()
        );
        relation
    }
}

// ============================================================================
// Must-reach fixpoint
// ============================================================================

/// Nodes from which every maximal path visits `target`.
///
/// With `avoid`, paths must visit `target` before `avoid`; `avoid` itself is
/// never in the result.
fn must_reach(graph: &CDGraph, target: NodeIndex, avoid: Option<NodeIndex>) -> ReachSet {
    let n = graph.node_count();
    let mut reach = vec![false; n];
    // successors of each node not yet known to be in the set
    let mut pending: Vec<usize> = graph.nodes().map(|v| graph.successors(v).count()).collect();

    let mut worklist = VecDeque::new();
    reach[target.index()] = true;
    worklist.push_back(target);

    while let Some(node) = worklist.pop_front() {
        for pred in graph.predecessors(node) {
            let i = pred.index();
            if reach[i] || Some(pred) == avoid {
                continue;
            }
            pending[i] -= 1;
            if pending[i] == 0 {
                reach[i] = true;
                worklist.push_back(pred);
            }
        }
    }

    reach
}

/// `decision` has a successor inside and a successor outside `reach`
fn splits(graph: &CDGraph, decision: NodeIndex, reach: &ReachSet) -> bool {
    let mut inside = false;
    let mut outside = false;
    for succ in graph.successors(decision) {
        if reach[succ.index()] {
            inside = true;
        } else {
            outside = true;
        }
        if inside && outside {
            return true;
        }
    }
    false
}

// ============================================================================
// Decisive order dependence
// ============================================================================

fn add_order_dependence(
    graph: &CDGraph,
    decisions: &[NodeIndex],
    reach: &[ReachSet],
    relation: &mut ControlDependenceRelation,
) {
    let mut ordered: FxHashMap<(NodeIndex, NodeIndex), ReachSet> = FxHashMap::default();
    let mut reaches_first = |a: NodeIndex, b: NodeIndex| -> ReachSet {
        ordered
            .entry((a, b))
            .or_insert_with(|| must_reach(graph, a, Some(b)))
            .clone()
    };

    for &decision in decisions {
        let succs: Vec<NodeIndex> = graph.successors(decision).collect();
        let always: Vec<NodeIndex> = graph
            .nodes()
            .filter(|a| *a != decision && reach[a.index()][decision.index()])
            .collect();

        for (i, &a) in always.iter().enumerate() {
            for &b in &always[i + 1..] {
                let a_first = reaches_first(a, b);
                let b_first = reaches_first(b, a);
                let a_side = succs.iter().any(|s| a_first[s.index()]);
                let b_side = succs.iter().any(|s| b_first[s.index()]);
                if a_side && b_side {
                    relation.add(decision, a);
                    relation.add(decision, b);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{BlockId, FunctionId, Value};

    fn graph(n: u32, edges: &[(u32, u32)]) -> (CDGraph, Vec<NodeIndex>) {
        let mut g = CDGraph::new(FunctionId(0), "f");
        let nodes: Vec<_> = (0..n)
            .map(|i| {
                g.add_node(Value::Block(BlockId {
                    function: FunctionId(0),
                    index: i,
                }))
            })
            .collect();
        for (a, b) in edges {
            g.add_edge(nodes[*a as usize], nodes[*b as usize]);
        }
        (g, nodes)
    }

    fn pairs(rel: &ControlDependenceRelation) -> Vec<(usize, usize)> {
        rel.pairs().into_iter().map(|(p, d)| (p.index(), d.index())).collect()
    }

    #[test]
    fn test_straight_line_is_empty() {
        let (g, _) = graph(3, &[(0, 1), (1, 2)]);
        assert!(DecisiveOrderDependence::new().compute(&g).is_empty());
    }

    #[test]
    fn test_diamond() {
        // 0 -> {1, 2} -> 3
        let (g, _) = graph(4, &[(0, 1), (0, 2), (1, 3), (2, 3)]);
        let rel = DecisiveOrderDependence::new().compute(&g);
        assert_eq!(pairs(&rel), vec![(0, 1), (0, 2)]);
    }

    #[test]
    fn test_if_then_without_else() {
        // 0 -> {1, 2}, 1 -> 2
        let (g, _) = graph(3, &[(0, 1), (0, 2), (1, 2)]);
        let rel = DecisiveOrderDependence::new().compute(&g);
        assert_eq!(pairs(&rel), vec![(0, 1)]);
    }

    #[test]
    fn test_loop_exit_is_dependent() {
        // 0 -> 1, 1 -> {2, 3}, 2 -> 1; 3 exits.
        // Non-termination sensitive: the loop may spin forever, so the exit
        // depends on the loop predicate as well as the body.
        let (g, _) = graph(4, &[(0, 1), (1, 2), (1, 3), (2, 1)]);
        let rel = DecisiveOrderDependence::new().compute(&g);
        assert_eq!(pairs(&rel), vec![(1, 1), (1, 2), (1, 3)]);
    }

    #[test]
    fn test_infinite_self_loop() {
        // 0 -> {1, 2}, 1 -> 1
        let (g, _) = graph(3, &[(0, 1), (0, 2), (1, 1)]);
        let rel = DecisiveOrderDependence::new().compute(&g);
        assert_eq!(pairs(&rel), vec![(0, 1), (0, 2)]);
    }

    #[test]
    fn test_order_dependence_is_opt_in() {
        // 0 -> {1, 2}, 1 <-> 2: both are always visited, in either order
        let edges = [(0, 1), (0, 2), (1, 2), (2, 1)];
        let (g, _) = graph(3, &edges);

        assert!(DecisiveOrderDependence::new().compute(&g).is_empty());

        let rel = DecisiveOrderDependence::new()
            .with_order_dependence(true)
            .compute(&g);
        assert_eq!(pairs(&rel), vec![(0, 1), (0, 2)]);
    }

    #[test]
    fn test_reverse_matches_forward() {
        let (g, _) = graph(5, &[(0, 1), (0, 2), (1, 3), (1, 4), (2, 4), (3, 4)]);
        let rel = DecisiveOrderDependence::new().compute(&g);
        for (p, d) in rel.pairs() {
            assert!(rel.dependencies(d).unwrap().contains(&p));
        }
        let reverse_pairs: usize = rel.reverse().values().map(|s| s.len()).sum();
        assert_eq!(reverse_pairs, rel.len());
    }
}
