//! Graph builder domain models
//!
//! Flavor-independent building blocks shared by every builder.

use crate::errors::{DepGraphError, Result};
use crate::shared::models::Value;
use rustc_hash::FxHashMap;
use std::hash::Hash;

/// Nodes produced for one source value.
///
/// Never empty: the representative is always the first member, followed by
/// the remaining nodes in creation order. The representative is the node
/// used for every external lookup of the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeExpansion<N> {
    representative: N,
    nodes: Vec<N>,
}

impl<N: Copy + PartialEq> NodeExpansion<N> {
    /// Expansion consisting of a single node
    pub fn single(node: N) -> Self {
        Self {
            representative: node,
            nodes: vec![node],
        }
    }

    /// Representative followed by additional effect nodes
    pub fn with_effects(representative: N, effects: impl IntoIterator<Item = N>) -> Self {
        let mut nodes = vec![representative];
        nodes.extend(effects.into_iter().filter(|n| *n != representative));
        Self {
            representative,
            nodes,
        }
    }

    #[inline]
    pub fn representative(&self) -> N {
        self.representative
    }

    /// All nodes, representative first
    #[inline]
    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<N> IntoIterator for NodeExpansion<N> {
    type Item = N;
    type IntoIter = std::vec::IntoIter<N>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

/// Value → representative node mapping of one builder.
///
/// At most one entry per value: a second insertion is an invariant
/// violation ([`DepGraphError::DuplicateNode`]).
#[derive(Debug, Clone)]
pub struct NodeMap<N> {
    nodes: FxHashMap<Value, N>,
}

impl<N> Default for NodeMap<N> {
    fn default() -> Self {
        Self {
            nodes: FxHashMap::default(),
        }
    }
}

impl<N: Copy + Eq + Hash> NodeMap<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, value: Value, node: N) -> Result<()> {
        if self.nodes.contains_key(&value) {
            return Err(DepGraphError::DuplicateNode { value });
        }
        self.nodes.insert(value, node);
        Ok(())
    }

    pub fn remove(&mut self, value: &Value) -> Option<N> {
        self.nodes.remove(value)
    }

    /// O(1) lookup; `None` if the value was never built
    #[inline]
    pub fn get(&self, value: &Value) -> Option<N> {
        self.nodes.get(value).copied()
    }

    #[inline]
    pub fn contains(&self, value: &Value) -> bool {
        self.nodes.contains_key(value)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &N)> {
        self.nodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_expansion() {
        let exp = NodeExpansion::single(7u32);
        assert_eq!(exp.representative(), 7);
        assert_eq!(exp.nodes(), &[7]);
        assert!(!exp.is_empty());
    }

    #[test]
    fn test_effects_keep_creation_order() {
        let exp = NodeExpansion::with_effects(1u32, [4, 2, 1, 3]);
        assert_eq!(exp.representative(), 1);
        // representative is never listed twice
        assert_eq!(exp.nodes(), &[1, 4, 2, 3]);
        assert_eq!(exp.into_iter().collect::<Vec<_>>(), vec![1, 4, 2, 3]);
    }

    #[test]
    fn test_node_map_rejects_duplicates() {
        let mut map = NodeMap::new();
        map.insert(Value::Constant(1), 10u32).unwrap();
        let err = map.insert(Value::Constant(1), 11).unwrap_err();
        assert!(matches!(err, DepGraphError::DuplicateNode { .. }));
        assert_eq!(map.get(&Value::Constant(1)), Some(10));
        assert_eq!(map.get(&Value::Null), None);
        assert_eq!(map.len(), 1);
    }
}
