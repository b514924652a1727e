//! In-memory points-to table
//!
//! Answers from a precomputed map. Pointers never inserted resolve to
//! `None` (no information).

use rustc_hash::{FxHashMap, FxHashSet};

use crate::features::read_write_graph::domain::{MemoryTarget, Offset, PointsToSet, PointsToTarget};
use crate::features::read_write_graph::ports::PointsToOracle;
use crate::shared::models::{FunctionId, Value};

#[derive(Debug, Clone, Default)]
pub struct StaticPointsTo {
    sets: FxHashMap<Value, PointsToSet>,
    pending: FxHashSet<FunctionId>,
}

impl StaticPointsTo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one target for `pointer`
    pub fn insert(&mut self, pointer: Value, target: MemoryTarget, offset: Offset) {
        let set = self.sets.entry(pointer).or_default();
        let entry = PointsToTarget { target, offset };
        if !set.targets.contains(&entry) {
            set.targets.push(entry);
        }
    }

    /// Builder: Add one target for `pointer`
    pub fn with(mut self, pointer: Value, target: MemoryTarget, offset: Offset) -> Self {
        self.insert(pointer, target, offset);
        self
    }

    /// Record that `pointer` points nowhere (empty set, distinct from unknown)
    pub fn insert_empty(&mut self, pointer: Value) {
        self.sets.entry(pointer).or_default();
    }

    /// Report `function` as not yet analyzed
    pub fn mark_pending(&mut self, function: FunctionId) {
        self.pending.insert(function);
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl PointsToOracle for StaticPointsTo {
    fn is_computed(&self, function: FunctionId) -> bool {
        !self.pending.contains(&function)
    }

    fn resolve(&self, pointer: &Value) -> Option<PointsToSet> {
        self.sets.get(pointer).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::GlobalId;

    #[test]
    fn test_resolve() {
        let g = MemoryTarget::Object(Value::Global(GlobalId(0)));
        let mut pta = StaticPointsTo::new().with(Value::Constant(1), g, Offset(4));
        pta.insert(Value::Constant(1), g, Offset(4));
        pta.insert_empty(Value::Constant(2));

        assert_eq!(pta.resolve(&Value::Constant(1)).unwrap().len(), 1);
        assert!(pta.resolve(&Value::Constant(2)).unwrap().is_empty());
        assert!(pta.resolve(&Value::Constant(3)).is_none());
    }

    #[test]
    fn test_pending_functions() {
        let mut pta = StaticPointsTo::new();
        assert!(pta.is_computed(FunctionId(0)));
        pta.mark_pending(FunctionId(0));
        assert!(!pta.is_computed(FunctionId(0)));
        assert!(pta.is_computed(FunctionId(1)));
    }
}
