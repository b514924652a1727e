//! Read-Write Graph Ports - Interface Layer
//!
//! The points-to analysis is an external collaborator: the builder only asks
//! it what a pointer may point to, never triggers it.

use crate::features::read_write_graph::domain::PointsToSet;
use crate::shared::models::{FunctionId, Value};

// ============================================================================
// Points-To Oracle Port
// ============================================================================

/// Pointer → memory targets
pub trait PointsToOracle {
    /// Whether results for `function` are available (default: always)
    fn is_computed(&self, _function: FunctionId) -> bool {
        true
    }

    /// `None`: no information about `pointer`.
    /// `Some(empty)`: the pointer points nowhere known.
    fn resolve(&self, pointer: &Value) -> Option<PointsToSet>;
}

impl<T: PointsToOracle + ?Sized> PointsToOracle for &T {
    fn is_computed(&self, function: FunctionId) -> bool {
        (**self).is_computed(function)
    }

    fn resolve(&self, pointer: &Value) -> Option<PointsToSet> {
        (**self).resolve(pointer)
    }
}
