//! Control Dependence Ports - Interface Layer
//!
//! Query interface of a control-dependence analysis. Results are values of
//! the program model: decision blocks (`Value::Block`) in block granularity,
//! decision instructions (`Value::Inst`) in instruction granularity.

use crate::errors::Result;
use crate::features::control_dependence::domain::CDGraph;
use crate::shared::models::{BlockId, FunctionId, InstId, Value};

// ═══════════════════════════════════════════════════════════════════════════
// Control Dependence Query Port
// ═══════════════════════════════════════════════════════════════════════════

/// Control-dependence queries.
///
/// Queries compute the owning function on first use; there is no separate
/// "ready" state to check.
pub trait ControlDependence {
    /// Decision instructions `inst` depends on.
    /// Empty in block granularity.
    fn instruction_dependencies(&mut self, inst: InstId) -> Result<Vec<Value>>;

    /// Instructions whose execution `inst` decides.
    /// Always empty: the reverse relation is exposed per function instead.
    fn instruction_dependents(&mut self, inst: InstId) -> Result<Vec<Value>>;

    /// Decision blocks `block` depends on.
    /// Empty in instruction granularity.
    fn block_dependencies(&mut self, block: BlockId) -> Result<Vec<Value>>;

    /// Not supported: always `Err(Unsupported)`
    fn block_dependents(&mut self, block: BlockId) -> Result<Vec<Value>>;

    /// Compute one function, or every defined function with `None`
    fn compute(&mut self, function: Option<FunctionId>) -> Result<()>;

    /// Internal graph of a computed function
    fn graph(&self, function: FunctionId) -> Option<&CDGraph>;
}
