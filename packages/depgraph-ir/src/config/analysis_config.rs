//! Analysis configuration
//!
//! One config struct per graph flavor plus the aggregate [`AnalysisConfig`],
//! loadable from a versioned YAML file:
//!
//! ```yaml
//! version: 1
//! control_dependence:
//!   granularity: instruction
//! read_write:
//!   strong_updates: false
//! sdg:
//!   entry_function: start
//! ```

use super::error::{ConfigError, ConfigResult};
use crate::features::read_write_graph::domain::AllocationFunction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Supported YAML schema versions
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

// ============================================================================
// Control Dependence
// ============================================================================

/// Node granularity of the control-dependence graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CdGranularity {
    /// One node per basic block
    #[default]
    Block,
    /// One node per instruction
    Instruction,
}

/// Control-dependence configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CdaConfig {
    /// Module-wide node granularity (default: block)
    pub granularity: CdGranularity,

    /// Add decisive-order pairs on top of the decisive dependence (default: false)
    pub order_dependence: bool,
}

impl CdaConfig {
    /// Builder: Set granularity
    pub fn granularity(mut self, v: CdGranularity) -> Self {
        self.granularity = v;
        self
    }

    /// Builder: Set order_dependence
    pub fn order_dependence(mut self, v: bool) -> Self {
        self.order_dependence = v;
        self
    }

    #[inline]
    pub fn node_per_instruction(&self) -> bool {
        self.granularity == CdGranularity::Instruction
    }
}

// ============================================================================
// Read-Write Graph
// ============================================================================

/// Read-write graph configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RwgConfig {
    /// Functions treated as dynamic allocators, keyed by name
    pub allocation_functions: BTreeMap<String, AllocationFunction>,

    /// Record a single precise stack/global target as an overwrite (default: true)
    pub strong_updates: bool,
}

impl Default for RwgConfig {
    fn default() -> Self {
        let allocation_functions = [
            ("malloc", AllocationFunction::Malloc),
            ("calloc", AllocationFunction::Calloc),
            ("alloca", AllocationFunction::Alloca),
            ("realloc", AllocationFunction::Realloc),
        ]
        .into_iter()
        .map(|(name, kind)| (name.to_string(), kind))
        .collect();

        Self {
            allocation_functions,
            strong_updates: true,
        }
    }
}

impl RwgConfig {
    /// Builder: Register an allocation function
    pub fn allocation_function(mut self, name: impl Into<String>, kind: AllocationFunction) -> Self {
        self.allocation_functions.insert(name.into(), kind);
        self
    }

    /// Builder: Set strong_updates
    pub fn strong_updates(mut self, v: bool) -> Self {
        self.strong_updates = v;
        self
    }

    pub fn allocation_kind(&self, name: &str) -> Option<AllocationFunction> {
        self.allocation_functions.get(name).copied()
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.allocation_functions.keys().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::invalid_value(
                "read_write.allocation_functions",
                "''",
                "Allocation function names must not be empty",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// System Dependence Graph
// ============================================================================

/// SDG configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SdgConfig {
    /// Name of the program entry function (default: "main")
    pub entry_function: String,

    /// Link indirect calls to every defined function the points-to oracle
    /// reports for the called pointer (default: false, indirect calls are
    /// rejected as unsupported)
    pub resolve_indirect_calls: bool,
}

impl Default for SdgConfig {
    fn default() -> Self {
        Self {
            entry_function: "main".to_string(),
            resolve_indirect_calls: false,
        }
    }
}

impl SdgConfig {
    /// Builder: Set entry_function
    pub fn entry_function(mut self, v: impl Into<String>) -> Self {
        self.entry_function = v.into();
        self
    }

    /// Builder: Set resolve_indirect_calls
    pub fn resolve_indirect_calls(mut self, v: bool) -> Self {
        self.resolve_indirect_calls = v;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.entry_function.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "sdg.entry_function",
                "''",
                "Entry function name must not be empty",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Aggregate
// ============================================================================

/// Configuration of all three graph flavors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub control_dependence: CdaConfig,
    pub read_write: RwgConfig,
    pub sdg: SdgConfig,
}

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFileV1 {
    /// Schema version (always 1 for v1)
    #[serde(default)]
    version: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    control_dependence: Option<CdaConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    read_write: Option<RwgConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    sdg: Option<SdgConfig>,
}

impl AnalysisConfig {
    /// Validate all sections
    pub fn validate(&self) -> ConfigResult<()> {
        self.read_write.validate()?;
        self.sdg.validate()?;
        Ok(())
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(content)?;

        let version = file.version.ok_or(ConfigError::MissingVersion)?;
        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(ConfigError::UnsupportedVersion {
                found: version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        let config = Self {
            control_dependence: file.control_dependence.unwrap_or_default(),
            read_write: file.read_write.unwrap_or_default(),
            sdg: file.sdg.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Export as YAML schema v1
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: Some(1),
            control_dependence: Some(self.control_dependence.clone()),
            read_write: Some(self.read_write.clone()),
            sdg: Some(self.sdg.clone()),
        };
        serde_yaml::to_string(&file).map_err(ConfigError::Yaml)
    }
}
