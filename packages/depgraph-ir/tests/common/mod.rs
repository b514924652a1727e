//! Common test utilities for depgraph-ir
//!
//! Shared program fixtures for the integration tests.

#![allow(dead_code)]

mod fixtures;

pub use fixtures::*;
