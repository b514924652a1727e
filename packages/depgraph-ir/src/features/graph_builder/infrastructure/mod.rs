//! Graph builder infrastructure

pub mod builder;

pub use builder::GraphBuilder;
