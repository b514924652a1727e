//! System dependence graph infrastructure
//!
//! - `sdg_builder`: SdgBuilder (GraphFlavor)

pub mod sdg_builder;

pub use sdg_builder::SdgBuilder;
