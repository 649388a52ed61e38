//! Upgrade-graph assembly
//!
//! Accumulation of index rows into a catalog, skip-range edge resolution,
//! and diagram rendering.

pub mod catalog;
pub mod render;
pub mod resolve;
