//! olm-graph CLI - render upgrade graphs from a flattened OLM index dump
//!
//! Reads delimiter-separated channel-entry rows (one bundle observation per
//! line), folds them into a per-package catalog, resolves skip-range upgrade
//! edges with semver, and prints the graph as Mermaid, Graphviz DOT, or JSON.
//!
//! ## Pipeline
//!
//! ```text
//! rows → Catalog::accumulate → resolve (skip-range edges) → render
//! ```

mod cli;
mod error;
mod graph;
mod range;
mod utils;

use anyhow::Result;
use clap::Parser;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.execute()
}
