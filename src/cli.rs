//! CLI argument parsing using clap derive macros

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::graph::catalog::Catalog;
use crate::graph::render::{render, OutputFormat};
use crate::graph::resolve::resolve;
use crate::utils::terminal;

/// olm-graph - Upgrade-graph renderer for OLM index dumps
///
/// Reads delimiter-separated channel-entry rows and prints the per-package
/// upgrade graph. Bundles with invalid versions or skip-ranges are dropped
/// from the graph with a warning; nothing in the catalog aborts the run.
#[derive(Parser, Debug)]
#[command(name = "olm-graph")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Index dump to read (defaults to stdin)
    pub input: Option<PathBuf>,

    /// Restrict accumulation and output to a single package
    #[arg(short, long)]
    pub package: Option<String>,

    /// Field delimiter used in input rows
    #[arg(short, long, default_value_t = '|')]
    pub delimiter: char,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "mermaid")]
    pub format: OutputFormat,

    /// Suppress warnings about rows and bundles dropped from the graph
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Run the pipeline: accumulate rows, resolve skip-range edges, render.
    pub fn execute(self) -> Result<()> {
        if self.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }

        let reader: Box<dyn BufRead> = match &self.input {
            Some(path) => Box::new(BufReader::new(
                File::open(path)
                    .with_context(|| format!("failed to open {}", path.display()))?,
            )),
            None => Box::new(io::stdin().lock()),
        };

        let (mut catalog, mut warnings) =
            Catalog::accumulate(reader, self.delimiter, self.package.as_deref())?;
        warnings.extend(resolve(&mut catalog));

        if !self.quiet {
            for warning in &warnings {
                terminal::print_warning(&warning.to_string());
            }
        }

        let mut out = io::BufWriter::new(io::stdout().lock());
        render(&catalog, self.format, &mut out)?;
        out.flush().context("failed to write diagram")?;
        Ok(())
    }
}
