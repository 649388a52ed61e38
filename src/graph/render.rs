//! Diagram rendering
//!
//! Walks the resolved catalog in sorted order and writes a Mermaid
//! flowchart (default), a Graphviz DOT graph, or a JSON view to an injected
//! sink. Sorted iteration everywhere is a correctness requirement: output
//! must be byte-identical across runs on the same input.

use std::io::Write;

use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;

use crate::graph::catalog::{Bundle, Catalog, Package, PLACEHOLDER_VERSION};

/// Output format for the rendered graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Mermaid flowchart (default)
    #[default]
    Mermaid,
    /// Graphviz DOT
    Dot,
    /// JSON view of the resolved catalog
    Json,
}

/// Render the catalog to the sink in the requested format.
pub fn render<W: Write>(catalog: &Catalog, format: OutputFormat, out: &mut W) -> Result<()> {
    match format {
        OutputFormat::Mermaid => render_mermaid(catalog, out),
        OutputFormat::Dot => render_dot(catalog, out),
        OutputFormat::Json => render_json(catalog, out),
    }
}

// ============================================================================
// Mermaid
// ============================================================================

fn render_mermaid<W: Write>(catalog: &Catalog, out: &mut W) -> Result<()> {
    writeln!(out, "flowchart LR")?;
    writeln!(out, "  classDef head fill:#ffbfcf;")?;
    writeln!(out, "  classDef installed fill:#34ebba;")?;

    for package in catalog.packages() {
        writeln!(out, "  subgraph {}", package.name)?;
        for channel in package.channels() {
            writeln!(out, "    subgraph {} channel", channel)?;
            for bundle in package.bundles().filter(|b| b.channels.contains(channel)) {
                let source = format!(
                    "{}{}",
                    mermaid_node(package, channel, &bundle.name),
                    style_class(bundle)
                );
                if !bundle.has_edges() {
                    writeln!(out, "      {}", source)?;
                    continue;
                }
                for target in &bundle.replaces {
                    writeln!(
                        out,
                        "      {} --> {}",
                        source,
                        mermaid_node(package, channel, target)
                    )?;
                }
                for target in &bundle.skip_range_replaces {
                    // An edge that is also explicit is rendered once, above
                    if bundle.replaces.contains(target) {
                        continue;
                    }
                    writeln!(
                        out,
                        "      {} -. \"{}\" .-> {}",
                        source,
                        bundle.skip_range,
                        mermaid_node(package, channel, target)
                    )?;
                }
            }
            writeln!(out, "    end")?;
        }
        writeln!(out, "  end")?;
    }

    Ok(())
}

/// Mermaid node: id embeds the channel so the same bundle in two channels
/// becomes two diagram nodes; the label is the version. Targets referenced
/// but never defined get the placeholder version.
fn mermaid_node(package: &Package, channel: &str, bundle_name: &str) -> String {
    let version = package
        .get(bundle_name)
        .map(|b| b.version.as_str())
        .unwrap_or(PLACEHOLDER_VERSION);
    format!("{}_{}({})", sanitize(channel), sanitize(bundle_name), version)
}

fn style_class(bundle: &Bundle) -> &'static str {
    if bundle.is_head() {
        ":::head"
    } else if bundle.present {
        ":::installed"
    } else {
        ""
    }
}

/// Mermaid and DOT identifiers tolerate little punctuation; bundle names
/// like "etcdoperator.v0.9.2" do not. Labels keep the original text.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

// ============================================================================
// Graphviz DOT
// ============================================================================

fn render_dot<W: Write>(catalog: &Catalog, out: &mut W) -> Result<()> {
    writeln!(out, "digraph upgrades {{")?;
    writeln!(out, "  rankdir=LR;")?;
    writeln!(out, "  node [shape=record, fontname=\"Helvetica\"];")?;
    writeln!(out, "  edge [fontname=\"Helvetica\", fontsize=10];")?;

    for package in catalog.packages() {
        writeln!(out, "  subgraph cluster_{} {{", sanitize(&package.name))?;
        writeln!(out, "    label=\"package: {}\";", package.name)?;

        for bundle in package.bundles() {
            let channels: Vec<&str> = bundle.channels.iter().map(String::as_str).collect();
            let label = format!("{{{}|{{channels|{{{}}}}}}}", bundle.name, channels.join("|"));
            let mut attrs = vec![format!("label=\"{}\"", label)];
            if !bundle.present {
                attrs.push("style=dashed".to_string());
            }
            if bundle.is_head() {
                attrs.push("penwidth=4".to_string());
            }
            writeln!(
                out,
                "    \"{}\" [{}];",
                dot_node_id(package, &bundle.name),
                attrs.join(", ")
            )?;
        }

        for bundle in package.bundles() {
            let source = dot_node_id(package, &bundle.name);
            for target in &bundle.replaces {
                writeln!(out, "    \"{}\" -> \"{}\";", source, dot_node_id(package, target))?;
            }
            for target in &bundle.skip_range_replaces {
                if bundle.replaces.contains(target) {
                    continue;
                }
                writeln!(
                    out,
                    "    \"{}\" -> \"{}\" [style=dashed, label=\"{}\"];",
                    source,
                    dot_node_id(package, target),
                    bundle.skip_range
                )?;
            }
        }

        writeln!(out, "  }}")?;
    }

    writeln!(out, "}}")?;
    Ok(())
}

fn dot_node_id(package: &Package, bundle_name: &str) -> String {
    format!("{}_{}", sanitize(&package.name), sanitize(bundle_name))
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Serialize, Debug)]
struct CatalogJson<'a> {
    packages: Vec<PackageJson<'a>>,
}

#[derive(Serialize, Debug)]
struct PackageJson<'a> {
    name: &'a str,
    bundles: Vec<BundleJson<'a>>,
}

#[derive(Serialize, Debug)]
struct BundleJson<'a> {
    name: &'a str,
    version: &'a str,
    present: bool,
    min_depth: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    skip_range: Option<&'a str>,
    channels: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    replaces: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skip_range_replaces: Vec<&'a str>,
}

fn render_json<W: Write>(catalog: &Catalog, out: &mut W) -> Result<()> {
    let view = CatalogJson {
        packages: catalog
            .packages()
            .map(|package| PackageJson {
                name: &package.name,
                bundles: package
                    .bundles()
                    .map(|bundle| BundleJson {
                        name: &bundle.name,
                        version: &bundle.version,
                        present: bundle.present,
                        min_depth: bundle.min_depth,
                        skip_range: if bundle.skip_range.is_empty() {
                            None
                        } else {
                            Some(&bundle.skip_range)
                        },
                        channels: bundle.channels.iter().map(String::as_str).collect(),
                        replaces: bundle.replaces.iter().map(String::as_str).collect(),
                        skip_range_replaces: bundle
                            .skip_range_replaces
                            .iter()
                            .map(String::as_str)
                            .collect(),
                    })
                    .collect(),
            })
            .collect(),
    };

    serde_json::to_writer_pretty(&mut *out, &view)?;
    writeln!(out)?;
    Ok(())
}
