//! `gk features`: print the raw structural features of an edge list.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use graphkind_core::{EdgeInput, FeatureMap, GraphFeatureExtractor, parse_edge_list};
use serde::Serialize;

use super::read_source;
use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("input").required(true).args(["edges", "file"])))]
pub struct FeaturesArgs {
    /// Edge list text: a literal like `[(0, 1), (1, 2)]`, nested JSON-style
    /// pairs, or loose `(a, b), (c, d)` groups.
    #[arg(long)]
    pub edges: Option<String>,

    /// Read the edge list text from a file.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct FeaturesOutput {
    /// Edges recovered by the parser; zero when the text was unusable.
    pub edges: usize,
    pub features: FeatureMap,
}

/// Execute `gk features`.
///
/// Unparseable text is not an error: it yields the empty-graph features.
///
/// # Errors
///
/// Fails only when `--file` cannot be read.
pub fn run_features(args: &FeaturesArgs, output: OutputMode) -> Result<()> {
    let text = read_source(args.edges.as_deref(), args.file.as_deref())?;
    let edges = parse_edge_list(&EdgeInput::from(text.trim()));
    let extractor = GraphFeatureExtractor::new();
    let payload = FeaturesOutput {
        edges: edges.len(),
        features: extractor.feature_map(&edges),
    };
    render(output, &payload, render_human)
}

fn render_human(p: &FeaturesOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if p.edges == 0 {
        writeln!(w, "no usable edges; showing empty-graph features")?;
    }
    for (name, value) in p.features.iter() {
        writeln!(w, "{name:<34} {value}")?;
    }
    Ok(())
}
