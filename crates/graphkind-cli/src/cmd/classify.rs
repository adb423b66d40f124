//! `gk classify`: run one edge list through a saved model.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use graphkind_core::artifact::{ArtifactError, ArtifactStore};
use graphkind_core::config::{CONFIG_FILE, load_config};
use graphkind_core::edges::EdgeFormatError;
use graphkind_core::service::{ClassifyError, validate_edges};
use graphkind_core::{
    ClassificationService, ClassifyRequest, ClassifyResponse, ErrorResponse, GraphLabel,
};
use serde_json::Value;
use tracing::debug;

use super::read_source;
use crate::output::{OutputMode, kv, render, render_error};

#[derive(Args, Debug)]
#[command(group(clap::ArgGroup::new("input").required(true).args(["edges", "file"])))]
pub struct ClassifyArgs {
    /// Edge list as JSON, e.g. `[[0, 1], [1, 2]]`, or a `{"edges": ...}` body.
    #[arg(long)]
    pub edges: Option<String>,

    /// Read the JSON edge list or request body from a file.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Artifact directory (defaults to `artifacts.dir` from the config).
    #[arg(long)]
    pub artifacts: Option<PathBuf>,

    /// Configuration file. A missing file means defaults.
    #[arg(long, default_value = CONFIG_FILE)]
    pub config: PathBuf,
}

/// Decode command-line JSON into a request. A bare array is the edge list.
fn parse_request(text: &str) -> Result<ClassifyRequest, ClassifyError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| ClassifyError::InvalidEdge(EdgeFormatError::Literal(err.to_string())))?;
    match value {
        Value::Object(_) => serde_json::from_value(value)
            .map_err(|err| ClassifyError::InvalidEdge(EdgeFormatError::Literal(err.to_string()))),
        other => Ok(ClassifyRequest::new(other)),
    }
}

fn artifact_response(err: &ArtifactError) -> ErrorResponse {
    let code = err.code();
    ErrorResponse {
        error: err.to_string(),
        code: code.code(),
        status: code.http_status(),
        hint: err.hint(),
    }
}

fn classify(args: &ClassifyArgs, text: &str) -> Result<Result<ClassifyResponse, ErrorResponse>> {
    let request = match parse_request(text) {
        Ok(request) => request,
        Err(err) => return Ok(Err(err.to_response())),
    };
    // Malformed input is reported before any artifact is touched.
    if let Err(err) = validate_edges(&request.edges) {
        return Ok(Err(err.to_response()));
    }

    let config = load_config(&args.config)?;
    let dir = args.artifacts.clone().unwrap_or(config.artifacts.dir);
    let service = match ClassificationService::from_store(&ArtifactStore::new(&dir)) {
        Ok(service) => service,
        Err(err) => return Ok(Err(artifact_response(&err))),
    };
    debug!(dir = %dir.display(), "loaded artifacts");

    Ok(service.classify(&request).map_err(|err| err.to_response()))
}

/// Execute `gk classify`.
///
/// # Errors
///
/// Prints the error object and fails when the request is rejected or no
/// usable model is available.
pub fn run_classify(args: &ClassifyArgs, output: OutputMode) -> Result<()> {
    let text = read_source(args.edges.as_deref(), args.file.as_deref())?;
    match classify(args, &text)? {
        Ok(response) => render(output, &response, render_human),
        Err(error) => {
            render_error(output, &error)?;
            anyhow::bail!("{}: {}", error.code, error.error)
        }
    }
}

fn render_human(r: &ClassifyResponse, w: &mut dyn Write) -> std::io::Result<()> {
    let label = r.label().map_or("unknown", GraphLabel::name);
    kv(w, "prediction", format!("{label} ({})", r.prediction))?;
    kv(w, "confidence", format!("{:.4}", r.confidence))?;
    writeln!(w, "features:")?;
    for (name, value) in r.features.iter() {
        writeln!(w, "  {name:<34} {value}")?;
    }
    Ok(())
}
