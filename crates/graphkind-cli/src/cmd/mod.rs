pub mod classify;
pub mod features;
pub mod train;

use std::fmt::Display;
use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use graphkind_core::ErrorCode;

/// Prefix a library error with its stable code.
pub fn coded(code: ErrorCode, err: impl Display) -> anyhow::Error {
    anyhow::anyhow!("{}: {err}", code.code())
}

/// Inline text when given, otherwise the contents of `file`.
///
/// Clap's argument group guarantees exactly one is present.
pub fn read_source(inline: Option<&str>, file: Option<&Path>) -> Result<String> {
    match (inline, file) {
        (Some(text), _) => Ok(text.to_string()),
        (None, Some(path)) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        (None, None) => anyhow::bail!("either --edges or --file is required"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_wins_over_file() {
        let text = read_source(Some("[[0, 1]]"), Some(Path::new("/nonexistent"))).unwrap();
        assert_eq!(text, "[[0, 1]]");
    }

    #[test]
    fn reads_file_when_no_inline_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edges.json");
        fs::write(&path, "[[1, 2]]").unwrap();
        assert_eq!(read_source(None, Some(path.as_path())).unwrap(), "[[1, 2]]");
    }

    #[test]
    fn coded_errors_carry_the_code() {
        let err = coded(ErrorCode::MissingColumns, "missing required column(s): label");
        assert_eq!(err.to_string(), "E1003: missing required column(s): label");
    }
}
