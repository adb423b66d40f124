//! Shared output layer: human text or stable JSON.
//!
//! Results go to stdout. Errors in JSON mode go to stdout as the wire error
//! object so callers can parse either outcome; in human mode they go to
//! stderr.

use graphkind_core::ErrorResponse;
use serde::Serialize;
use std::io::{self, Write};

/// Shared width for human separators.
pub const RULE_WIDTH: usize = 60;

/// Write a section heading followed by a separator.
pub fn section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    writeln!(w, "{:-<width$}", "", width = RULE_WIDTH)
}

/// Render a left-aligned key/value line in human output.
pub fn kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

/// Output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Render a serializable value to stdout in the requested format.
///
/// In JSON mode the value is serialized with `serde_json`; otherwise
/// `human_fn` writes the text form.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Human => human_fn(value, &mut out)?,
    }
    Ok(())
}

/// Render an error object in the requested format.
pub fn render_error(mode: OutputMode, error: &ErrorResponse) -> anyhow::Result<()> {
    if mode.is_json() {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        serde_json::to_writer_pretty(&mut out, error)?;
        writeln!(out)?;
    } else {
        let stderr = io::stderr();
        let mut out = stderr.lock();
        writeln!(out, "error[{}]: {}", error.code, error.error)?;
        if let Some(hint) = error.hint {
            writeln!(out, "  hint: {hint}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_pads_key_column() {
        let mut buf = Vec::new();
        kv(&mut buf, "family", "knn").unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "family:        knn\n");
    }

    #[test]
    fn section_underlines_heading() {
        let mut buf = Vec::new();
        section(&mut buf, "Report").unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Report");
        assert_eq!(lines[1].len(), RULE_WIDTH);
    }

    #[test]
    fn json_mode_flag() {
        assert!(OutputMode::Json.is_json());
        assert!(!OutputMode::Human.is_json());
    }
}
