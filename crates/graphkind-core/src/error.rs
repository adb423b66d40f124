use std::fmt;

/// Machine-readable error codes shared by the library, the CLI and the
/// classification wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    EmptyEdgeList,
    InvalidEdgeFormat,
    MissingColumns,
    InvalidLabel,
    ConfigParseError,
    NotFitted,
    ModelNotFound,
    ArtifactMismatch,
    SchemaMismatch,
    NoModelTrained,
    InsufficientData,
    ArtifactWriteFailed,
    LockContention,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::EmptyEdgeList => "E1001",
            Self::InvalidEdgeFormat => "E1002",
            Self::MissingColumns => "E1003",
            Self::InvalidLabel => "E1004",
            Self::ConfigParseError => "E1005",
            Self::NotFitted => "E2001",
            Self::ModelNotFound => "E2002",
            Self::ArtifactMismatch => "E2003",
            Self::SchemaMismatch => "E2004",
            Self::NoModelTrained => "E3001",
            Self::InsufficientData => "E3002",
            Self::ArtifactWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::EmptyEdgeList => "No edges provided",
            Self::InvalidEdgeFormat => "Invalid edge format",
            Self::MissingColumns => "Required dataset columns missing",
            Self::InvalidLabel => "Unknown graph label",
            Self::ConfigParseError => "Config file parse error",
            Self::NotFitted => "Feature extractor not fitted",
            Self::ModelNotFound => "Model artifact not found",
            Self::ArtifactMismatch => "Classifier and extractor artifacts do not match",
            Self::SchemaMismatch => "Feature schema mismatch",
            Self::NoModelTrained => "No model was successfully trained",
            Self::InsufficientData => "Not enough training data",
            Self::ArtifactWriteFailed => "Artifact write failed",
            Self::LockContention => "Lock contention",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::EmptyEdgeList => Some("Send at least one [source, target] pair."),
            Self::InvalidEdgeFormat => Some("Expected [source, target] pairs."),
            Self::MissingColumns => Some("Datasets need `edgelist` and `label` columns."),
            Self::InvalidLabel => Some("Use 0/1/2 or Tree/Cyclic/DAG."),
            Self::ConfigParseError => Some("Fix syntax in graphkind.toml and retry."),
            Self::NotFitted | Self::ModelNotFound => {
                Some("Run `gk train` to produce a classifier and extractor.")
            }
            Self::ArtifactMismatch | Self::SchemaMismatch => {
                Some("Retrain so both artifacts come from the same run.")
            }
            Self::NoModelTrained => Some("Check the training data and model grid settings."),
            Self::InsufficientData => Some("Provide more labelled rows for every class."),
            Self::ArtifactWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other training run finishes."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }

    /// HTTP status class this code maps onto when served over a network.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::EmptyEdgeList
            | Self::InvalidEdgeFormat
            | Self::MissingColumns
            | Self::InvalidLabel
            | Self::ConfigParseError => 400,
            Self::NotFitted
            | Self::ModelNotFound
            | Self::ArtifactMismatch
            | Self::SchemaMismatch => 503,
            Self::NoModelTrained
            | Self::InsufficientData
            | Self::ArtifactWriteFailed
            | Self::LockContention
            | Self::InternalUnexpected => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use std::collections::HashSet;

    const ALL: [ErrorCode; 14] = [
        ErrorCode::EmptyEdgeList,
        ErrorCode::InvalidEdgeFormat,
        ErrorCode::MissingColumns,
        ErrorCode::InvalidLabel,
        ErrorCode::ConfigParseError,
        ErrorCode::NotFitted,
        ErrorCode::ModelNotFound,
        ErrorCode::ArtifactMismatch,
        ErrorCode::SchemaMismatch,
        ErrorCode::NoModelTrained,
        ErrorCode::InsufficientData,
        ErrorCode::ArtifactWriteFailed,
        ErrorCode::LockContention,
        ErrorCode::InternalUnexpected,
    ];

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::InvalidEdgeFormat.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn input_errors_are_bad_requests() {
        assert_eq!(ErrorCode::EmptyEdgeList.http_status(), 400);
        assert_eq!(ErrorCode::InvalidEdgeFormat.http_status(), 400);
        assert_eq!(ErrorCode::NotFitted.http_status(), 503);
        assert_eq!(ErrorCode::InternalUnexpected.http_status(), 500);
    }
}
