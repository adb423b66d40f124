//! Labelled training tables.
//!
//! A dataset is a CSV file with at least an `edgelist` and a `label` column;
//! other columns are ignored. Edge lists go through the tolerant text parser,
//! so an unreadable cell becomes an empty graph. Labels must parse (ids or
//! names); a bad label fails the whole load with its row number.

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::edges::{EdgeList, parse_text};
use crate::error::ErrorCode;
use crate::label::{GraphLabel, LabelError};

pub const EDGELIST_COLUMN: &str = "edgelist";
pub const LABEL_COLUMN: &str = "label";

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("row {row}: {source}")]
    InvalidLabel {
        row: usize,
        #[source]
        source: LabelError,
    },

    #[error("{edges} edge lists but {labels} labels")]
    LengthMismatch { edges: usize, labels: usize },

    #[error("dataset has no rows")]
    Empty,
}

impl DatasetError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } | Self::Csv(_) => ErrorCode::InternalUnexpected,
            Self::MissingColumns(_) => ErrorCode::MissingColumns,
            Self::InvalidLabel { .. } | Self::LengthMismatch { .. } => ErrorCode::InvalidLabel,
            Self::Empty => ErrorCode::InsufficientData,
        }
    }
}

/// Parallel edge lists and labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    edges: Vec<EdgeList>,
    labels: Vec<GraphLabel>,
}

impl Dataset {
    /// Pair edge lists with their labels, one label per edge list.
    ///
    /// # Errors
    ///
    /// [`DatasetError::LengthMismatch`] when the two vectors differ in length.
    pub fn new(edges: Vec<EdgeList>, labels: Vec<GraphLabel>) -> Result<Self, DatasetError> {
        if edges.len() != labels.len() {
            return Err(DatasetError::LengthMismatch {
                edges: edges.len(),
                labels: labels.len(),
            });
        }
        Ok(Self { edges, labels })
    }

    /// Load a CSV dataset from disk.
    ///
    /// # Errors
    ///
    /// See [`Dataset::from_reader`]; also fails when the file cannot be
    /// opened.
    #[instrument]
    pub fn load_csv(path: &Path) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Read a CSV dataset with a header row.
    ///
    /// # Errors
    ///
    /// Fails on malformed CSV, missing required columns, an unparseable
    /// label or zero rows.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h == name);
        let (edge_col, label_col) = match (column(EDGELIST_COLUMN), column(LABEL_COLUMN)) {
            (Some(e), Some(l)) => (e, l),
            (e, l) => {
                let mut missing = Vec::new();
                if e.is_none() {
                    missing.push(EDGELIST_COLUMN.to_string());
                }
                if l.is_none() {
                    missing.push(LABEL_COLUMN.to_string());
                }
                return Err(DatasetError::MissingColumns(missing));
            }
        };

        let mut dataset = Self::default();
        for (i, record) in csv.records().enumerate() {
            let record = record?;
            let row = i + 1;
            let label = record
                .get(label_col)
                .unwrap_or_default()
                .parse::<GraphLabel>()
                .map_err(|source| DatasetError::InvalidLabel { row, source })?;
            let edges = parse_text(record.get(edge_col).unwrap_or_default());
            if edges.is_empty() {
                debug!(row, "edge list cell parsed to an empty graph");
            }
            dataset.edges.push(edges);
            dataset.labels.push(label);
        }

        if dataset.is_empty() {
            return Err(DatasetError::Empty);
        }
        debug!(rows = dataset.len(), "loaded dataset");
        Ok(dataset)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn edges(&self) -> &[EdgeList] {
        &self.edges
    }

    #[must_use]
    pub fn labels(&self) -> &[GraphLabel] {
        &self.labels
    }

    /// Rows at `indices`, in that order.
    #[must_use]
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            edges: indices.iter().map(|&i| self.edges[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Row count per label, indexed by [`GraphLabel::index`].
    #[must_use]
    pub fn label_counts(&self) -> [usize; GraphLabel::COUNT] {
        let mut counts = [0; GraphLabel::COUNT];
        for label in &self.labels {
            counts[label.index()] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_edgelist_and_label_columns() {
        let csv = "id,edgelist,label\n\
                   a,\"[(0, 1), (1, 2)]\",0\n\
                   b,\"[(0, 1), (1, 0)]\",Cyclic\n\
                   c,\"[[0, 1], [0, 2], [1, 2]]\",dag\n";
        let ds = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.labels(), &[GraphLabel::Tree, GraphLabel::Cyclic, GraphLabel::Dag]);
        assert_eq!(ds.edges()[2].len(), 3);
        assert_eq!(ds.label_counts(), [1, 1, 1]);
    }

    #[test]
    fn missing_columns_are_named() {
        let err = Dataset::from_reader("edges,label\n\"[]\",0\n".as_bytes()).unwrap_err();
        assert!(matches!(&err, DatasetError::MissingColumns(cols) if cols == &["edgelist".to_string()]));
        assert_eq!(err.code(), ErrorCode::MissingColumns);
    }

    #[test]
    fn bad_label_reports_row() {
        let csv = "edgelist,label\n\"[(0, 1)]\",0\n\"[(0, 1)]\",forest\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidLabel { row: 2, .. }));
    }

    #[test]
    fn unreadable_edges_become_empty_graphs() {
        let csv = "edgelist,label\nnonsense,1\n";
        let ds = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert!(ds.edges()[0].is_empty());
    }

    #[test]
    fn header_only_is_empty() {
        let err = Dataset::from_reader("edgelist,label\n".as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::Empty));
    }

    #[test]
    fn new_pairs_rows() {
        let ds = Dataset::new(vec![EdgeList::from_pairs([(0, 1)])], vec![GraphLabel::Tree]).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn new_rejects_unpaired_rows() {
        let err = Dataset::new(vec![EdgeList::new(), EdgeList::new()], vec![GraphLabel::Tree])
            .unwrap_err();
        assert!(matches!(err, DatasetError::LengthMismatch { edges: 2, labels: 1 }));
        assert_eq!(err.code(), ErrorCode::InvalidLabel);
    }

    #[test]
    fn subset_picks_rows() {
        let csv = "edgelist,label\n\"[(0, 1)]\",0\n\"[(1, 2)]\",1\n\"[(2, 3)]\",2\n";
        let ds = Dataset::from_reader(csv.as_bytes()).unwrap();
        let sub = ds.subset(&[2, 0]);
        assert_eq!(sub.labels(), &[GraphLabel::Dag, GraphLabel::Tree]);
    }
}
