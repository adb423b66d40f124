//! Edge-list ingestion.
//!
//! # Overview
//!
//! Edge lists arrive in three shapes:
//!
//! 1. **Structured**: an already-decoded sequence of `[source, target]`
//!    pairs (JSON arrays from a request body, for instance).
//! 2. **Literal text**: a code-literal rendering of such a sequence,
//!    e.g. `"[(0, 1), (1, 2)]"` or `"[[0, 1], [1, 2]]"`.
//! 3. **Loose text**: parenthesized comma pairs with missing or damaged
//!    brackets, e.g. `"(0, 1), (1, 2"`.
//!
//! [`parse_edge_list`] accepts all three and never fails: malformed input
//! degenerates to an empty [`EdgeList`] after a logged warning. The loose
//! text path silently drops groups that do not parse as integer pairs.
//!
//! [`parse_structured`] is the strict entry point for structured input and
//! rejects any element that is not exactly a two-element sequence.

pub mod literal;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ErrorCode;

// ---------------------------------------------------------------------------
// Identifiers and edges
// ---------------------------------------------------------------------------

/// Opaque node identifier.
///
/// Integers and strings share one canonical textual form, so `1` and `"1"`
/// name the same node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

macro_rules! node_id_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for NodeId {
            fn from(value: $t) -> Self {
                Self(value.to_string())
            }
        })*
    };
}

node_id_from_int!(i32, i64, u32, u64, usize);

/// A directed `(source, target)` pair. Self-loops are allowed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Ordered sequence of edges, in insertion order. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeList(Vec<Edge>);

impl EdgeList {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Build an edge list from anything yielding `(source, target)` pairs.
    pub fn from_pairs<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<NodeId>,
        B: Into<NodeId>,
    {
        Self(pairs.into_iter().map(|(a, b)| Edge::new(a, b)).collect())
    }

    pub fn push(&mut self, edge: Edge) {
        self.0.push(edge);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Edge> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Edge] {
        &self.0
    }
}

impl FromIterator<Edge> for EdgeList {
    fn from_iter<T: IntoIterator<Item = Edge>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a EdgeList {
    type Item = &'a Edge;
    type IntoIter = std::slice::Iter<'a, Edge>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ---------------------------------------------------------------------------
// Input shapes and errors
// ---------------------------------------------------------------------------

/// Raw edge-list input before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeInput {
    /// Decoded sequence whose elements should each be a two-element pair.
    Structured(Vec<Value>),
    /// Textual rendering (literal or loose).
    Text(String),
    /// Anything else; always parses to an empty edge list.
    Other,
}

impl From<Value> for EdgeInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Structured(items),
            Value::String(text) => Self::Text(text),
            _ => Self::Other,
        }
    }
}

impl From<&str> for EdgeInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for EdgeInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Reasons an edge list is rejected by the strict parsers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EdgeFormatError {
    /// An element is a sequence of the wrong length.
    #[error("edge {index} has {len} elements, expected [source, target]")]
    NotAPair { index: usize, len: usize },

    /// An element is not a sequence at all.
    #[error("edge {index} is not a [source, target] sequence")]
    NotASequence { index: usize },

    /// An endpoint cannot be used as a node identifier.
    #[error("edge {index} has an endpoint that is not a string or number")]
    InvalidEndpoint { index: usize },

    /// The text is not a well-formed literal.
    #[error("invalid edge literal: {0}")]
    Literal(String),
}

impl EdgeFormatError {
    /// Machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidEdgeFormat
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Normalize any [`EdgeInput`] into an [`EdgeList`].
///
/// Never fails: any error is logged and produces an empty list, so a
/// malformed input behaves like an empty graph.
#[must_use]
pub fn parse_edge_list(input: &EdgeInput) -> EdgeList {
    match input {
        EdgeInput::Structured(items) => parse_structured(items).unwrap_or_else(|err| {
            warn!(error = %err, "could not parse structured edge list");
            EdgeList::new()
        }),
        EdgeInput::Text(text) => parse_text(text),
        EdgeInput::Other => EdgeList::new(),
    }
}

/// Strictly convert decoded `[source, target]` pairs into an [`EdgeList`].
///
/// # Errors
///
/// Returns [`EdgeFormatError`] for the first element that is not a
/// two-element sequence of scalar endpoints.
pub fn parse_structured(items: &[Value]) -> Result<EdgeList, EdgeFormatError> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let Value::Array(pair) = item else {
                return Err(EdgeFormatError::NotASequence { index });
            };
            let [source, target] = pair.as_slice() else {
                return Err(EdgeFormatError::NotAPair {
                    index,
                    len: pair.len(),
                });
            };
            Ok(Edge::new(
                endpoint(source).ok_or(EdgeFormatError::InvalidEndpoint { index })?,
                endpoint(target).ok_or(EdgeFormatError::InvalidEndpoint { index })?,
            ))
        })
        .collect()
}

fn endpoint(value: &Value) -> Option<NodeId> {
    match value {
        Value::String(s) => Some(NodeId::from(s.as_str())),
        Value::Number(n) => Some(NodeId::from(n.to_string())),
        Value::Bool(b) => Some(NodeId::from(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Parse text as a literal, falling back to the loose pair syntax.
///
/// Only text that is not a well-formed literal takes the loose path. A
/// well-formed literal of the wrong shape, such as `[0, 1]`, is a format
/// error and yields an empty list.
#[must_use]
pub fn parse_text(text: &str) -> EdgeList {
    let parsed = match literal::parse(text) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(error = %err, "strict literal parse failed; trying loose pair syntax");
            return parse_loose(text);
        }
    };
    literal::into_edges(parsed).unwrap_or_else(|err| {
        warn!(error = %err, "literal is not a sequence of pairs");
        EdgeList::new()
    })
}

static GROUP_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\),\s*\(").expect("group separator pattern is valid"));

/// Recover `(a, b)` integer groups from loosely formatted text.
///
/// Groups that are not exactly two integers are dropped.
#[must_use]
pub fn parse_loose(text: &str) -> EdgeList {
    let body = text.trim().trim_matches(|c| c == '[' || c == ']');
    if body.trim().is_empty() {
        return EdgeList::new();
    }

    let mut edges = EdgeList::new();
    for group in GROUP_SEPARATOR.split(body) {
        let group = group.trim().trim_matches(|c| c == '(' || c == ')');
        if group.is_empty() {
            continue;
        }
        let parts: Vec<&str> = group.split(',').map(str::trim).collect();
        let [a, b] = parts.as_slice() else {
            debug!(group, "dropping edge group without exactly two parts");
            continue;
        };
        match (a.parse::<i64>(), b.parse::<i64>()) {
            (Ok(source), Ok(target)) => edges.push(Edge::new(source, target)),
            _ => debug!(group, "dropping non-integer edge group"),
        }
    }
    edges
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
