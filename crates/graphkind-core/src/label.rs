//! The closed set of structural classes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Structural class of a graph. The discriminant is the wire class id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum GraphLabel {
    Tree = 0,
    Cyclic = 1,
    Dag = 2,
}

impl GraphLabel {
    pub const COUNT: usize = 3;
    pub const ALL: [Self; Self::COUNT] = [Self::Tree, Self::Cyclic, Self::Dag];

    /// Integer class id used in datasets and responses.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Tree),
            1 => Some(Self::Cyclic),
            2 => Some(Self::Dag),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tree => "Tree",
            Self::Cyclic => "Cyclic",
            Self::Dag => "DAG",
        }
    }
}

impl fmt::Display for GraphLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A label that is neither a known id nor a known name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown graph label {0:?}; expected 0/1/2 or Tree/Cyclic/DAG")]
pub struct LabelError(pub String);

impl LabelError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidLabel
    }
}

impl TryFrom<u8> for GraphLabel {
    type Error = LabelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_index(usize::from(value)).ok_or_else(|| LabelError(value.to_string()))
    }
}

impl From<GraphLabel> for u8 {
    fn from(label: GraphLabel) -> Self {
        label.id()
    }
}

impl FromStr for GraphLabel {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(id) = trimmed.parse::<u8>() {
            return Self::try_from(id);
        }
        Self::ALL
            .into_iter()
            .find(|label| label.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| LabelError(s.to_string()))
    }
}
