//! Feature names and the explicit ordering contract.
//!
//! A [`FeatureSchema`] fixes which features a vector carries and in what
//! order. It is built once (normally [`FeatureSchema::canonical`], i.e. all
//! features sorted by name), persisted with the fitted extractor, and used
//! for every later extraction. A model trained on one schema must only ever
//! see vectors in that schema's order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Every structural feature the extractor computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    NumNodes,
    NumEdges,
    Density,
    AvgInDegree,
    MaxInDegree,
    StdInDegree,
    AvgOutDegree,
    MaxOutDegree,
    StdOutDegree,
    IsWeaklyConnected,
    NumWeaklyConnectedComponents,
    IsStronglyConnected,
    NumStronglyConnectedComponents,
    HasCycle,
    IsTree,
    IsForest,
    IsDag,
    NumTopoLevels,
    MaxTopoLevelSize,
    AvgClustering,
    HasSelfLoops,
    Reciprocity,
}

impl Feature {
    pub const COUNT: usize = 22;

    /// All features in declaration order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::NumNodes,
        Self::NumEdges,
        Self::Density,
        Self::AvgInDegree,
        Self::MaxInDegree,
        Self::StdInDegree,
        Self::AvgOutDegree,
        Self::MaxOutDegree,
        Self::StdOutDegree,
        Self::IsWeaklyConnected,
        Self::NumWeaklyConnectedComponents,
        Self::IsStronglyConnected,
        Self::NumStronglyConnectedComponents,
        Self::HasCycle,
        Self::IsTree,
        Self::IsForest,
        Self::IsDag,
        Self::NumTopoLevels,
        Self::MaxTopoLevelSize,
        Self::AvgClustering,
        Self::HasSelfLoops,
        Self::Reciprocity,
    ];

    /// Stable wire name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NumNodes => "num_nodes",
            Self::NumEdges => "num_edges",
            Self::Density => "density",
            Self::AvgInDegree => "avg_in_degree",
            Self::MaxInDegree => "max_in_degree",
            Self::StdInDegree => "std_in_degree",
            Self::AvgOutDegree => "avg_out_degree",
            Self::MaxOutDegree => "max_out_degree",
            Self::StdOutDegree => "std_out_degree",
            Self::IsWeaklyConnected => "is_weakly_connected",
            Self::NumWeaklyConnectedComponents => "num_weakly_connected_components",
            Self::IsStronglyConnected => "is_strongly_connected",
            Self::NumStronglyConnectedComponents => "num_strongly_connected_components",
            Self::HasCycle => "has_cycle",
            Self::IsTree => "is_tree",
            Self::IsForest => "is_forest",
            Self::IsDag => "is_dag",
            Self::NumTopoLevels => "num_topo_levels",
            Self::MaxTopoLevelSize => "max_topo_level_size",
            Self::AvgClustering => "avg_clustering",
            Self::HasSelfLoops => "has_self_loops",
            Self::Reciprocity => "reciprocity",
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.name() == s)
            .ok_or_else(|| SchemaError::UnknownFeature(s.to_string()))
    }
}

/// Problems with a persisted or hand-built schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("unknown feature name: {0}")]
    UnknownFeature(String),

    #[error("feature listed twice: {0}")]
    Duplicate(String),

    #[error("schema is empty")]
    Empty,
}

impl SchemaError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::SchemaMismatch
    }
}

/// Ordered list of features a vector carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureSchema {
    features: Vec<Feature>,
}

impl FeatureSchema {
    /// Every feature, sorted lexicographically by name.
    #[must_use]
    pub fn canonical() -> Self {
        let mut features = Feature::ALL.to_vec();
        features.sort_unstable_by_key(|f| f.name());
        Self { features }
    }

    /// Build a schema from an explicit ordering.
    ///
    /// # Errors
    ///
    /// Fails on an empty list or a repeated feature.
    pub fn from_features(features: Vec<Feature>) -> Result<Self, SchemaError> {
        if features.is_empty() {
            return Err(SchemaError::Empty);
        }
        let mut seen = [false; Feature::COUNT];
        for feature in &features {
            if std::mem::replace(&mut seen[feature.index()], true) {
                return Err(SchemaError::Duplicate(feature.name().to_string()));
            }
        }
        Ok(Self { features })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> impl Iterator<Item = Feature> + '_ {
        self.features.iter().copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.features.iter().map(|f| f.name())
    }

    /// Position of `feature` in this schema.
    #[must_use]
    pub fn position(&self, feature: Feature) -> Option<usize> {
        self.features.iter().position(|&f| f == feature)
    }

    /// BLAKE3 digest of the ordered names; equal digests mean equal order.
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for name in self.names() {
            hasher.update(name.as_bytes());
            hasher.update(b"\x00");
        }
        format!("blake3:{}", hasher.finalize())
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::canonical()
    }
}

impl TryFrom<Vec<String>> for FeatureSchema {
    type Error = SchemaError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        let features = names
            .iter()
            .map(|name| name.parse::<Feature>())
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_features(features)
    }
}

impl From<FeatureSchema> for Vec<String> {
    fn from(schema: FeatureSchema) -> Self {
        schema.names().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_indices_match_declaration() {
        for (i, feature) in Feature::ALL.into_iter().enumerate() {
            assert_eq!(feature.index(), i);
        }
    }

    #[test]
    fn canonical_schema_is_sorted_and_complete() {
        let schema = FeatureSchema::canonical();
        let names: Vec<&str> = schema.names().collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), Feature::COUNT);
        assert_eq!(names.first(), Some(&"avg_clustering"));
        assert_eq!(names.last(), Some(&"std_out_degree"));
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for feature in Feature::ALL {
            assert_eq!(feature.name().parse::<Feature>(), Ok(feature));
        }
        assert!("num_vertices".parse::<Feature>().is_err());
    }

    #[test]
    fn schema_rejects_duplicates_and_unknowns() {
        let dup = vec!["density".to_string(), "density".to_string()];
        assert_eq!(
            FeatureSchema::try_from(dup),
            Err(SchemaError::Duplicate("density".to_string()))
        );
        let unknown = vec!["girth".to_string()];
        assert!(matches!(
            FeatureSchema::try_from(unknown),
            Err(SchemaError::UnknownFeature(_))
        ));
        assert_eq!(FeatureSchema::from_features(vec![]), Err(SchemaError::Empty));
    }

    #[test]
    fn schema_serializes_as_name_list() {
        let schema = FeatureSchema::from_features(vec![Feature::NumNodes, Feature::IsDag]).unwrap();
        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(json, r#"["num_nodes","is_dag"]"#);
        let back: FeatureSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn digest_depends_on_order() {
        let a = FeatureSchema::from_features(vec![Feature::NumNodes, Feature::IsDag]).unwrap();
        let b = FeatureSchema::from_features(vec![Feature::IsDag, Feature::NumNodes]).unwrap();
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.digest(), a.clone().digest());
    }
}
