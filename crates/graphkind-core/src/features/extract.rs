//! Structural feature extraction.
//!
//! [`GraphFeatures::compute`] is a pure function of the edge set: edge order
//! and repeated edges do not change any value. Every measurement that is
//! undefined on a degenerate graph has a fixed fallback, so extraction never
//! fails for a syntactically valid edge list:
//!
//! | measurement                    | fallback                         |
//! |--------------------------------|----------------------------------|
//! | weak / strong connectivity     | flag 0, component count 0        |
//! | tree / forest (null graph)     | 0                                |
//! | topological generations        | 0, 0 when cyclic or empty        |
//! | average clustering (null graph)| 0                                |
//! | reciprocity (no arcs)          | 0                                |
//!
//! `has_cycle` and `is_dag` come from one acyclicity check and always
//! disagree with each other.

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{instrument, trace};

use crate::edges::{EdgeInput, EdgeList, parse_edge_list};
use crate::features::schema::{Feature, FeatureSchema};
use crate::graph::{GraphViews, clustering, connectivity, stats, topology};
use crate::normalize::{FeatureMatrix, FeatureNormalizer, NormalizerError};

// ---------------------------------------------------------------------------
// GraphFeatures
// ---------------------------------------------------------------------------

/// Raw value of every [`Feature`] for one graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphFeatures {
    values: [f64; Feature::COUNT],
}

impl GraphFeatures {
    /// Compute every feature for `edges`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(edges: &EdgeList) -> Self {
        let views = GraphViews::from_edges(edges);
        let directed = &views.directed;
        let undirected = &views.undirected;
        let mut out = Self {
            values: [0.0; Feature::COUNT],
        };

        out.set(Feature::NumNodes, views.node_count() as f64);
        out.set(Feature::NumEdges, views.arc_count() as f64);
        out.set(Feature::Density, stats::density(directed));

        let (ins, outs) = stats::degree_summaries(directed);
        out.set(Feature::AvgInDegree, ins.mean);
        out.set(Feature::MaxInDegree, ins.max);
        out.set(Feature::StdInDegree, ins.std);
        out.set(Feature::AvgOutDegree, outs.mean);
        out.set(Feature::MaxOutDegree, outs.max);
        out.set(Feature::StdOutDegree, outs.std);

        if let Some(weak) = connectivity::weak_components(directed) {
            out.set_flag(Feature::IsWeaklyConnected, weak.connected);
            out.set(Feature::NumWeaklyConnectedComponents, weak.count as f64);
        }
        if let Some(strong) = connectivity::strong_components(directed) {
            out.set_flag(Feature::IsStronglyConnected, strong.connected);
            out.set(Feature::NumStronglyConnectedComponents, strong.count as f64);
        }

        let acyclic = topology::is_acyclic(directed);
        out.set_flag(Feature::HasCycle, !acyclic);
        out.set_flag(Feature::IsDag, acyclic);
        if acyclic {
            if let Some((levels, widest)) = topology::generation_profile(directed) {
                out.set(Feature::NumTopoLevels, levels as f64);
                out.set(Feature::MaxTopoLevelSize, widest as f64);
            }
        }

        out.set_flag(Feature::IsTree, topology::is_tree(undirected).unwrap_or(false));
        out.set_flag(Feature::IsForest, topology::is_forest(undirected).unwrap_or(false));
        out.set(
            Feature::AvgClustering,
            clustering::average_clustering(undirected).unwrap_or(0.0),
        );

        out.set_flag(Feature::HasSelfLoops, stats::has_self_loops(directed));
        out.set(Feature::Reciprocity, stats::reciprocity(directed).unwrap_or(0.0));

        trace!(graph = %views.content_hash, "features computed");
        out
    }

    #[must_use]
    pub const fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    /// Look a value up by its wire name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        name.parse::<Feature>().ok().map(|f| self.get(f))
    }

    /// Values in `schema` order.
    #[must_use]
    pub fn to_vector(&self, schema: &FeatureSchema) -> Vec<f64> {
        schema.features().map(|f| self.get(f)).collect()
    }

    fn set(&mut self, feature: Feature, value: f64) {
        self.values[feature.index()] = value;
    }

    fn set_flag(&mut self, feature: Feature, flag: bool) {
        self.set(feature, if flag { 1.0 } else { 0.0 });
    }
}

// ---------------------------------------------------------------------------
// FeatureMap
// ---------------------------------------------------------------------------

/// Ordered `name → value` pairs; serializes as a JSON object in that order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureMap(Vec<(String, f64)>);

impl FeatureMap {
    /// Pair `values` with the names of `schema`.
    ///
    /// Without a schema the names fall back to `feature_0`, `feature_1`, ….
    #[must_use]
    pub fn from_values(schema: Option<&FeatureSchema>, values: &[f64]) -> Self {
        let entries = match schema {
            Some(schema) => schema
                .names()
                .zip(values)
                .map(|(name, v)| (name.to_string(), *v))
                .collect(),
            None => values
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("feature_{i}"), *v))
                .collect(),
        };
        Self(entries)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(n, v)| (n.as_str(), *v))
    }
}

impl Serialize for FeatureMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// GraphFeatureExtractor
// ---------------------------------------------------------------------------

/// Schema-bound extractor plus the normalization learned at training time.
///
/// The schema is fixed at construction; extraction never mutates it. The
/// extractor and the model trained on its output are versioned together.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct GraphFeatureExtractor {
    schema: FeatureSchema,
    #[serde(default)]
    normalizer: FeatureNormalizer,
}

impl GraphFeatureExtractor {
    /// Extractor over the canonical (name-sorted) schema.
    #[must_use]
    pub fn new() -> Self {
        Self::with_schema(FeatureSchema::canonical())
    }

    #[must_use]
    pub fn with_schema(schema: FeatureSchema) -> Self {
        Self {
            schema,
            normalizer: FeatureNormalizer::new(),
        }
    }

    #[must_use]
    pub const fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    #[must_use]
    pub const fn normalizer(&self) -> &FeatureNormalizer {
        &self.normalizer
    }

    #[must_use]
    pub const fn is_fitted(&self) -> bool {
        self.normalizer.is_fitted()
    }

    /// Raw feature vector for `edges`, in schema order.
    #[must_use]
    pub fn extract_features(&self, edges: &EdgeList) -> Vec<f64> {
        GraphFeatures::compute(edges).to_vector(&self.schema)
    }

    /// Parse `input` with the fail-soft parser, then extract.
    #[must_use]
    pub fn extract_input(&self, input: &EdgeInput) -> Vec<f64> {
        self.extract_features(&parse_edge_list(input))
    }

    /// Named raw features for `edges`.
    #[must_use]
    pub fn feature_map(&self, edges: &EdgeList) -> FeatureMap {
        FeatureMap::from_values(Some(&self.schema), &self.extract_features(edges))
    }

    /// Raw feature rows for a batch.
    #[must_use]
    pub fn extract_batch(&self, batch: &[EdgeList]) -> FeatureMatrix {
        batch.iter().map(|edges| self.extract_features(edges)).collect()
    }

    /// Extract, sanitize and fit the normalizer on `batch`.
    ///
    /// # Errors
    ///
    /// Fails on an empty batch.
    #[instrument(skip(self, batch), fields(rows = batch.len()))]
    pub fn fit_transform(&mut self, batch: &[EdgeList]) -> Result<FeatureMatrix, NormalizerError> {
        let raw = self.extract_batch(batch);
        self.normalizer.fit_transform(raw)
    }

    /// Extract, sanitize and standardize `batch` with the fitted statistics.
    ///
    /// # Errors
    ///
    /// [`NormalizerError::NotFitted`] before [`Self::fit_transform`].
    #[instrument(skip(self, batch), fields(rows = batch.len()))]
    pub fn transform(&self, batch: &[EdgeList]) -> Result<FeatureMatrix, NormalizerError> {
        if !self.is_fitted() {
            return Err(NormalizerError::NotFitted);
        }
        self.normalizer.transform(&self.extract_batch(batch))
    }

    /// Standardize one raw row produced by [`Self::extract_features`].
    ///
    /// # Errors
    ///
    /// [`NormalizerError::NotFitted`] before a fit.
    pub fn standardize(&self, raw: &[f64]) -> Result<Vec<f64>, NormalizerError> {
        self.normalizer.transform_row(raw)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn features(pairs: &[(i64, i64)]) -> GraphFeatures {
        GraphFeatures::compute(&EdgeList::from_pairs(pairs.iter().copied()))
    }

    #[test]
    fn cycle_flags_always_disagree() {
        let cases: [&[(i64, i64)]; 4] = [&[], &[(0, 1)], &[(0, 1), (1, 0)], &[(2, 2)]];
        for pairs in cases {
            let f = features(pairs);
            assert!((f.get(Feature::HasCycle) + f.get(Feature::IsDag) - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn vector_follows_schema_order() {
        let schema = FeatureSchema::from_features(vec![Feature::NumEdges, Feature::NumNodes]).unwrap();
        let extractor = GraphFeatureExtractor::with_schema(schema);
        let v = extractor.extract_features(&EdgeList::from_pairs([(0, 1), (1, 2)]));
        assert_eq!(v, vec![2.0, 3.0]);
    }

    #[test]
    fn get_by_name_resolves_wire_names() {
        let f = features(&[(0, 1)]);
        assert_eq!(f.get_by_name("num_nodes"), Some(2.0));
        assert_eq!(f.get_by_name("girth"), None);
    }

    #[test]
    fn feature_map_serializes_in_order() {
        let schema = FeatureSchema::from_features(vec![Feature::NumNodes, Feature::Density]).unwrap();
        let map = FeatureMap::from_values(Some(&schema), &[2.0, 0.5]);
        assert_eq!(
            serde_json::to_string(&map).unwrap(),
            r#"{"num_nodes":2.0,"density":0.5}"#
        );
    }

    #[test]
    fn feature_map_without_schema_uses_synthetic_names() {
        let map = FeatureMap::from_values(None, &[1.0, 2.0, 3.0]);
        let names: Vec<&str> = map.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["feature_0", "feature_1", "feature_2"]);
    }

    #[test]
    fn transform_requires_fit() {
        let extractor = GraphFeatureExtractor::new();
        let batch = vec![EdgeList::from_pairs([(0, 1)])];
        assert_eq!(extractor.transform(&batch), Err(NormalizerError::NotFitted));
    }

    #[test]
    fn fit_then_transform_uses_training_statistics() {
        let mut extractor = GraphFeatureExtractor::new();
        let train = vec![
            EdgeList::from_pairs([(0, 1), (1, 2)]),
            EdgeList::from_pairs([(0, 1), (1, 2), (2, 0)]),
        ];
        let fitted = extractor.fit_transform(&train).unwrap();
        let again = extractor.transform(&train).unwrap();
        assert_eq!(fitted, again);
        assert!(extractor.is_fitted());
    }

    #[test]
    fn extractor_round_trips_through_json() {
        let mut extractor = GraphFeatureExtractor::new();
        let batch = [EdgeList::from_pairs([(0, 1)]), EdgeList::from_pairs([(0, 0), (0, 2)])];
        extractor.fit_transform(&batch).unwrap();
        let json = serde_json::to_string(&extractor).unwrap();
        let back: GraphFeatureExtractor = serde_json::from_str(&json).unwrap();
        assert_eq!(back.schema(), extractor.schema());
        assert!(back.is_fitted());

        let before = extractor.transform(&batch).unwrap();
        let after = back.transform(&batch).unwrap();
        for (a, b) in before.iter().flatten().zip(after.iter().flatten()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
