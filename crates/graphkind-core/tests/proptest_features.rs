use proptest::prelude::*;

use graphkind_core::edges::EdgeList;
use graphkind_core::features::{Feature, FeatureSchema, GraphFeatureExtractor, GraphFeatures};
use graphkind_core::normalize::{FeatureNormalizer, NEGATIVE_SENTINEL, POSITIVE_SENTINEL, sanitize};

fn arb_pairs() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((0u8..12, 0u8..12), 0..30)
}

fn edges(pairs: &[(u8, u8)]) -> EdgeList {
    EdgeList::from_pairs(pairs.iter().map(|&(a, b)| (u32::from(a), u32::from(b))))
}

fn arb_value() -> impl Strategy<Value = f64> {
    prop_oneof![
        4 => -1e3..1e3_f64,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::NEG_INFINITY),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn extraction_is_deterministic(pairs in arb_pairs()) {
        let list = edges(&pairs);
        prop_assert_eq!(GraphFeatures::compute(&list), GraphFeatures::compute(&list));
    }

    #[test]
    fn edge_order_does_not_matter(
        (pairs, shuffled) in arb_pairs().prop_flat_map(|p| (Just(p.clone()), Just(p).prop_shuffle())),
    ) {
        prop_assert_eq!(GraphFeatures::compute(&edges(&pairs)), GraphFeatures::compute(&edges(&shuffled)));
    }

    #[test]
    fn schema_width_and_names_are_stable(a in arb_pairs(), b in arb_pairs()) {
        let extractor = GraphFeatureExtractor::new();
        let first = extractor.feature_map(&edges(&a));
        let second = extractor.feature_map(&edges(&b));
        let first_names: Vec<&str> = first.iter().map(|(n, _)| n).collect();
        let second_names: Vec<&str> = second.iter().map(|(n, _)| n).collect();
        prop_assert_eq!(first_names.len(), Feature::COUNT);
        prop_assert_eq!(&first_names, &second_names);
        let canonical: Vec<&str> = FeatureSchema::canonical().names().collect();
        prop_assert_eq!(first_names, canonical);
    }

    #[test]
    fn cycle_flags_are_complementary(pairs in arb_pairs()) {
        let f = GraphFeatures::compute(&edges(&pairs));
        prop_assert!((f.get(Feature::HasCycle) + f.get(Feature::IsDag) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn raw_features_are_finite(pairs in arb_pairs()) {
        let list = edges(&pairs);
        let extractor = GraphFeatureExtractor::new();
        prop_assert!(extractor.extract_features(&list).iter().all(|v| v.is_finite()));
    }

    #[test]
    fn sanitize_always_finite(value in arb_value()) {
        let clean = sanitize(value);
        prop_assert!(clean.is_finite());
        prop_assert!((NEGATIVE_SENTINEL..=POSITIVE_SENTINEL).contains(&clean));
    }

    #[test]
    fn standardized_matrix_is_finite(
        rows in prop::collection::vec(prop::collection::vec(arb_value(), 4), 1..20),
    ) {
        let mut normalizer = FeatureNormalizer::new();
        let out = normalizer.fit_transform(rows.clone()).expect("non-empty batch fits");
        prop_assert!(out.iter().flatten().all(|v| v.is_finite()));
        let again = normalizer.transform(&rows).expect("fitted");
        prop_assert!(again.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn fitted_batch_features_are_finite(batch in prop::collection::vec(arb_pairs(), 1..8)) {
        let lists: Vec<EdgeList> = batch.iter().map(|p| edges(p)).collect();
        let mut extractor = GraphFeatureExtractor::new();
        let x = extractor.fit_transform(&lists).expect("non-empty batch fits");
        prop_assert_eq!(x.len(), lists.len());
        prop_assert!(x.iter().all(|row| row.len() == Feature::COUNT));
        prop_assert!(x.iter().flatten().all(|v| v.is_finite()));
    }
}

#[test]
fn transform_before_fit_is_a_state_error() {
    let extractor = GraphFeatureExtractor::new();
    let err = extractor
        .transform(&[EdgeList::from_pairs([(0, 1)])])
        .expect_err("unfitted");
    assert_eq!(err, graphkind_core::normalize::NormalizerError::NotFitted);
}
