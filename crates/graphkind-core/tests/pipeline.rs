//! Train → save → load → classify, end to end through the public API.

use std::fs;

use serde_json::json;

use graphkind_core::artifact::{ArtifactError, ArtifactStore, DEFAULT_LOCK_TIMEOUT};
use graphkind_core::config::TrainingConfig;
use graphkind_core::dataset::Dataset;
use graphkind_core::model::ModelFamily;
use graphkind_core::service::{ClassificationService, ClassifyError, ClassifyRequest};
use graphkind_core::train::grid::{ForestGrid, KnnGrid, SoftmaxGrid};
use graphkind_core::train::run_training;
use graphkind_core::{ErrorCode, GraphLabel};

fn path_csv(n: usize) -> String {
    let pairs: Vec<String> = (0..n - 1).map(|i| format!("({i}, {})", i + 1)).collect();
    format!("[{}]", pairs.join(", "))
}

fn ring_csv(n: usize) -> String {
    let pairs: Vec<String> = (0..n).map(|i| format!("({i}, {})", (i + 1) % n)).collect();
    format!("[{}]", pairs.join(", "))
}

fn fan_csv(n: usize) -> String {
    // 0 → i → n for every middle node: a DAG that is not a tree.
    let mut pairs: Vec<String> = (1..n).map(|i| format!("(0, {i})")).collect();
    pairs.extend((1..n).map(|i| format!("({i}, {n})")));
    format!("[{}]", pairs.join(", "))
}

fn training_csv() -> String {
    let mut out = String::from("edgelist,label\n");
    for n in 3..15 {
        out.push_str(&format!("\"{}\",0\n", path_csv(n)));
        out.push_str(&format!("\"{}\",1\n", ring_csv(n)));
        out.push_str(&format!("\"{}\",2\n", fan_csv(n)));
    }
    out
}

fn small_config() -> TrainingConfig {
    TrainingConfig {
        random_forest: ForestGrid {
            n_estimators: vec![10],
            max_depth: vec![0],
            min_samples_split: vec![2],
        },
        knn: KnnGrid {
            k: vec![1, 3],
            distance_weighted: vec![false],
        },
        softmax: SoftmaxGrid {
            learning_rate: vec![0.1],
            epochs: vec![100],
            l2: vec![0.0],
        },
        ..TrainingConfig::default()
    }
}

fn train_into(store: &ArtifactStore, config: &TrainingConfig) -> f64 {
    let data = Dataset::from_reader(training_csv().as_bytes()).expect("dataset parses");
    let run = run_training(&data, None, config).expect("training succeeds");
    let lock = store.lock(DEFAULT_LOCK_TIMEOUT).expect("lock");
    store.save(&lock, &run.extractor, &run.model).expect("save");
    run.report.accuracy
}

#[test]
fn trained_model_classifies_unseen_shapes() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = ArtifactStore::new(dir.path());
    let accuracy = train_into(&store, &small_config());
    assert!(accuracy > 0.8, "validation accuracy {accuracy}");

    let service = ClassificationService::from_store(&store).expect("load");
    let cases = [
        (json!([["h", "i"], ["g", "h"], ["f", "g"], ["e", "f"], ["d", "e"], ["c", "d"], ["b", "c"], ["a", "b"]]), GraphLabel::Tree),
        (json!([["a", "b"], ["b", "c"], ["c", "d"], ["d", "e"], ["e", "a"]]), GraphLabel::Cyclic),
        (json!([[0, 1], [0, 2], [0, 3], [1, 4], [2, 4], [3, 4]]), GraphLabel::Dag),
    ];
    for (edges, expected) in cases {
        let response = service.classify(&ClassifyRequest::new(edges)).expect("classify");
        assert_eq!(response.label(), Some(expected));
        assert!((0.0..=1.0).contains(&response.confidence));
        assert_eq!(response.features.len(), 22);
    }
}

#[test]
fn response_serializes_to_wire_shape() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = ArtifactStore::new(dir.path());
    train_into(&store, &small_config());
    let service = ClassificationService::from_store(&store).expect("load");

    let response = service
        .handle_json(r#"{"edges": [[0, 1], [1, 2], [2, 0]]}"#)
        .expect("classify");
    let wire = serde_json::to_value(&response).expect("serialize");
    assert_eq!(wire["prediction"], 1);
    assert!(wire["confidence"].as_f64().is_some());
    assert_eq!(wire["features"]["has_cycle"], 1.0);
    assert_eq!(wire["features"]["num_nodes"], 3.0);
}

#[test]
fn format_errors_never_reach_the_model() {
    let service = ClassificationService::new();
    let err = service
        .classify(&ClassifyRequest::new(json!([[0, 1], [1, 2, 3]])))
        .expect_err("triple is rejected");
    assert_eq!(err.code(), ErrorCode::InvalidEdgeFormat);
    assert_eq!(err.to_response().status, 400);

    let err = service
        .classify(&ClassifyRequest::new(json!([])))
        .expect_err("empty is rejected");
    assert_eq!(err, ClassifyError::EmptyEdges);
    assert_eq!(err.to_response().status, 400);
}

#[test]
fn artifacts_from_different_runs_do_not_pair() {
    let first = tempfile::tempdir().expect("temp dir");
    let second = tempfile::tempdir().expect("temp dir");
    let store_a = ArtifactStore::new(first.path());
    let store_b = ArtifactStore::new(second.path());

    train_into(&store_a, &small_config());
    let mut other = small_config();
    other.seed = 7;
    other.families = vec![ModelFamily::Knn];
    train_into(&store_b, &other);

    fs::copy(store_b.extractor_path(), store_a.extractor_path()).expect("copy extractor");
    let err = store_a.load().expect_err("mismatched pair");
    assert!(matches!(err, ArtifactError::DigestMismatch { .. }));
    assert_eq!(err.code(), ErrorCode::ArtifactMismatch);
}

#[test]
fn reload_swaps_in_new_artifacts() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = ArtifactStore::new(dir.path());
    let mut knn_only = small_config();
    knn_only.families = vec![ModelFamily::Knn];
    train_into(&store, &knn_only);

    let service = ClassificationService::from_store(&store).expect("load");
    let before = service.bundle().expect("bundle");
    assert_eq!(before.family(), ModelFamily::Knn);

    let mut softmax_only = small_config();
    softmax_only.families = vec![ModelFamily::Softmax];
    train_into(&store, &softmax_only);
    service.reload(&store).expect("reload");

    assert_eq!(service.bundle().expect("bundle").family(), ModelFamily::Softmax);
    // The old snapshot stays usable for whoever still holds it.
    assert_eq!(before.family(), ModelFamily::Knn);
}

#[test]
fn missing_artifacts_fail_to_load() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = ClassificationService::from_store(&ArtifactStore::new(dir.path())).expect_err("empty dir");
    assert_eq!(err.code(), ErrorCode::ModelNotFound);
}
