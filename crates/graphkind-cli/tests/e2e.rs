//! E2E CLI tests: `gk train`, `gk classify` and `gk features` run as
//! subprocesses in an isolated temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = "[artifacts]\n\
    dir = \"models\"\n\
    \n\
    [training]\n\
    seed = 11\n\
    families = [\"knn\", \"softmax\"]\n\
    \n\
    [training.knn]\n\
    k = [1, 3]\n\
    distance_weighted = [false]\n\
    \n\
    [training.softmax]\n\
    learning_rate = [0.1]\n\
    epochs = [100]\n\
    l2 = [0.0]\n";

fn gk_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("gk"));
    cmd.current_dir(dir);
    cmd.env("GRAPHKIND_LOG", "error");
    cmd
}

fn pairs(edges: &[(usize, usize)]) -> String {
    let body: Vec<String> = edges.iter().map(|(a, b)| format!("({a}, {b})")).collect();
    format!("[{}]", body.join(", "))
}

fn training_csv() -> String {
    let mut out = String::from("edgelist,label\n");
    for n in 3..12 {
        let path: Vec<_> = (0..n - 1).map(|i| (i, i + 1)).collect();
        let ring: Vec<_> = (0..n).map(|i| (i, (i + 1) % n)).collect();
        let mut fan: Vec<_> = (1..n).map(|i| (0, i)).collect();
        fan.extend((1..n).map(|i| (i, n)));
        writeln!(out, "\"{}\",Tree", pairs(&path)).unwrap();
        writeln!(out, "\"{}\",Cyclic", pairs(&ring)).unwrap();
        writeln!(out, "\"{}\",DAG", pairs(&fan)).unwrap();
    }
    out
}

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("graphkind.toml"), CONFIG).unwrap();
    fs::write(dir.path().join("train.csv"), training_csv()).unwrap();
    dir
}

fn train(dir: &Path) {
    gk_cmd(dir)
        .args(["train", "--train", "train.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Validation report"));
}

#[test]
fn train_writes_artifact_pair_to_configured_dir() {
    let dir = setup();
    train(dir.path());
    assert!(dir.path().join("models/classifier.json").is_file());
    assert!(dir.path().join("models/extractor.json").is_file());
}

#[test]
fn train_json_reports_selection_and_families() {
    let dir = setup();
    let output = gk_cmd(dir.path())
        .args(["train", "--train", "train.csv", "--out", "out", "--json"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "train failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let summary: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert!(summary["cv_score"].as_f64().is_some());
    assert_eq!(summary["families"].as_array().map(Vec::len), Some(2));
    assert!(summary["report"]["accuracy"].as_f64().unwrap() > 0.5);
    assert!(dir.path().join("out/classifier.json").is_file());
}

#[test]
fn classify_returns_wire_object() {
    let dir = setup();
    train(dir.path());

    let output = gk_cmd(dir.path())
        .args(["classify", "--edges", "[[0, 1], [1, 2], [2, 3], [3, 0]]", "--json"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "classify failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let response: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(response["prediction"], 1);
    let confidence = response["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));
    assert_eq!(response["features"]["has_cycle"], 1.0);
    assert_eq!(response["features"].as_object().map(serde_json::Map::len), Some(22));
}

#[test]
fn classify_reads_request_body_from_file() {
    let dir = setup();
    train(dir.path());
    fs::write(
        dir.path().join("request.json"),
        r#"{"edges": [["a", "b"], ["b", "c"], ["c", "d"], ["d", "e"]]}"#,
    )
    .unwrap();

    gk_cmd(dir.path())
        .args(["classify", "--file", "request.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("prediction:"))
        .stdout(predicate::str::contains("Tree (0)"));
}

#[test]
fn malformed_edges_fail_with_format_error() {
    let dir = setup();
    let output = gk_cmd(dir.path())
        .args(["classify", "--edges", "[[0, 1], [1, 2, 3]]", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let error: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(error["code"], "E1002");
    assert_eq!(error["status"], 400);
}

#[test]
fn empty_edges_fail_before_loading_artifacts() {
    let dir = setup();
    gk_cmd(dir.path())
        .args(["classify", "--edges", "[]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1001"));
}

#[test]
fn classify_without_artifacts_reports_model_not_found() {
    let dir = setup();
    let output = gk_cmd(dir.path())
        .args(["classify", "--edges", "[[0, 1]]", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let error: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(error["code"], "E2002");
    assert_eq!(error["status"], 503);
}

#[test]
fn features_prints_named_map() {
    let dir = setup();
    let output = gk_cmd(dir.path())
        .args(["features", "--edges", "[(0, 1), (1, 2), (2, 0)]", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let payload: Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(payload["edges"], 3);
    assert_eq!(payload["features"]["num_nodes"], 3.0);
    assert_eq!(payload["features"]["is_dag"], 0.0);
}

#[test]
fn features_of_garbage_is_empty_graph() {
    let dir = setup();
    gk_cmd(dir.path())
        .args(["features", "--edges", "not an edge list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no usable edges"))
        .stdout(predicate::str::contains("is_dag"));
}

#[test]
fn missing_label_column_is_reported() {
    let dir = setup();
    fs::write(dir.path().join("bad.csv"), "edgelist\n\"[(0, 1)]\"\n").unwrap();
    gk_cmd(dir.path())
        .args(["train", "--train", "bad.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1003"));
}

#[test]
fn classify_requires_an_input() {
    let dir = setup();
    gk_cmd(dir.path()).args(["classify"]).assert().failure();
}
