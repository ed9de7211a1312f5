use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

#[allow(deprecated)]
fn docqa(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docqa").expect("binary");
    cmd.current_dir(workdir)
        .env("DOCQA_EMBEDDING_MODE", "stub")
        .env("DOCQA_EMBEDDING_DIM", "32")
        .env_remove("DOCQA_INDEX_DIR")
        .env_remove("DOCQA_CHUNK_SIZE")
        .env_remove("DOCQA_CHUNK_OVERLAP")
        .env_remove("DOCQA_TOP_K");
    cmd
}

fn run_json(workdir: &Path, args: &[&str]) -> (bool, Value) {
    let output = docqa(workdir)
        .arg("--json")
        .args(args)
        .output()
        .expect("command run");
    let body: Value = serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
        panic!(
            "invalid json ({err}): {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    });
    (output.status.success(), body)
}

fn vector_blobs(dir: &Path, namespace: &str) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok()?.file_name().into_string().ok())
        .filter(|name| name.starts_with(&format!("{namespace}.")) && name.ends_with(".index"))
        .collect()
}

fn words(prefix: &str, n: usize) -> String {
    (0..n)
        .map(|i| format!("{prefix}{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn setup_docs() -> TempDir {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("policy.txt"), words("policy", 1200)).unwrap();
    fs::write(
        temp.path().join("manual.txt"),
        format!("{}\x0c{}", words("intro", 40), words("safety", 40)),
    )
    .unwrap();
    temp
}

#[test]
fn index_then_search_round_trip() {
    let temp = setup_docs();
    let root = temp.path();

    let (ok, index) = run_json(root, &["index", "policy.txt"]);
    assert!(ok, "{index}");
    assert_eq!(index["status"], "ok");
    assert_eq!(index["data"]["namespace"], "policy");
    assert_eq!(index["data"]["chunks"], 3);
    assert_eq!(index["data"]["words"], 1200);
    assert_eq!(index["data"]["dimension"], 32);
    assert!(root.join("vector_indexes/policy.meta.json").exists());
    assert_eq!(vector_blobs(&root.join("vector_indexes"), "policy").len(), 1);

    // The first chunk's exact text is its own nearest neighbour.
    let query = words("policy", 500);
    let (ok, search) = run_json(root, &["search", &query, "--namespace", "policy", "-k", "2"]);
    assert!(ok, "{search}");
    let results = search["data"]["queries"][0]["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["metadata"]["char_range"], "0-500");
    assert_eq!(results[0]["metadata"]["chunk_index"], 0);
    assert!(results[0]["distance"].as_f64().unwrap() < 1e-6);
    assert_eq!(
        search["data"]["queries"][0]["citations"][0]["source"],
        "policy.txt"
    );
}

#[test]
fn pages_and_namespace_flag() {
    let temp = setup_docs();
    let root = temp.path();

    let (ok, index) = run_json(
        root,
        &[
            "index",
            "manual.txt",
            "--namespace",
            "manual-v1",
            "--chunk-size",
            "30",
            "--overlap",
            "5",
        ],
    );
    assert!(ok, "{index}");
    assert_eq!(index["data"]["pages"], 2);

    let (ok, inspect) = run_json(root, &["inspect", "manual-v1", "--preview", "10"]);
    assert!(ok, "{inspect}");
    assert_eq!(inspect["data"]["sources"]["manual.txt"], inspect["data"]["chunks"]);
    let pages: Vec<i64> = inspect["data"]["preview"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["page"].as_i64().unwrap())
        .collect();
    assert_eq!(pages, vec![1, 1, 2, 2]);
}

#[test]
fn multiple_queries_return_in_order() {
    let temp = setup_docs();
    let root = temp.path();
    assert!(run_json(root, &["index", "policy.txt"]).0);

    let (ok, search) = run_json(
        root,
        &["search", "first question", "second question", "-n", "policy", "--context"],
    );
    assert!(ok, "{search}");
    let queries = search["data"]["queries"].as_array().unwrap();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0]["query"], "first question");
    assert_eq!(queries[1]["query"], "second question");
    assert_eq!(queries[1]["results"].as_array().unwrap().len(), 3);
    assert!(queries[0]["context"].as_str().unwrap().contains("---"));
}

#[test]
fn namespaces_lists_saved_only() {
    let temp = setup_docs();
    let root = temp.path();
    assert!(run_json(root, &["index", "policy.txt"]).0);
    assert!(run_json(root, &["index", "manual.txt", "--no-save"]).0);

    let (ok, listing) = run_json(root, &["namespaces"]);
    assert!(ok);
    assert_eq!(listing["data"]["namespaces"], serde_json::json!(["policy"]));
}

#[test]
fn missing_namespace_is_typed_error() {
    let temp = setup_docs();
    let (ok, body) = run_json(temp.path(), &["search", "anything", "-n", "ghost"]);
    assert!(!ok);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["kind"], "index_not_found");
}

#[test]
fn dimension_change_requires_reindex() {
    let temp = setup_docs();
    let root = temp.path();
    assert!(run_json(root, &["index", "policy.txt"]).0);

    let (ok, body) = run_json(
        root,
        &["--embed-dim", "16", "search", "policy1", "-n", "policy"],
    );
    assert!(!ok);
    assert_eq!(body["error"]["kind"], "dimension_mismatch");
}

#[test]
fn overlap_equal_to_chunk_size_is_rejected() {
    let temp = setup_docs();
    let (ok, body) = run_json(
        temp.path(),
        &["index", "policy.txt", "--chunk-size", "100", "--overlap", "100"],
    );
    assert!(!ok);
    assert_eq!(body["error"]["kind"], "invalid_chunk_parameters");
    assert!(!temp.path().join("vector_indexes/policy.meta.json").exists());
    assert!(vector_blobs(&temp.path().join("vector_indexes"), "policy").is_empty());
}

#[test]
fn config_file_and_env_layering() {
    let temp = setup_docs();
    let root = temp.path();
    fs::write(
        root.join("docqa.toml"),
        "chunk_size = 1000\nchunk_overlap = 0\nindex_dir = \"from_file\"\n",
    )
    .unwrap();

    let output = docqa(root)
        .env("DOCQA_CHUNK_SIZE", "600")
        .args(["--json", "--config", "docqa.toml", "index", "policy.txt"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    // Env chunk size wins over the file: [0,600), [600,1200)
    assert_eq!(body["data"]["chunks"], 2);
    assert!(root.join("from_file/policy.meta.json").exists());
}

#[test]
fn human_output_and_plain_errors() {
    let temp = setup_docs();
    let root = temp.path();

    docqa(root)
        .args(["index", "policy.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexed policy.txt into 'policy': 3 chunks"));

    docqa(root)
        .args(["inspect", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Index not found for namespace 'nope'"));
}

#[test]
fn bad_embedding_env_is_config_error() {
    let temp = setup_docs();
    let output = docqa(temp.path())
        .env("DOCQA_EMBEDDING_DIM", "wide")
        .args(["--json", "namespaces"])
        .output()
        .expect("run");
    assert!(!output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["error"]["kind"], "invalid_config");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("DOCQA_EMBEDDING_DIM"));
}
