use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn arbor() -> Command {
    Command::new(env!("CARGO_BIN_EXE_arbor"))
}

#[test]
fn summarize_prints_topologies_and_writes_json() {
    let dir = tempdir().unwrap();
    let trees = dir.path().join("trees.tre");
    fs::write(&trees, "((1,2),3,(4,5));\n((1,3),2,(4,5));\n((2,1),(5,4),3);\n").unwrap();
    let json = dir.path().join("report.json");

    let output = arbor()
        .args(["summarize", "--trees"])
        .arg(&trees)
        .arg("--json")
        .arg(&json)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("seen in these 2 trees"));

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(report["num_trees"], 3);
    assert_eq!(report["ranking"][0]["frequency"], 2);
}

#[test]
fn sample_writes_artefacts() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("start.tre");
    fs::write(&tree, "((1:0.1,2:0.1):0.2,3:0.3,(4:0.1,5:0.1):0.2);\n").unwrap();
    let config = dir.path().join("config.yaml");
    fs::write(&config, "iterations: 40\nsample_freq: 4\nprint_freq: 0\nladder:\n  chains: 2\n").unwrap();
    let out = dir.path().join("run");

    let output = arbor()
        .arg("sample")
        .arg("--config")
        .arg(&config)
        .arg("--tree")
        .arg(&tree)
        .arg("--out")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let trace = fs::read_to_string(out.join("trace.csv")).unwrap();
    assert_eq!(trace.lines().count(), 11);
    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["trees_sampled"], 10);
    assert_eq!(manifest["heating_powers"].as_array().map(Vec::len), Some(2));
    assert!(out.join("summary.json").exists());
}

#[test]
fn bad_tree_file_fails() {
    let dir = tempdir().unwrap();
    let trees = dir.path().join("broken.tre");
    fs::write(&trees, "((1,2),3,(4,5);\n").unwrap();
    let status = arbor().args(["summarize", "--trees"]).arg(&trees).status().unwrap();
    assert!(!status.success());
}
