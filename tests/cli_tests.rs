use std::io::Write;
use std::path::Path;
use std::process::Command;

fn write_jsonl(dir: &Path, name: &str, lines: &[serde_json::Value]) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    for line in lines {
        writeln!(f, "{line}").unwrap();
    }
    path
}

fn run(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_driftscope"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .unwrap()
}

#[test]
fn distribution_single_mode_prints_report() {
    let dir = tempfile::tempdir().unwrap();
    let docs: Vec<_> = (0..20)
        .map(|i| serde_json::json!({"status": (["ok", "fail", "retry", "skip"][i % 4]), "id": format!("r{i}")}))
        .collect();
    let selection = write_jsonl(dir.path(), "sel.jsonl", &docs);

    let out = run(&["--compact", "distribution", "--selection", selection.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let analyses = v["singleAnalysis"].as_array().unwrap();
    assert_eq!(analyses.len(), 1);
    assert_eq!(analyses[0]["field"], "status");
    assert_eq!(analyses[0]["topChanges"].as_array().unwrap().len(), 4);
}

#[test]
fn distribution_filter_builds_comparison() {
    let dir = tempfile::tempdir().unwrap();
    let docs: Vec<_> = (0..20)
        .map(|i| {
            let level = if i < 10 { "error" } else { "info" };
            serde_json::json!({"level": level, "service": if i < 10 { "auth" } else { "web" }})
        })
        .collect();
    let path = write_jsonl(dir.path(), "all.jsonl", &docs);

    let out = run(&[
        "--compact",
        "distribution",
        "--selection",
        path.to_str().unwrap(),
        "--filter",
        r#"{"term": {"service": "auth"}}"#,
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let analyses = v["comparisonAnalysis"].as_array().unwrap();
    assert!(analyses.iter().any(|a| a["field"] == "level"));
}

#[test]
fn unknown_filter_operator_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_jsonl(dir.path(), "d.jsonl", &[serde_json::json!({"a": 1})]);
    let out = run(&[
        "distribution",
        "--selection",
        path.to_str().unwrap(),
        "--filter",
        r#"{"fuzzy": {"a": 1}}"#,
    ]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("fuzzy"));
}

#[test]
fn patterns_diff_between_files() {
    let dir = tempfile::tempdir().unwrap();
    let base: Vec<_> = (0..5)
        .map(|i| serde_json::json!({"message": format!("user {i} logged in"), "@timestamp": "2024-01-01T00:00:00Z"}))
        .collect();
    let mut selection = base.clone();
    selection.push(serde_json::json!({"message": "auth failed for 9", "@timestamp": "2024-01-01T00:01:00Z"}));
    let base = write_jsonl(dir.path(), "base.jsonl", &base);
    let selection = write_jsonl(dir.path(), "sel.jsonl", &selection);

    let out = run(&[
        "--compact",
        "patterns",
        "--selection",
        selection.to_str().unwrap(),
        "--base",
        base.to_str().unwrap(),
        "--mask",
        "digits",
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let entries = v["patternMapDifference"].as_array().unwrap();
    assert_eq!(entries[0]["pattern"], "auth failed for ");
    assert_eq!(entries[0]["kind"], "emerging");
}

#[test]
fn missing_text_field_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_jsonl(dir.path(), "d.jsonl", &[serde_json::json!({"msg": "x", "@timestamp": "2024-01-01"})]);
    let out = run(&["patterns", "--selection", path.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("message"));
}
