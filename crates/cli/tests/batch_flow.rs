use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn absa(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("absa").expect("binary");
    cmd.current_dir(workdir)
        .env("ABSA_INFERENCE_MODE", "stub")
        .env("ABSA_MODEL_DIR", workdir.join("no-models"))
        .env_remove("ABSA_ASPECT_THRESHOLD")
        .arg("--quiet");
    cmd
}

fn run_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

const REVIEWS: &str = "id,review\n\
1,Giá rẻ nhưng pin yếu\n\
2,\"Màn hình đẹp, camera chụp rõ\"\n\
3,Pin tụt nhanh quá\n\
4\n\
5,Shop giao hàng nhanh\n";

#[test]
fn analyze_prints_result_json() {
    let temp = tempdir().unwrap();
    let body = run_json(
        absa(temp.path())
            .arg("analyze")
            .arg("Giá rẻ nhưng pin yếu")
            .arg("--threshold")
            .arg("0.1"),
    );

    assert_eq!(body["text"], "Giá rẻ nhưng pin yếu");
    let aspects = body["aspects"].as_array().expect("aspects array");
    let scores: Vec<f64> = aspects
        .iter()
        .map(|a| a["score"].as_f64().unwrap())
        .collect();
    assert!(scores.iter().all(|s| *s >= 0.1 - 1e-6));
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    assert!(aspects.iter().all(|a| a["sentiment"]["label"].is_string()));
    assert!(body["sentiment"]["label"].is_string());
}

#[test]
fn analyze_rejects_out_of_range_threshold() {
    let temp = tempdir().unwrap();
    absa(temp.path())
        .arg("analyze")
        .arg("text")
        .arg("--threshold")
        .arg("0.95")
        .assert()
        .failure()
        .stderr(predicate::str::contains("aspect_threshold"));
}

#[test]
fn batch_then_overview_and_actions() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::write(root.join("reviews.csv"), REVIEWS).unwrap();

    absa(root)
        .args(["batch", "--input", "reviews.csv", "--text-column", "review"])
        .args(["--output", "analysis.csv", "--workers", "2", "--threshold", "0.2"])
        .assert()
        .success();

    let report = fs::read_to_string(root.join("analysis.csv")).unwrap();
    let mut lines = report.lines();
    assert_eq!(
        lines.next(),
        Some("review,sentiment_label,sentiment_score,aspects_display,aspects_detail")
    );
    assert!(report.contains("Giá rẻ nhưng pin yếu"));

    let overview = run_json(absa(root).args([
        "overview",
        "--input",
        "analysis.csv",
        "--text-column",
        "review",
    ]));
    assert_eq!(overview["total"], 5);
    let sentiment = &overview["sentiment"];
    let counted: u64 = ["positive", "neutral", "negative", "other"]
        .iter()
        .map(|k| sentiment[*k].as_u64().unwrap())
        .sum();
    assert_eq!(counted, 5);

    let actions = run_json(absa(root).args([
        "actions",
        "--input",
        "analysis.csv",
        "--min-mentions",
        "1",
        "--summary-csv",
        "summary.csv",
    ]));
    assert_eq!(actions["filters"]["min_mentions"], 1);
    assert!(actions["urgent"].is_array());
    assert!(actions["plan"].is_array());

    let summary = fs::read_to_string(root.join("summary.csv")).unwrap();
    assert!(summary.starts_with(
        "aspect,mentions,neg,pos,avg_score,neg_ratio,pos_ratio,priority_score"
    ));

    absa(root)
        .args(["actions", "--input", "analysis.csv", "--format", "markdown"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# ABSA action center"));
}

#[test]
fn batch_to_stdout_is_deterministic() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::write(root.join("reviews.csv"), "text\nPin yếu\nGiá tốt\n").unwrap();

    let first = absa(root)
        .args(["batch", "--input", "reviews.csv"])
        .output()
        .expect("first run");
    let second = absa(root)
        .args(["batch", "--input", "reviews.csv", "--workers", "3"])
        .output()
        .expect("second run");

    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    let text = String::from_utf8(first.stdout).unwrap();
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn batch_fails_on_missing_column() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    fs::write(root.join("reviews.csv"), REVIEWS).unwrap();

    absa(root)
        .args(["batch", "--input", "reviews.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Column 'text' not found"));
}
