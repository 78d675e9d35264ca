use std::fs;
use std::process::Command;

fn grim_audit() -> Command {
    Command::new(env!("CARGO_BIN_EXE_grim-audit"))
}

#[test]
fn check_prints_json_record() {
    let output = grim_audit()
        .args(["check", "--n", "18", "--mean", "3.44", "--sd", "2.47", "--json"])
        .output()
        .expect("run grim-audit check");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(stdout.contains("\"verdict\":\"GRIMMER_INCONSISTENT\""));
}

#[test]
fn check_reads_options_file() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let config = temp.path().join("opts.yaml");
    fs::write(&config, "exact_threshold: 5\n").expect("write config");
    let output = grim_audit()
        .args(["check", "--n", "10", "--mean", "3.20", "--sd", "1.48", "--config"])
        .arg(&config)
        .output()
        .expect("run grim-audit check");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(stdout.starts_with("CONSISTENT"));
    assert!(stdout.contains("exact-search threshold"));
}

#[test]
fn negative_decimals_fail() {
    let status = grim_audit()
        .args(["check", "--n", "10", "--mean", "3.40", "--decimals", "-2"])
        .status()
        .expect("run grim-audit check");
    assert!(!status.success());
}

#[test]
fn batch_writes_report_and_summary() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let input = temp.path().join("rows.csv");
    fs::write(
        &input,
        "n,mean,sd,label\n10,3.40,2.07,ok\n10,3.45,,grim\n0,3.00,,bad\n",
    )
    .expect("write input");
    let out = temp.path().join("out");
    let status = grim_audit()
        .args(["batch", "--concurrency", "2", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .status()
        .expect("run grim-audit batch");
    assert!(status.success());
    assert!(out.join("batch_report.json").exists());

    let mut reader = csv::Reader::from_path(out.join("batch_summary.csv")).expect("summary");
    let statuses: Vec<String> = reader
        .records()
        .map(|record| record.expect("record")[2].to_string())
        .collect();
    assert_eq!(statuses, vec!["CONSISTENT", "GRIM_INCONSISTENT", "ERROR"]);
}

#[test]
fn check_accepts_unbounded_lower_scale() {
    let output = grim_audit()
        .args([
            "check",
            "--n",
            "10",
            "--mean",
            "3.40",
            "--scale-min",
            "none",
            "--json",
        ])
        .output()
        .expect("run grim-audit check");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(stdout.contains("\"scale\":{\"max\":null,\"min\":null}"));
}
