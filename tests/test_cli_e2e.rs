mod common;

use common::{InvisibleCostProcess, stderr, stdout};

// ============================================================================
// version / completions
// ============================================================================

#[test]
fn version_human() {
    let output = InvisibleCostProcess::spawn_command(&["version"]);
    assert!(output.status.success(), "version should exit 0: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("invisible-cost"), "{text}");
    assert!(text.contains(env!("CARGO_PKG_VERSION")), "{text}");
}

#[test]
fn version_json() {
    let output = InvisibleCostProcess::spawn_command(&["version", "--format", "json"]);
    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("version JSON should be valid");
    assert_eq!(parsed["name"], "invisible-cost");
    assert!(parsed.get("target").is_some());
}

#[test]
fn completions_bash() {
    let output = InvisibleCostProcess::spawn_command(&["completions", "bash"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("invisible-cost"));
}

#[test]
fn completions_zsh() {
    let output = InvisibleCostProcess::spawn_command(&["completions", "zsh"]);
    assert!(output.status.success());
    assert!(!stdout(&output).is_empty());
}

// ============================================================================
// phases
// ============================================================================

#[test]
fn phases_builtin_timeline() {
    let output = InvisibleCostProcess::spawn_command(&["phases"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("industry_selection"), "{text}");
    assert!(text.contains("call_to_action"), "{text}");
    assert!(text.contains("10 active phases"), "{text}");
}

#[test]
fn phases_json_from_config() {
    let config = InvisibleCostProcess::fixture_path("short_timeline.yaml");
    let output = InvisibleCostProcess::spawn_command(&[
        "phases",
        "--config",
        config.to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    let rows: Vec<serde_json::Value> = serde_json::from_str(&stdout(&output)).unwrap();
    let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["waiting", "welcome", "choose", "reveal", "complete"]);
}

// ============================================================================
// cost
// ============================================================================

#[test]
fn cost_human_report() {
    let output = InvisibleCostProcess::spawn_command(&[
        "cost",
        "--category",
        "ticket-processing",
        "--volume",
        "5000",
        "--hourly-rate",
        "75",
        "--overhead",
        "2.5",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("$465,000"), "{text}");
    assert!(text.contains("Savings at 30% reduction"), "{text}");
}

#[test]
fn cost_json_report() {
    let output = InvisibleCostProcess::spawn_command(&[
        "cost",
        "--category",
        "finance",
        "--volume",
        "2000",
        "--reduction",
        "0.5",
        "--format",
        "json",
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let total = report["breakdown"]["total_cost"].as_f64().unwrap();
    let annual = report["savings"]["annual_savings"].as_f64().unwrap();
    assert!(total > 0.0);
    assert!((annual - total * 0.5).abs() < 1e-6);
}

#[test]
fn cost_requires_category() {
    let output = InvisibleCostProcess::spawn_command(&["cost", "--volume", "10"]);
    assert_eq!(output.status.code(), Some(64));
    assert!(stderr(&output).contains("--category"));
}

#[test]
fn cost_rejects_unknown_category() {
    let output =
        InvisibleCostProcess::spawn_command(&["cost", "--category", "ticketing", "--volume", "10"]);
    assert_eq!(output.status.code(), Some(6), "{}", stderr(&output));
}

#[test]
fn cost_rejects_negative_volume() {
    let output =
        InvisibleCostProcess::spawn_command(&["cost", "--category", "it", "--volume", "-5"]);
    assert_eq!(output.status.code(), Some(6), "{}", stderr(&output));
}

#[test]
fn cost_rejects_overhead_below_one() {
    let output = InvisibleCostProcess::spawn_command(&[
        "cost",
        "--category",
        "it",
        "--volume",
        "5",
        "--overhead",
        "0.5",
    ]);
    assert_eq!(output.status.code(), Some(6), "{}", stderr(&output));
}

// ============================================================================
// validate
// ============================================================================

#[test]
fn validate_accepts_good_config() {
    let config = InvisibleCostProcess::fixture_path("short_timeline.yaml");
    let output = InvisibleCostProcess::spawn_command(&["validate", config.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).starts_with("ok"));
}

#[test]
fn validate_reports_every_error() {
    let config = InvisibleCostProcess::fixture_path("invalid.yaml");
    let output = InvisibleCostProcess::spawn_command(&[
        "validate",
        config.to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert_eq!(output.status.code(), Some(2));
    let reports: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let errors = reports[0]["errors"].as_array().unwrap();
    assert!(errors.len() >= 3, "{errors:?}");
    assert_eq!(reports[0]["valid"], false);
}

#[test]
fn validate_rejects_out_of_range_tick_rate() {
    let config = InvisibleCostProcess::fixture_path("tick_too_fast.yaml");
    let output = InvisibleCostProcess::spawn_command(&["validate", config.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("experience.tick_hz"));
}

#[test]
fn validate_strict_fails_on_warnings() {
    let config = InvisibleCostProcess::fixture_path("warnings.yaml");
    let path = config.to_str().unwrap();

    let lenient = InvisibleCostProcess::spawn_command(&["validate", path]);
    assert!(lenient.status.success(), "{}", stderr(&lenient));
    assert!(stdout(&lenient).contains("warning"));

    let strict = InvisibleCostProcess::spawn_command(&["validate", "--strict", path]);
    assert_eq!(strict.status.code(), Some(2));
}

#[test]
fn validate_missing_file() {
    let output = InvisibleCostProcess::spawn_command(&["validate", "/no/such/file.yaml"]);
    assert_eq!(output.status.code(), Some(2));
}

// ============================================================================
// usage
// ============================================================================

#[test]
fn unknown_subcommand_is_usage_error() {
    let output = InvisibleCostProcess::spawn_command(&["dance"]);
    assert_eq!(output.status.code(), Some(2));
}
