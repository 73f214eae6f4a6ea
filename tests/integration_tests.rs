//! Integration tests: CLI smoke tests and full-pipeline scenarios driven
//! through the public library API.

mod common;

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::Value;

use c2s_dashboard::core::config::Config;
use c2s_dashboard::logger::ActivityLog;
use c2s_dashboard::logger::jsonl::{EventType, read_entries};
use c2s_dashboard::panel::action::{
    ActionKind, ActionOutcome, ActionRequest, ActionRunner, ActionSlot, ActionState,
    Collaborator,
};
use c2s_dashboard::prelude::{DashError, PanelKind, PanelQuery, RenderContext, Workspace};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 10).unwrap()
}

// ──────────────────── CLI smoke tests ────────────────────

#[test]
fn help_command_prints_usage() {
    let result = common::run_cli_case("help_command_prints_usage", &["--help"]);
    assert!(
        result.status.success(),
        "expected success; log: {}",
        result.log_path.display()
    );
    assert!(
        result.stdout.contains("Usage: c2s [OPTIONS] <COMMAND>"),
        "missing help banner; log: {}",
        result.log_path.display()
    );
}

#[test]
fn version_command_prints_version() {
    let result = common::run_cli_case("version_command_prints_version", &["--version"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(
        result.stdout.contains("c2s"),
        "missing version output; log: {}",
        result.log_path.display()
    );
}

#[test]
fn subcommand_help_flags_work() {
    for sub in [
        "panels",
        "show",
        "graph",
        "tree",
        "action",
        "validate-function",
        "config",
        "dashboard",
        "completions",
    ] {
        let result = common::run_cli_case(&format!("help_{sub}"), &[sub, "--help"]);
        assert!(
            result.status.success(),
            "{sub} --help failed; log: {}",
            result.log_path.display()
        );
    }
}

#[test]
fn panels_lists_every_panel_as_json() {
    let result = common::run_cli_case("panels_json", &["panels", "--json"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let json = result.json();
    let panels = json["panels"].as_array().unwrap();
    assert_eq!(panels.len(), 12);
    assert_eq!(panels[0]["panel"], "traceability");
    assert_eq!(panels[9]["actions"], serde_json::json!(["generate_report", "schedule_report"]));
    assert_eq!(panels[11]["panel"], "historical-comparison");
}

#[test]
fn show_filters_rows_but_not_tiles() {
    let all = common::run_cli_case(
        "show_traceability_all",
        &["--today", "2025-04-10", "show", "traceability", "--full-page"],
    );
    let partial = common::run_cli_case(
        "show_traceability_partial",
        &[
            "--today",
            "2025-04-10",
            "show",
            "1",
            "--status",
            "partial",
            "--full-page",
        ],
    );
    assert!(all.status.success(), "log: {}", all.log_path.display());
    assert!(partial.status.success(), "log: {}", partial.log_path.display());

    let all = all.json();
    let partial = partial.json();
    assert_eq!(all["view"]["tiles"], partial["view"]["tiles"]);
    assert_eq!(all["view"]["rows"].as_array().unwrap().len(), 10);
    let ids: Vec<&str> = partial["view"]["rows"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["id"].as_str())
        .collect();
    assert!(ids.contains(&"t5"));
    assert!(!ids.contains(&"t1"));
}

#[test]
fn show_collapse_overrides_expand_all() {
    let result = common::run_cli_case(
        "show_capabilities_collapse",
        &[
            "show",
            "capabilities",
            "--full-page",
            "--expand-all",
            "--collapse",
            "c1",
        ],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let json = result.json();
    let rows = json["view"]["rows"].as_array().unwrap();
    let expanded = |id: &str| rows.iter().find(|r| r["id"] == id).map(|r| r["expanded"].clone());
    assert_eq!(expanded("c1"), Some(serde_json::json!(false)));
    assert_eq!(expanded("c2"), Some(serde_json::json!(true)));
    assert!(rows.iter().all(|r| !r["id"].as_str().unwrap_or("").starts_with("c1-")));
}

#[test]
fn show_historical_comparison_against_baseline() {
    let result = common::run_cli_case(
        "show_historical_baseline",
        &[
            "--today",
            "2025-04-10",
            "show",
            "historical",
            "--tab",
            "coverage",
            "--category",
            "baseline",
            "--window",
            "all",
        ],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let json = result.json();
    let view = &json["view"];
    assert_eq!(view["panel"], "historical-comparison");
    assert_eq!(view["rows"].as_array().unwrap().len(), 4);
    let change = view["tiles"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["label"] == "Change")
        .map(|t| t["value"].clone());
    assert_eq!(change, Some(serde_json::json!("+11.4%")));
}

#[test]
fn show_temporal_metrics_rejects_unknown_granularity() {
    let result = common::run_cli_case(
        "show_temporal_bad_tab",
        &["show", "temporal-metrics", "--tab", "hourly"],
    );
    assert_eq!(result.status.code(), Some(1));
}

#[test]
fn show_records_panel_render_in_activity_log() {
    let result = common::run_cli_case("show_logs_render", &["show", "security"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let events = result.activity_events();
    assert_eq!(events.first().map(String::as_str), Some("config_loaded"));
    assert!(events.contains(&"panel_rendered".to_string()));
}

#[test]
fn show_human_output_has_title_and_counts() {
    let result = common::run_cli_case_with_env(
        "show_human",
        &["--no-color", "show", "capabilities"],
        &[("C2S_OUTPUT_FORMAT", "human")],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("Business Capability Map"));
    assert!(result.stdout.contains("70%"));
    assert!(!result.stdout.contains('\u{1b}'), "color leaked with --no-color");
}

#[test]
fn unknown_panel_exits_with_user_error() {
    let result = common::run_cli_case("unknown_panel", &["show", "nope"]);
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("C2S-2001"));
}

#[test]
fn invalid_facet_value_is_rejected() {
    let result = common::run_cli_case("invalid_facet", &["show", "security", "--status", "bogus"]);
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("C2S-2002"));
}

#[test]
fn graph_reports_neighborhood() {
    let result = common::run_cli_case("graph_login", &["graph", "pages/Login.tsx"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let hood = &result.json()["neighborhood"];
    assert_eq!(hood["selected"], "pages/Login.tsx");
    assert_eq!(hood["nodes"].as_array().unwrap().len(), 7);
    assert_eq!(hood["edges"].as_array().unwrap().len(), 6);
}

#[test]
fn graph_outside_group_is_unknown_record() {
    let result = common::run_cli_case(
        "graph_outside_group",
        &["graph", "api/auth.ts", "--group", "hooks"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("C2S-2004"));
}

#[test]
fn tree_search_keeps_ancestors() {
    let result = common::run_cli_case("tree_search", &["tree", "--search", "users"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let json = result.json();
    let text = json["nodes"].to_string();
    assert!(text.contains("/src/pages/api/users.ts"));
    assert!(!text.contains("Button.tsx"));
}

#[test]
fn action_runs_to_completion_and_logs() {
    let result = common::run_cli_case("action_export", &["action", "security", "export"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let json = result.json();
    assert_eq!(json["state"]["state"], "success");
    let events = result.activity_events();
    assert!(events.contains(&"action_started".to_string()));
    assert!(events.contains(&"action_completed".to_string()));
}

#[test]
fn action_not_offered_by_panel_is_rejected() {
    let result = common::run_cli_case("action_not_offered", &["action", "files", "export"]);
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
}

#[test]
fn schedule_without_recipients_reports_field_errors() {
    let result = common::run_cli_case(
        "schedule_missing_fields",
        &["action", "reports", "schedule-report"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    let json = result.json();
    assert_eq!(json["valid"], false);
    let fields: Vec<&str> = json["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"frequency"));
    assert!(fields.contains(&"recipients"));
    assert!(result.activity_events().contains(&"validation_failed".to_string()));
}

#[test]
fn schedule_with_valid_fields_succeeds() {
    let result = common::run_cli_case(
        "schedule_valid",
        &[
            "action",
            "reports",
            "schedule_report",
            "--frequency",
            "weekly",
            "--recipients",
            "lead@example.com, qa@example.com",
            "--name",
            "Weekly digest",
        ],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let value = &result.json()["state"]["value"]["data"];
    assert_eq!(value["name"], "Weekly digest");
    assert_eq!(value["recipients"].as_array().unwrap().len(), 2);
}

#[test]
fn validate_function_reports_each_field() {
    let dir = common::case_dir("validate_function_files");
    let good = dir.join("good.json");
    let bad = dir.join("bad.json");
    fs::write(
        &good,
        r#"{"name":"score","inputs":[{"name":"path","type":"string"}],"outputs":[],"code_language":"python","implementation":"return 1"}"#,
    )
    .unwrap();
    fs::write(
        &bad,
        r#"{"name":"","inputs":[{"name":"","type":"blob"}],"code_language":"cobol"}"#,
    )
    .unwrap();

    let ok = common::run_in_dir("validate_good", &dir, &["validate-function", good.to_str().unwrap()], &[]);
    assert!(ok.status.success(), "log: {}", ok.log_path.display());
    assert_eq!(ok.json()["valid"], true);

    let err = common::run_in_dir("validate_bad", &dir, &["validate-function", bad.to_str().unwrap()], &[]);
    assert_eq!(err.status.code(), Some(1), "log: {}", err.log_path.display());
    let errors = err.json()["errors"].clone();
    let fields: Vec<String> = errors
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str().map(str::to_string))
        .collect();
    for field in ["name", "inputs[0].name", "inputs[0].type", "code_language", "implementation"] {
        assert!(fields.iter().any(|f| f == field), "missing {field} in {fields:?}");
    }
}

#[test]
fn config_validate_reports_hash_and_rejects_bad_values() {
    let dir = common::case_dir("config_validate");
    let good = dir.join("good.toml");
    fs::write(&good, "[display]\ncard_rows = 4\n\n[windowing]\ndefault_window = \"6m\"\n").unwrap();
    let ok = common::run_in_dir(
        "config_validate_good",
        &dir,
        &["--config", good.to_str().unwrap(), "config", "validate"],
        &[],
    );
    assert!(ok.status.success(), "log: {}", ok.log_path.display());
    let json = ok.json();
    assert_eq!(json["valid"], true);
    assert_eq!(json["hash"].as_str().map(str::len), Some(16));

    let bad = dir.join("bad.toml");
    fs::write(&bad, "[display]\ncard_rows = 0\n").unwrap();
    let err = common::run_in_dir(
        "config_validate_bad",
        &dir,
        &["--config", bad.to_str().unwrap(), "config", "validate"],
        &[],
    );
    assert_eq!(err.status.code(), Some(1), "log: {}", err.log_path.display());
    assert_eq!(err.json()["code"], "C2S-1001");
}

#[test]
fn env_override_changes_effective_config() {
    let result = common::run_cli_case_with_env(
        "config_show_env",
        &["config", "show"],
        &[("C2S_DASHBOARD_START_PANEL", "graph")],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert_eq!(result.json()["config"]["dashboard"]["start_panel"], "code-graph");
}

#[test]
fn missing_explicit_config_is_an_error() {
    let result = common::run_cli_case(
        "config_missing",
        &["--config", "/nonexistent/c2s.toml", "show", "rules"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("C2S-1002"));
}

#[test]
fn dashboard_requires_a_terminal() {
    let result = common::run_cli_case("dashboard_no_tty", &["dashboard"]);
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("interactive terminal"));
}

#[test]
fn completions_generate_for_bash() {
    let result = common::run_cli_case("completions_bash", &["completions", "bash"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("c2s"));
}

// ──────────────────── pipeline scenarios ────────────────────

#[test]
fn config_drives_render_context() {
    let cfg = Config::load_with(None, |name| match name {
        "C2S_DISPLAY_CARD_ROWS" => Some("2".to_string()),
        "C2S_WINDOW_DEFAULT" => Some("1y".to_string()),
        _ => None,
    })
    .unwrap();
    let ctx = cfg.render_context(today());
    let view = Workspace::seeded(today())
        .render(PanelKind::Traceability, &PanelQuery::default(), &ctx)
        .unwrap();
    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.total, 10);
}

#[test]
fn every_panel_serializes_to_json() {
    let ws = Workspace::seeded(today());
    let ctx = RenderContext::at(today());
    for kind in PanelKind::ALL {
        let view = ws.render(kind, &PanelQuery::default().full_page(), &ctx).unwrap();
        let json: Value = serde_json::to_value(&view).unwrap();
        assert_eq!(json["panel"], kind.token());
        assert!(json["tiles"].is_array());
    }
}

/// Fails the first call, then succeeds.
struct Flaky {
    calls: AtomicUsize,
}

impl Collaborator for Flaky {
    fn perform(&self, request: &ActionRequest) -> c2s_dashboard::core::errors::Result<ActionOutcome> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(DashError::ActionFailed {
                action: "sync_integration",
                details: "upstream unavailable".to_string(),
            });
        }
        Ok(ActionOutcome {
            message: format!("{} ok", request.kind),
            data: Value::Null,
        })
    }
}

#[test]
fn failed_action_can_be_retried() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("activity.jsonl");
    let runner = ActionRunner::new(
        Arc::new(Flaky {
            calls: AtomicUsize::new(0),
        }),
        ActivityLog::open(Some(path.clone())),
    );
    let mut slot = ActionSlot::new();
    let request = ActionRequest::new("configuration", ActionKind::SyncIntegration, Value::Null);

    runner
        .run_to_completion(&mut slot, request.clone(), Duration::from_secs(5))
        .unwrap();
    match slot.state() {
        ActionState::Failure { error } => {
            assert_eq!(error.code, "C2S-3001");
            assert!(error.retryable);
        }
        other => panic!("expected failure, got {}", other.label()),
    }

    runner
        .run_to_completion(&mut slot, request, Duration::from_secs(5))
        .unwrap();
    assert_eq!(slot.state().label(), "success");

    let events: Vec<EventType> = read_entries(&path).unwrap().iter().map(|e| e.event).collect();
    assert_eq!(
        events,
        vec![
            EventType::ActionStarted,
            EventType::ActionFailed,
            EventType::ActionStarted,
            EventType::ActionCompleted,
        ]
    );
}
