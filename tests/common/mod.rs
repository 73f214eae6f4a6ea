use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
    /// Activity log the command wrote to.
    pub activity_path: PathBuf,
}

impl CmdResult {
    /// Parse stdout as one JSON document.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(self.stdout.trim()).unwrap_or_else(|e| {
            panic!(
                "stdout is not JSON ({e}); log: {}",
                self.log_path.display()
            )
        })
    }

    /// Event names recorded in the activity log, in order.
    pub fn activity_events(&self) -> Vec<String> {
        let Ok(raw) = fs::read_to_string(&self.activity_path) else {
            return Vec::new();
        };
        raw.lines()
            .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
            .filter_map(|v| v["event"].as_str().map(str::to_string))
            .collect()
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_c2s") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "c2s.exe" } else { "c2s" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve c2s binary path for integration test"),
    }
}

/// Scratch directory for one case; used as `$HOME` so no user config leaks in.
pub fn case_dir(case_name: &str) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("c2s-test-logs")
        .join(format!("{}-{}", sanitize(case_name), now_millis()));
    fs::create_dir_all(&dir).expect("create case dir");
    dir
}

pub fn run_cli_case(case_name: &str, args: &[&str]) -> CmdResult {
    run_cli_case_with_env(case_name, args, &[])
}

pub fn run_cli_case_with_env(case_name: &str, args: &[&str], env: &[(&str, &str)]) -> CmdResult {
    let dir = case_dir(case_name);
    run_in_dir(case_name, &dir, args, env)
}

pub fn run_in_dir(case_name: &str, dir: &Path, args: &[&str], env: &[(&str, &str)]) -> CmdResult {
    let log_path = dir.join("case.log");
    let activity_path = dir.join("activity.jsonl");
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command
        .args(args)
        .env("HOME", dir)
        .env("C2S_ACTIVITY_LOG", &activity_path)
        .env("C2S_ACTIONS_LATENCY_MS", "0")
        .env_remove("C2S_OUTPUT_FORMAT")
        .env("RUST_BACKTRACE", "1");
    for (key, value) in env {
        command.env(key, value);
    }
    let output = command.output().expect("execute c2s command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
        activity_path,
    }
}
