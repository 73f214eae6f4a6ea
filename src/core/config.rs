//! Configuration system: TOML file + env var overrides + defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::core::errors::{DashError, Result};
use crate::panel::window::{TimeWindow, WindowAnchor};
use crate::panels::{DEFAULT_DATE_FORMAT, PanelKind, RenderContext};

/// Upper bound for the simulated collaborator latency.
pub const MAX_LATENCY_MS: u64 = 10_000;
/// Fastest dashboard tick.
pub const MIN_REFRESH_MS: u64 = 100;

/// Full c2s configuration model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub windowing: WindowingConfig,
    pub actions: ActionsConfig,
    pub paths: PathsConfig,
    pub dashboard: DashboardConfig,
}

/// How panels lay out their rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Overrides every panel's own card-view row count.
    pub card_rows: Option<usize>,
    pub full_page: bool,
    pub no_color: bool,
    /// `chrono` strftime pattern.
    pub date_format: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WindowingConfig {
    pub default_window: TimeWindow,
    pub anchor: WindowAnchor,
}

/// Stub collaborator behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ActionsConfig {
    pub simulated_latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    /// JSONL activity log.
    pub activity_log: PathBuf,
}

/// Interactive dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DashboardConfig {
    pub refresh_ms: u64,
    pub start_panel: PanelKind,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            card_rows: None,
            full_page: false,
            no_color: false,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            simulated_latency_ms: 800,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!("[C2S-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        Self {
            config_file: home_dir.join(".config").join("c2s").join("config.toml"),
            activity_log: home_dir
                .join(".local")
                .join("share")
                .join("c2s")
                .join("activity.jsonl"),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_ms: 1_000,
            start_panel: PanelKind::Traceability,
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// A missing file at the default path yields defaults; a missing explicit
    /// path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, env_var)
    }

    /// [`Config::load`] with a custom environment lookup.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| DashError::Io {
                path: path_buf.clone(),
                source,
            })?;
            toml::from_str::<Self>(&raw)?
        } else if path.is_some() {
            return Err(DashError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };
        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(lookup)?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Deterministic FNV-1a hash of the effective config, for logging.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    /// Render settings for a given wall-clock date.
    #[must_use]
    pub fn render_context(&self, today: NaiveDate) -> RenderContext {
        RenderContext {
            today,
            anchor: self.windowing.anchor,
            default_window: self.windowing.default_window,
            card_rows: self.display.card_rows,
            date_format: self.display.date_format.clone(),
        }
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut get = |name: &str| lookup(name).filter(|raw| !raw.trim().is_empty());

        if let Some(raw) = get("C2S_DISPLAY_CARD_ROWS") {
            self.display.card_rows = Some(parse_env("C2S_DISPLAY_CARD_ROWS", &raw)?);
        }
        if let Some(raw) = get("C2S_DISPLAY_FULL_PAGE") {
            self.display.full_page = parse_env("C2S_DISPLAY_FULL_PAGE", &raw)?;
        }
        if let Some(raw) = get("C2S_DISPLAY_NO_COLOR") {
            self.display.no_color = parse_env("C2S_DISPLAY_NO_COLOR", &raw)?;
        }
        if let Some(raw) = get("C2S_DISPLAY_DATE_FORMAT") {
            self.display.date_format = raw;
        }
        if let Some(raw) = get("C2S_WINDOW_DEFAULT") {
            self.windowing.default_window = raw.parse()?;
        }
        if let Some(raw) = get("C2S_WINDOW_ANCHOR") {
            self.windowing.anchor = raw.parse()?;
        }
        if let Some(raw) = get("C2S_ACTIONS_LATENCY_MS") {
            self.actions.simulated_latency_ms = parse_env("C2S_ACTIONS_LATENCY_MS", &raw)?;
        }
        if let Some(raw) = get("C2S_ACTIVITY_LOG") {
            self.paths.activity_log = PathBuf::from(raw);
        }
        if let Some(raw) = get("C2S_DASHBOARD_REFRESH_MS") {
            self.dashboard.refresh_ms = parse_env("C2S_DASHBOARD_REFRESH_MS", &raw)?;
        }
        if let Some(raw) = get("C2S_DASHBOARD_START_PANEL") {
            self.dashboard.start_panel = raw.parse()?;
        }
        Ok(())
    }

    /// Clamp tunables into their supported ranges.
    fn normalize(&mut self) {
        self.actions.simulated_latency_ms = self.actions.simulated_latency_ms.min(MAX_LATENCY_MS);
        self.dashboard.refresh_ms = self.dashboard.refresh_ms.max(MIN_REFRESH_MS);
    }

    pub fn validate(&self) -> Result<()> {
        if self.display.card_rows == Some(0) {
            return Err(DashError::InvalidConfig {
                details: "display.card_rows must be >= 1".to_string(),
            });
        }
        let format = self.display.date_format.trim();
        if format.is_empty() || StrftimeItems::new(format).any(|i| matches!(i, Item::Error)) {
            return Err(DashError::InvalidConfig {
                details: format!(
                    "display.date_format {:?} is not a valid strftime pattern",
                    self.display.date_format
                ),
            });
        }
        if self.actions.simulated_latency_ms > MAX_LATENCY_MS {
            return Err(DashError::InvalidConfig {
                details: format!(
                    "actions.simulated_latency_ms must be <= {MAX_LATENCY_MS}, got {}",
                    self.actions.simulated_latency_ms
                ),
            });
        }
        if self.dashboard.refresh_ms < MIN_REFRESH_MS {
            return Err(DashError::InvalidConfig {
                details: format!(
                    "dashboard.refresh_ms must be >= {MIN_REFRESH_MS}, got {}",
                    self.dashboard.refresh_ms
                ),
            });
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| DashError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}
