//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell as CompletionShell, generate};
use colored::{ColoredString, Colorize, control};
use serde_json::{Value, json};
use thiserror::Error;

use c2s_dashboard::core::config::{Config, MAX_LATENCY_MS, MIN_REFRESH_MS};
use c2s_dashboard::core::errors::DashError;
use c2s_dashboard::logger::ActivityLog;
use c2s_dashboard::panel::badge::Tone;
use c2s_dashboard::panel::action::{
    ActionKind, ActionRequest, ActionRunner, ActionSlot, ActionState, StubCollaborator,
};
use c2s_dashboard::panel::form::ValidationErrors;
use c2s_dashboard::panel::query::Facet;
use c2s_dashboard::panel::window::TimeWindow;
use c2s_dashboard::panels::functions::FunctionDraft;
use c2s_dashboard::panels::report::{ReportPanel, ReportRequest, ScheduleRequest};
use c2s_dashboard::panels::{PanelKind, PanelQuery, PanelView, RenderContext, Workspace};
use c2s_dashboard::tui::render::{Line, view_lines};
use c2s_dashboard::tui::theme::{AccessibilityProfile, Theme};
use c2s_dashboard::tui::{DashboardRuntimeConfig, run_dashboard};

/// Width used for human output when stdout is not a terminal.
const FALLBACK_WIDTH: usize = 120;

/// c2s: code-to-specification dashboard panels in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "c2s",
    author,
    version,
    about = "Code-to-specification analysis dashboard",
    long_about = None,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Override config file path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Force JSON output mode.
    #[arg(long, global = true)]
    json: bool,
    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Increase verbosity.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Quiet mode (errors only).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Render as of this date (YYYY-MM-DD) instead of today.
    #[arg(long, global = true, value_name = "DATE")]
    today: Option<String>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// List every panel with its number and actions.
    Panels,
    /// Render one panel.
    Show(ShowArgs),
    /// Highlight a module and its direct neighbors in the dependency graph.
    Graph(GraphArgs),
    /// Print the file tree, optionally filtered by a search term.
    Tree(TreeArgs),
    /// Run a panel action through the collaborator and wait for its result.
    Action(ActionArgs),
    /// Check a function definition file (JSON) for field errors.
    ValidateFunction(ValidateFunctionArgs),
    /// View and check configuration.
    Config(ConfigArgs),
    /// Interactive dashboard.
    Dashboard(DashboardArgs),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Filter, sort and layout flags shared by commands that render a panel.
#[derive(Debug, Clone, Args, Default)]
struct QueryArgs {
    /// Case-insensitive search text.
    #[arg(long, short = 's', default_value = "")]
    search: String,
    /// Category facet value (`all` for every category).
    #[arg(long)]
    category: Option<String>,
    /// Status facet value (`all` for every status).
    #[arg(long)]
    status: Option<String>,
    /// Column to sort by. Repeat a column to reverse it.
    #[arg(long = "sort", value_name = "COLUMN")]
    sort: Vec<String>,
    /// Time window: 1m, 3m, 6m, 1y or all.
    #[arg(long, value_name = "WINDOW")]
    window: Option<String>,
    /// Tab to show on tabbed panels.
    #[arg(long)]
    tab: Option<String>,
    /// Expand a row by id. Repeatable.
    #[arg(long, value_name = "ID")]
    expand: Vec<String>,
    /// Expand every row.
    #[arg(long)]
    expand_all: bool,
    /// Collapse a row that is open by default. Repeatable.
    #[arg(long, value_name = "ID")]
    collapse: Vec<String>,
    /// Show every row instead of the card view.
    #[arg(long)]
    full_page: bool,
    /// Show secret values unmasked.
    #[arg(long)]
    reveal_secrets: bool,
    /// Selected graph node or file.
    #[arg(long, value_name = "ID")]
    focus: Option<String>,
    /// File the explorer marks as selected.
    #[arg(long, value_name = "PATH")]
    file: Option<String>,
    /// Directory the explorer opens.
    #[arg(long, value_name = "PATH")]
    directory: Option<String>,
}

#[derive(Debug, Clone, Args)]
struct ShowArgs {
    /// Panel name, alias or number (1-12).
    panel: String,
    #[command(flatten)]
    query: QueryArgs,
}

#[derive(Debug, Clone, Args)]
struct GraphArgs {
    /// Module to highlight.
    node: String,
    /// Restrict the graph to one group (entry points stay visible).
    #[arg(long, default_value = "all")]
    group: String,
}

#[derive(Debug, Clone, Args, Default)]
struct TreeArgs {
    /// Keep files whose name contains this text, plus their ancestors.
    #[arg(long, short = 's', default_value = "")]
    search: String,
    /// File to mark as selected.
    #[arg(long, value_name = "PATH")]
    file: Option<String>,
    /// Directory to open.
    #[arg(long, value_name = "PATH")]
    directory: Option<String>,
    /// Open every directory.
    #[arg(long)]
    expand_all: bool,
}

/// Report form fields for `generate_report` and `schedule_report`.
#[derive(Debug, Clone, Args, Default)]
struct ReportArgs {
    /// Report type: summary, detailed, executive or custom.
    #[arg(long, value_name = "TYPE")]
    report_type: Option<String>,
    /// File format: pdf, excel, csv, json or html.
    #[arg(long)]
    format: Option<String>,
    /// Section to include. Repeatable; replaces the default selection.
    #[arg(long = "section", value_name = "ID")]
    sections: Vec<String>,
    /// Report name.
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Delivery frequency for schedules.
    #[arg(long)]
    frequency: Option<String>,
    /// Comma separated recipient addresses for schedules.
    #[arg(long, default_value = "")]
    recipients: String,
}

#[derive(Debug, Clone, Args)]
struct ActionArgs {
    /// Panel offering the action.
    panel: String,
    /// Action: refresh, export, generate_report, schedule_report, run_tests, sync_integration.
    kind: String,
    #[command(flatten)]
    query: QueryArgs,
    #[command(flatten)]
    report: ReportArgs,
    /// Override the simulated collaborator latency, capped like the config value.
    #[arg(long, value_name = "MILLISECONDS")]
    latency_ms: Option<u64>,
    /// Give up waiting after this long.
    #[arg(long, default_value_t = 30_000, value_name = "MILLISECONDS")]
    timeout_ms: u64,
}

#[derive(Debug, Clone, Args)]
struct ValidateFunctionArgs {
    /// JSON file with name, inputs, outputs, code_language and implementation.
    file: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand)]
enum ConfigCommand {
    /// Print the config file path.
    Path,
    /// Print the effective configuration.
    Show,
    /// Load and validate the configuration.
    Validate,
}

#[derive(Debug, Clone, Args, Default)]
struct DashboardArgs {
    /// Refresh interval; defaults to the configured value.
    #[arg(long, value_name = "MILLISECONDS")]
    refresh_ms: Option<u64>,
    /// Panel to open first.
    #[arg(long)]
    panel: Option<String>,
    /// Start every panel in full-page layout.
    #[arg(long)]
    full_page: bool,
}

#[derive(Debug, Clone, Args)]
struct CompletionsArgs {
    /// Shell to generate completion script for.
    #[arg(value_enum)]
    shell: CompletionShell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Human,
    Json,
}

/// CLI error type with explicit exit-code mapping.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid user input at runtime.
    #[error("{0}")]
    User(String),
    /// Environment/runtime failure.
    #[error("{0}")]
    Runtime(String),
    /// Internal bug or invariant violation.
    #[error("{0}")]
    Internal(String),
    /// JSON serialization failed.
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
    /// Output write failed.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::User(_) => 1,
            Self::Runtime(_) | Self::Io(_) => 2,
            Self::Internal(_) | Self::Json(_) => 3,
        }
    }
}

impl From<DashError> for CliError {
    fn from(err: DashError) -> Self {
        if err.is_user_error() {
            Self::User(err.to_string())
        } else {
            Self::Runtime(err.to_string())
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Panels => run_panels(cli),
        Command::Show(args) => run_show(cli, args),
        Command::Graph(args) => run_graph(cli, args),
        Command::Tree(args) => run_tree(cli, args),
        Command::Action(args) => run_action(cli, args),
        Command::ValidateFunction(args) => run_validate_function(cli, args),
        Command::Config(args) => run_config(cli, args),
        Command::Dashboard(args) => run_dashboard_command(cli, args),
        Command::Completions(args) => {
            let mut command = Cli::command();
            let binary_name = command.get_name().to_string();
            generate(args.shell, &mut command, binary_name, &mut io::stdout());
            Ok(())
        }
    }
}

// ──────────────────── shared context ────────────────────

struct Session {
    config: Config,
    log: ActivityLog,
    ctx: RenderContext,
}

impl Session {
    fn theme(&self, cli: &Cli) -> Theme {
        Theme::new(AccessibilityProfile::from_environment(
            cli.no_color || self.config.display.no_color,
        ))
    }
}

/// Load config, open the activity log and fix the render date.
fn session(cli: &Cli) -> Result<Session, CliError> {
    let config = Config::load(cli.config.as_deref())?;
    let log = ActivityLog::open(Some(config.paths.activity_log.clone()));
    let hash = config.stable_hash()?;
    let source = cli
        .config
        .clone()
        .unwrap_or_else(|| config.paths.config_file.clone());
    log.config_loaded(&source.to_string_lossy(), &hash);
    if cli.verbose {
        eprintln!("config: {} (hash {hash})", source.display());
        eprintln!("activity log: {} [{}]", config.paths.activity_log.display(), log.state());
    }

    let today = match &cli.today {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(DashError::from)?,
        None => chrono::Local::now().date_naive(),
    };
    let ctx = config.render_context(today);
    Ok(Session { config, log, ctx })
}

impl QueryArgs {
    fn to_query(&self, full_page_default: bool) -> Result<PanelQuery, CliError> {
        let mut query = PanelQuery::default().search(&self.search);
        if let Some(category) = &self.category {
            query = query.category(category);
        }
        if let Some(status) = &self.status {
            query = query.status(status);
        }
        for column in &self.sort {
            query = query.sort(column);
        }
        if let Some(raw) = &self.window {
            query = query.window(raw.parse::<TimeWindow>()?);
        }
        if let Some(tab) = &self.tab {
            query = query.tab(tab);
        }
        for id in &self.expand {
            query = query.expand(id);
        }
        query.collapse.clone_from(&self.collapse);
        query.expand_all = self.expand_all;
        query.reveal_secrets = self.reveal_secrets;
        query.props.full_page = self.full_page || full_page_default;
        query.focus.clone_from(&self.focus);
        query.props.file_path.clone_from(&self.file);
        query.props.directory_path.clone_from(&self.directory);
        Ok(query)
    }
}

fn parse_panel(raw: &str) -> Result<PanelKind, CliError> {
    if let Ok(n) = raw.trim().parse::<usize>() {
        return PanelKind::from_number(n).ok_or_else(|| {
            CliError::from(DashError::UnknownPanel {
                name: raw.to_string(),
            })
        });
    }
    Ok(raw.parse::<PanelKind>()?)
}

// ──────────────────── commands ────────────────────

fn run_panels(cli: &Cli) -> Result<(), CliError> {
    match output_mode(cli) {
        OutputMode::Human => {
            for kind in PanelKind::ALL {
                let actions: Vec<&str> = kind.actions().iter().map(|a| a.token()).collect();
                println!(
                    "{:>2}  {:<22} {:<42} {}",
                    kind.number(),
                    kind.token(),
                    kind.title(),
                    actions.join(", ").dimmed()
                );
            }
        }
        OutputMode::Json => {
            let panels: Vec<Value> = PanelKind::ALL
                .iter()
                .map(|kind| {
                    json!({
                        "number": kind.number(),
                        "panel": kind.token(),
                        "title": kind.title(),
                        "actions": kind.actions(),
                    })
                })
                .collect();
            write_json_line(&json!({ "command": "panels", "panels": panels }))?;
        }
    }
    Ok(())
}

fn run_show(cli: &Cli, args: &ShowArgs) -> Result<(), CliError> {
    let session = session(cli)?;
    let kind = parse_panel(&args.panel)?;
    let query = args.query.to_query(session.config.display.full_page)?;
    let workspace = Workspace::seeded(session.ctx.today);
    let view = workspace.render(kind, &query, &session.ctx)?;
    session
        .log
        .panel_rendered(kind.token(), view.rows.len(), view.total);
    emit_view(cli, &session, "show", &view)
}

fn run_graph(cli: &Cli, args: &GraphArgs) -> Result<(), CliError> {
    let session = session(cli)?;
    let workspace = Workspace::seeded(session.ctx.today);
    let hood = workspace
        .code_graph
        .neighborhood(&Facet::parse(&args.group), &args.node)?;

    match output_mode(cli) {
        OutputMode::Human => {
            println!("{} {}", "Selected:".bold(), hood.selected.cyan().bold());
            println!("{} {}", "Highlighted:".bold(), hood.nodes.join(", "));
            for edge in &hood.edges {
                println!("  {} → {}", edge.source, edge.target);
            }
            if hood.edges.is_empty() && !cli.quiet {
                println!("{}", "No edges touch this module.".dimmed());
            }
        }
        OutputMode::Json => {
            write_json_line(&json!({
                "command": "graph",
                "group": args.group,
                "neighborhood": hood,
            }))?;
        }
    }
    Ok(())
}

fn run_tree(cli: &Cli, args: &TreeArgs) -> Result<(), CliError> {
    let session = session(cli)?;
    let workspace = Workspace::seeded(session.ctx.today);
    let mut query = PanelQuery::default().search(&args.search);
    query.expand_all = args.expand_all;
    query.props.file_path.clone_from(&args.file);
    query.props.directory_path.clone_from(&args.directory);
    let view = workspace.render(PanelKind::Files, &query, &session.ctx)?;
    session
        .log
        .panel_rendered(PanelKind::Files.token(), view.rows.len(), view.total);

    match output_mode(cli) {
        OutputMode::Human => print_lines(&view_lines(&view, terminal_width(), None), session.theme(cli)),
        OutputMode::Json => {
            write_json_line(&json!({
                "command": "tree",
                "search": args.search,
                "matched": view.matched,
                "total": view.total,
                "nodes": workspace.files.filtered(&args.search),
            }))?;
        }
    }
    Ok(())
}

fn run_action(cli: &Cli, args: &ActionArgs) -> Result<(), CliError> {
    let session = session(cli)?;
    let panel = parse_panel(&args.panel)?;
    let kind = args.kind.parse::<ActionKind>()?;
    panel.check_action(kind)?;

    let query = args.query.to_query(session.config.display.full_page)?;
    // Reject a query the panel cannot render before bothering the collaborator.
    Workspace::seeded(session.ctx.today).render(panel, &query, &session.ctx)?;

    let payload = match kind {
        ActionKind::GenerateReport | ActionKind::ScheduleReport => {
            let (form, validated) = report_payload(kind, &query, &args.report)?;
            match validated {
                Ok(payload) => payload,
                Err(errors) => {
                    session.log.validation_failed(form, errors.len());
                    return Err(report_validation_errors(cli, form, &errors)?);
                }
            }
        }
        _ => query.to_payload(),
    };

    let latency = action_latency(args.latency_ms, &session.config);
    let runner = ActionRunner::new(
        Arc::new(StubCollaborator::new(latency)),
        session.log.clone(),
    );
    let mut slot = ActionSlot::new();
    if !cli.quiet && output_mode(cli) == OutputMode::Human {
        eprintln!("{}", kind.busy_label().dimmed());
    }
    runner.run_to_completion(
        &mut slot,
        ActionRequest::new(panel.token(), kind, payload),
        Duration::from_millis(args.timeout_ms),
    )?;

    match slot.state() {
        ActionState::Success { value } => match output_mode(cli) {
            OutputMode::Human => {
                println!("{} {}", "✓".green(), value.message);
                Ok(())
            }
            OutputMode::Json => write_json_line(&json!({
                "command": "action",
                "panel": panel.token(),
                "action": kind,
                "state": slot.state(),
            })),
        },
        ActionState::Failure { error } => Err(CliError::Runtime(error.to_string())),
        other => Err(CliError::Internal(format!(
            "action ended in state {}",
            other.label()
        ))),
    }
}

type ReportPayload = (&'static str, std::result::Result<Value, ValidationErrors>);

/// Simulated collaborator latency, with the same ceiling config loading applies.
fn action_latency(flag: Option<u64>, config: &Config) -> Duration {
    Duration::from_millis(
        flag.unwrap_or(config.actions.simulated_latency_ms)
            .min(MAX_LATENCY_MS),
    )
}

/// Report form from flags, validated. Flags override the panel's section
/// picker; without `--section` the query's expand ids toggle the defaults.
fn report_payload(
    kind: ActionKind,
    query: &PanelQuery,
    args: &ReportArgs,
) -> Result<ReportPayload, CliError> {
    let mut report: ReportRequest = ReportPanel::request_for(query)?;
    if let Some(report_type) = &args.report_type {
        report.report_type.clone_from(report_type);
    }
    if let Some(format) = &args.format {
        report.format.clone_from(format);
    }
    if !args.sections.is_empty() {
        report.sections.clone_from(&args.sections);
    }
    if let Some(name) = &args.name {
        report.name.clone_from(name);
    }
    if let Some(description) = &args.description {
        report.description.clone_from(description);
    }

    if kind == ActionKind::ScheduleReport {
        let schedule = ScheduleRequest {
            report,
            frequency: args.frequency.clone().unwrap_or_default(),
            recipients: args.recipients.clone(),
        };
        let validated = match schedule.validate() {
            Ok(valid) => Ok(serde_json::to_value(valid)?),
            Err(errors) => Err(errors),
        };
        return Ok(("schedule", validated));
    }
    let validated = match report.validate() {
        Ok(valid) => Ok(serde_json::to_value(valid)?),
        Err(errors) => Err(errors),
    };
    Ok(("report", validated))
}

/// Print field errors and build the error the command exits with.
fn report_validation_errors(
    cli: &Cli,
    form: &str,
    errors: &ValidationErrors,
) -> Result<CliError, CliError> {
    match output_mode(cli) {
        OutputMode::Human => {
            for e in errors.iter() {
                eprintln!("  {}: {}", e.field.yellow(), e.message);
            }
        }
        OutputMode::Json => write_json_line(&json!({
            "form": form,
            "valid": false,
            "errors": errors,
        }))?,
    }
    Ok(CliError::User(format!(
        "{form} has {} invalid field(s)",
        errors.len()
    )))
}

fn run_validate_function(cli: &Cli, args: &ValidateFunctionArgs) -> Result<(), CliError> {
    let session = session(cli)?;
    let draft = FunctionDraft::load(&args.file)?;
    match draft.validate() {
        Ok(()) => {
            match output_mode(cli) {
                OutputMode::Human => {
                    println!("Function '{}' is valid.", draft.name.trim());
                }
                OutputMode::Json => write_json_line(&json!({
                    "command": "validate-function",
                    "valid": true,
                    "function": draft,
                }))?,
            }
            Ok(())
        }
        Err(errors) => {
            session.log.validation_failed("function", errors.len());
            Err(report_validation_errors(cli, "function", &errors)?)
        }
    }
}

fn run_config(cli: &Cli, args: &ConfigArgs) -> Result<(), CliError> {
    match &args.command {
        None | Some(ConfigCommand::Path) => {
            let path = cli.config.clone().unwrap_or_else(Config::default_path);
            let exists = path.exists();

            match output_mode(cli) {
                OutputMode::Human => {
                    println!("{}", path.display());
                    if !exists && !cli.quiet {
                        println!("  (file does not exist; defaults will be used)");
                    }
                }
                OutputMode::Json => {
                    write_json_line(&json!({
                        "command": "config path",
                        "path": path.to_string_lossy(),
                        "exists": exists,
                    }))?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Show) => {
            let config = Config::load(cli.config.as_deref())?;

            match output_mode(cli) {
                OutputMode::Human => {
                    let toml_str = toml::to_string_pretty(&config)
                        .map_err(|e| CliError::Runtime(format!("serialize config: {e}")))?;
                    println!("{toml_str}");
                }
                OutputMode::Json => {
                    write_json_line(&json!({
                        "command": "config show",
                        "config": serde_json::to_value(&config)?,
                    }))?;
                }
            }
            Ok(())
        }
        Some(ConfigCommand::Validate) => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                let hash = config.stable_hash()?;
                match output_mode(cli) {
                    OutputMode::Human => {
                        println!("Configuration is valid.");
                        println!("  Source: {}", config.paths.config_file.display());
                        println!("  Hash: {hash}");
                    }
                    OutputMode::Json => {
                        write_json_line(&json!({
                            "command": "config validate",
                            "valid": true,
                            "hash": hash,
                        }))?;
                    }
                }
                Ok(())
            }
            Err(err) => {
                if output_mode(cli) == OutputMode::Json {
                    write_json_line(&json!({
                        "command": "config validate",
                        "valid": false,
                        "code": err.code(),
                        "error": err.to_string(),
                    }))?;
                }
                Err(err.into())
            }
        },
    }
}

fn run_dashboard_command(cli: &Cli, args: &DashboardArgs) -> Result<(), CliError> {
    let session = session(cli)?;
    if !io::stdout().is_terminal() {
        return Err(CliError::User(
            "the dashboard needs an interactive terminal; use `c2s show` instead".to_string(),
        ));
    }
    let start = match &args.panel {
        Some(raw) => parse_panel(raw)?,
        None => session.config.dashboard.start_panel,
    };
    let refresh_ms = args
        .refresh_ms
        .unwrap_or(session.config.dashboard.refresh_ms)
        .max(MIN_REFRESH_MS);
    let runtime = DashboardRuntimeConfig {
        start,
        refresh: Duration::from_millis(refresh_ms),
        full_page: args.full_page || session.config.display.full_page,
        no_color: cli.no_color || session.config.display.no_color,
    };
    let runner = ActionRunner::new(
        Arc::new(StubCollaborator::new(Duration::from_millis(
            session.config.actions.simulated_latency_ms,
        ))),
        session.log.clone(),
    );
    let workspace = Workspace::seeded(session.ctx.today);
    run_dashboard(&runtime, workspace, session.ctx.clone(), &runner, &session.log)?;
    Ok(())
}

// ──────────────────── output ────────────────────

fn emit_view(cli: &Cli, session: &Session, command: &str, view: &PanelView) -> Result<(), CliError> {
    match output_mode(cli) {
        OutputMode::Human => {
            let mut lines = view_lines(view, terminal_width(), None);
            if cli.quiet {
                lines.retain(|l| !l.spans.iter().all(|s| s.tone == Tone::Muted));
            }
            print_lines(&lines, session.theme(cli));
            Ok(())
        }
        OutputMode::Json => write_json_line(&json!({
            "command": command,
            "panel": view.panel,
            "view": view,
        })),
    }
}

fn terminal_width() -> usize {
    if io::stdout().is_terminal() {
        crossterm::terminal::size().map_or(FALLBACK_WIDTH, |(cols, _)| usize::from(cols))
    } else {
        FALLBACK_WIDTH
    }
}

fn paint(text: &str, tag: Option<&str>, bold: bool) -> ColoredString {
    let colored = match tag {
        Some("cyan") => text.cyan(),
        Some("bright-cyan") => text.bright_cyan(),
        Some("green") => text.green(),
        Some("bright-green") => text.bright_green(),
        Some("yellow") => text.yellow(),
        Some("bright-yellow") => text.bright_yellow(),
        Some("red") => text.red(),
        Some("bright-red") => text.bright_red(),
        Some("magenta") => text.magenta(),
        Some("dark-grey" | "grey") => text.dimmed(),
        Some("bright-white") => text.bright_white(),
        _ => text.normal(),
    };
    if bold { colored.bold() } else { colored }
}

fn print_lines(lines: &[Line], theme: Theme) {
    for line in lines {
        let text: String = line
            .spans
            .iter()
            .map(|s| paint(&s.text, theme.color(s.tone), s.bold).to_string())
            .collect();
        println!("{}", text.trim_end());
    }
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("C2S_OUTPUT_FORMAT").ok();
    resolve_output_mode(cli.json, env_mode.as_deref(), io::stdout().is_terminal())
}

fn resolve_output_mode(json_flag: bool, env_mode: Option<&str>, stdout_is_tty: bool) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    let fallback = if stdout_is_tty {
        OutputMode::Human
    } else {
        OutputMode::Json
    };

    match env_mode
        .map(str::trim)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("json") => OutputMode::Json,
        Some("human") => OutputMode::Human,
        _ => fallback,
    }
}
