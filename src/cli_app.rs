//! Top-level CLI definition and dispatch.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use clap::{Args, Parser, Subcommand};
use colored::{Colorize, control};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use stopboard::core::config::Config;
use stopboard::core::errors::BoardError;
use stopboard::core::instance::{DisplayConfig, InstanceId, RouteFilter, Viewport};
use stopboard::daemon::BoardDaemon;
use stopboard::fetch::{PredictionSource, StaticSource};
use stopboard::logger::activity::{ActivityLoggerHandle, spawn_logger};
use stopboard::logger::jsonl::JsonlConfig;
use stopboard::picker::{PickerItem, StopCatalog, StopEntry, StopQuery, merge, recent, starred};
use stopboard::render::surface::{BoardState, RenderPlan, compose};
use stopboard::scheduler::RefreshWorker;
use stopboard::snapshot::eta::EtaStatus;
use stopboard::store::SnapshotStore;

/// stopboard — compact arrival displays for transit stops.
#[derive(Debug, Parser)]
#[command(
    name = "stopboard",
    author,
    version,
    about = "stopboard - Stop Arrival Display Manager",
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
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run the refresh daemon for all configured displays.
    Daemon(DaemonCmdArgs),
    /// Configure a display instance for a stop.
    Configure(ConfigureArgs),
    /// Remove a display instance and its persisted documents.
    Remove(RemoveArgs),
    /// Fetch fresh predictions for one display now.
    Refresh(RefreshArgs),
    /// Show a display's current board from persisted state.
    Render(RenderArgs),
    /// Search the stop catalog (starred and recent stops first).
    Stops(StopsArgs),
    /// View configuration state.
    Config(ConfigCmdArgs),
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct DaemonCmdArgs {
    /// Run in the foreground (the only supported mode; a supervisor manages
    /// backgrounding).
    #[arg(long)]
    foreground: bool,
    /// Arrivals fixture file standing in for the network prediction source.
    #[arg(long, value_name = "PATH")]
    fixture: Option<PathBuf>,
}

#[derive(Debug, Clone, Args, Serialize)]
struct ConfigureArgs {
    /// Display instance id.
    #[arg(value_name = "INSTANCE")]
    instance: InstanceId,
    /// Stop to show on this display.
    #[arg(long, value_name = "STOP_ID")]
    stop_id: String,
    /// Title shown on the board (defaults to the stop id).
    #[arg(long, value_name = "NAME")]
    name: Option<String>,
    /// Route id to include; repeat for several. Omit to show all routes.
    #[arg(long = "route", value_name = "ROUTE_ID")]
    routes: Vec<String>,
    /// Display width in density-independent units.
    #[arg(long, value_name = "UNITS")]
    width: Option<u32>,
    /// Display height in density-independent units.
    #[arg(long, value_name = "UNITS")]
    height: Option<u32>,
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct RemoveArgs {
    /// Display instance id.
    #[arg(value_name = "INSTANCE")]
    instance: InstanceId,
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct RefreshArgs {
    /// Display instance id.
    #[arg(value_name = "INSTANCE")]
    instance: InstanceId,
    /// Arrivals fixture file standing in for the network prediction source.
    #[arg(long, value_name = "PATH")]
    fixture: Option<PathBuf>,
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct RenderArgs {
    /// Display instance id.
    #[arg(value_name = "INSTANCE")]
    instance: InstanceId,
    /// Override the stored viewport width for this render.
    #[arg(long, value_name = "UNITS")]
    width: Option<u32>,
    /// Override the stored viewport height for this render.
    #[arg(long, value_name = "UNITS")]
    height: Option<u32>,
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct StopsArgs {
    /// Case-insensitive substring to match against stop names.
    #[arg(long, value_name = "TEXT")]
    query: Option<String>,
    /// Restrict matches to one region id.
    #[arg(long, value_name = "REGION")]
    region: Option<String>,
}

#[derive(Debug, Clone, Args, Serialize, Default)]
struct ConfigCmdArgs {
    #[serde(skip)]
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, Clone, Subcommand, Default)]
enum ConfigCommand {
    /// Print the resolved config file path.
    Path,
    /// Print the effective configuration.
    #[default]
    Show,
    /// Load and validate the configuration, reporting errors.
    Validate,
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
            Self::Json(_) => 3,
        }
    }
}

impl From<BoardError> for CliError {
    fn from(err: BoardError) -> Self {
        match &err {
            BoardError::InvalidConfig { .. }
            | BoardError::MissingConfig { .. }
            | BoardError::NotConfigured { .. }
            | BoardError::InvalidInstance { .. } => Self::User(format!("[{}] {err}", err.code())),
            _ => Self::Runtime(format!("[{}] {err}", err.code())),
        }
    }
}

/// Dispatch CLI commands.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    if cli.no_color {
        control::set_override(false);
    }

    match &cli.command {
        Command::Daemon(args) => run_daemon(cli, args),
        Command::Configure(args) => run_configure(cli, args),
        Command::Remove(args) => run_remove(cli, args),
        Command::Refresh(args) => run_refresh(cli, args),
        Command::Render(args) => run_render(cli, args),
        Command::Stops(args) => run_stops(cli, args),
        Command::Config(args) => run_config(cli, args),
    }
}

// ──────────────────── daemon ────────────────────

fn run_daemon(cli: &Cli, args: &DaemonCmdArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let source = fixture_source(&config, args.fixture.clone());

    let mut daemon = BoardDaemon::init(config, source)?;
    daemon.run()?;
    Ok(())
}

/// The prediction source for this process: a JSON fixture file, either explicit
/// or at its default location under the data directory.
fn fixture_source(config: &Config, fixture: Option<PathBuf>) -> Arc<dyn PredictionSource> {
    let path = fixture.unwrap_or_else(|| config.paths.store_dir.join("arrivals.json"));
    Arc::new(StaticSource::new(path))
}

// ──────────────────── one-shot commands ────────────────────

/// Worker plus logger lifecycle for single-command runs. The logger thread must
/// be joined before exit or trailing events never reach the JSONL file.
struct OneShot {
    worker: Arc<RefreshWorker>,
    logger: ActivityLoggerHandle,
    logger_join: thread::JoinHandle<()>,
}

impl OneShot {
    fn init(config: &Config, fixture: Option<PathBuf>) -> Result<Self, CliError> {
        let (logger, logger_join) = spawn_logger(JsonlConfig {
            path: config.paths.jsonl_log.clone(),
            ..JsonlConfig::default()
        })?;
        let store = SnapshotStore::open(&config.paths.store_dir)?;
        let worker = Arc::new(RefreshWorker::new(
            fixture_source(config, fixture),
            store,
            config.refresh.clone(),
            logger.clone(),
        ));
        Ok(Self {
            worker,
            logger,
            logger_join,
        })
    }

    fn finish(self) {
        self.logger.shutdown();
        let _ = self.logger_join.join();
    }
}

fn run_configure(cli: &Cli, args: &ConfigureArgs) -> Result<(), CliError> {
    if args.stop_id.trim().is_empty() {
        return Err(CliError::User("--stop-id must not be empty".to_string()));
    }

    let config = load_config(cli)?;
    let mut viewport = Viewport::default();
    if let Some(width) = args.width {
        viewport.min_width = width;
    }
    if let Some(height) = args.height {
        viewport.min_height = height;
    }
    let display = DisplayConfig {
        stop_id: args.stop_id.clone(),
        display_name: args.name.clone().unwrap_or_else(|| args.stop_id.clone()),
        route_filter: RouteFilter::from_selection(args.routes.clone()),
        viewport,
    };

    let shot = OneShot::init(&config, None)?;
    let result = shot.worker.configure(args.instance, &display);
    // Populate immediately; a failed first fetch leaves the display in its
    // loading state and is not a configuration failure.
    let initial_plan = if result.is_ok() {
        shot.worker.refresh_once(args.instance).ok()
    } else {
        None
    };
    shot.finish();
    result?;

    match output_mode(cli) {
        OutputMode::Human => {
            println!(
                "display {} configured for stop {} ({})",
                args.instance,
                args.stop_id,
                match &display.route_filter {
                    RouteFilter::AllRoutes => "all routes".to_string(),
                    RouteFilter::Subset(routes) => format!("{} route(s)", routes.len()),
                }
            );
            match initial_plan {
                Some(plan) => print_plan(&plan),
                None => println!("initial refresh failed; will populate on the next refresh"),
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "configure",
                "instance": args.instance,
                "stop_id": args.stop_id,
                "display_name": display.display_name,
                "routes": args.routes,
                "initial_refresh": initial_plan.is_some(),
                "status": "ok",
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_remove(cli: &Cli, args: &RemoveArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let shot = OneShot::init(&config, None)?;
    let result = shot.worker.remove(args.instance);
    shot.finish();
    result?;

    match output_mode(cli) {
        OutputMode::Human => println!("display {} removed", args.instance),
        OutputMode::Json => {
            let payload = json!({
                "command": "remove",
                "instance": args.instance,
                "status": "ok",
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn run_refresh(cli: &Cli, args: &RefreshArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let shot = OneShot::init(&config, args.fixture.clone())?;
    let result = shot.worker.refresh_once(args.instance);
    shot.finish();
    let plan = result?;

    match output_mode(cli) {
        OutputMode::Human => print_plan(&plan),
        OutputMode::Json => {
            let payload = json!({
                "command": "refresh",
                "instance": args.instance,
                "plan": serde_json::to_value(&plan)?,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

// ──────────────────── render ────────────────────

fn run_render(cli: &Cli, args: &RenderArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let store = SnapshotStore::open(&config.paths.store_dir)?;

    // Pure read path: compose from whatever documents exist so labels reflect
    // the current wall clock, not the last daemon render.
    let display = store.load_config(args.instance)?;
    let snapshot = store.load_snapshot(args.instance)?;
    let mut viewport = display.as_ref().map_or_else(Viewport::default, |d| d.viewport);
    if let Some(width) = args.width {
        viewport.min_width = width;
    }
    if let Some(height) = args.height {
        viewport.min_height = height;
    }
    let plan = compose(
        display.as_ref(),
        snapshot.as_ref(),
        viewport,
        stopboard::core::now_ms(),
    );

    match output_mode(cli) {
        OutputMode::Human => print_plan(&plan),
        OutputMode::Json => {
            let payload = json!({
                "command": "render",
                "instance": args.instance,
                "plan": serde_json::to_value(&plan)?,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn print_plan(plan: &RenderPlan) {
    println!("{}", plan.title.bold());
    match plan.state {
        BoardState::NotConfigured => println!("  {}", "not configured".dimmed()),
        BoardState::Loading => println!("  {}", "loading...".dimmed()),
        BoardState::NoArrivals => println!("  {}", "no upcoming arrivals".dimmed()),
        BoardState::Active => {
            for row in &plan.rows {
                if !row.visible {
                    continue;
                }
                let mut line = format!("  {:<6}", row.name.as_deref().unwrap_or(""));
                for eta in &row.etas {
                    if !eta.visible {
                        continue;
                    }
                    let label = eta.label.as_deref().unwrap_or("");
                    let styled = match eta.status {
                        Some(EtaStatus::OnTime) => label.green().to_string(),
                        Some(EtaStatus::Late) => label.red().to_string(),
                        Some(EtaStatus::Early) => label.yellow().to_string(),
                        Some(EtaStatus::Scheduled) | None => label.dimmed().to_string(),
                    };
                    line.push_str(&format!("  {styled:>10}"));
                }
                println!("{line}");
            }
        }
    }
    if plan.footer_visible {
        if let Some(last_updated) = &plan.last_updated {
            println!("  {}", last_updated.dimmed());
        }
    }
}

// ──────────────────── stops ────────────────────

fn run_stops(cli: &Cli, args: &StopsArgs) -> Result<(), CliError> {
    let config = load_config(cli)?;
    let catalog = StopCatalog::load(&config.paths.catalog_file)?;
    let query = StopQuery {
        name_contains: args.query.clone().unwrap_or_default(),
        region_id: args.region.clone(),
    };

    let items = merge(
        starred(&catalog.stops, &query),
        recent(&catalog.stops, &query),
    );

    match output_mode(cli) {
        OutputMode::Human => {
            if items.is_empty() {
                println!("no matching stops");
                return Ok(());
            }
            for item in &items {
                match item {
                    PickerItem::Header { title } => println!("{}", title.bold()),
                    PickerItem::Stop { entry } => print_stop(entry),
                }
            }
        }
        OutputMode::Json => {
            let payload = json!({
                "command": "stops",
                "query": args.query,
                "region": args.region,
                "items": serde_json::to_value(&items)?,
            });
            write_json_line(&payload)?;
        }
    }
    Ok(())
}

fn print_stop(entry: &StopEntry) {
    let marker = if entry.favorite { "*" } else { " " };
    let direction = entry
        .direction
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default();
    println!(
        "  {marker} {:<12} {}{}",
        entry.stop_id,
        entry.name,
        direction.dimmed()
    );
}

// ──────────────────── config ────────────────────

fn run_config(cli: &Cli, args: &ConfigCmdArgs) -> Result<(), CliError> {
    match args.command.clone().unwrap_or_default() {
        ConfigCommand::Path => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(Config::default_path);
            match output_mode(cli) {
                OutputMode::Human => println!("{}", path.display()),
                OutputMode::Json => {
                    write_json_line(&json!({ "command": "config path", "path": path }))?;
                }
            }
            Ok(())
        }
        ConfigCommand::Show => {
            let config = load_config(cli)?;
            match output_mode(cli) {
                OutputMode::Human => {
                    let rendered = toml::to_string_pretty(&config).map_err(|e| {
                        CliError::Runtime(format!("failed to render config: {e}"))
                    })?;
                    print!("{rendered}");
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
        ConfigCommand::Validate => match Config::load(cli.config.as_deref()) {
            Ok(config) => {
                match output_mode(cli) {
                    OutputMode::Human => println!(
                        "config ok: {}",
                        config.paths.config_file.display()
                    ),
                    OutputMode::Json => {
                        write_json_line(&json!({ "command": "config validate", "status": "ok" }))?;
                    }
                }
                Ok(())
            }
            Err(err) => Err(CliError::User(format!("[{}] {err}", err.code()))),
        },
    }
}

// ──────────────────── output plumbing ────────────────────

fn load_config(cli: &Cli) -> Result<Config, CliError> {
    Ok(Config::load(cli.config.as_deref())?)
}

fn write_json_line(payload: &Value) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, payload)?;
    writeln!(stdout)?;
    Ok(())
}

fn output_mode(cli: &Cli) -> OutputMode {
    let env_mode = std::env::var("SBD_OUTPUT_FORMAT").ok();
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
        Some("auto") | None => fallback,
        Some(_) => fallback,
    }
}
