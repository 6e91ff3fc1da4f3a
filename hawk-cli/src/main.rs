mod console;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing_subscriber::EnvFilter;

use hawk_core::config::{HawkConfig, Overrides};
use hawk_core::probe::ProcessGateway;
use hawk_core::scheduler::Poller;
use hawk_core::state::Snapshot;
use hawk_core::summary::CheckSummary;

use console::Console;

/// Filter directives for the trace log, e.g. `HAWK_TUI_LOG=hawk_core=debug`
const LOG_ENV: &str = "HAWK_TUI_LOG";
const TRACE_FILE_NAME: &str = "hawk-tui.trace.log";

#[derive(Parser, Debug)]
#[command(name = "hawk-tui")]
#[command(version, about = "Operator console for a running service", long_about = None)]
struct Cli {
    /// Poll every source once, print a JSON summary and exit
    #[arg(long)]
    check: bool,

    /// Directory every default path is derived from [default: current directory]
    #[arg(long, env = "HAWK_BASE_DIR", value_name = "DIR")]
    base_dir: Option<PathBuf>,

    /// Probe executable (`list`, `run <id>`)
    #[arg(long, env = "HAWK_BIN", value_name = "PATH")]
    bin: Option<PathBuf>,

    /// Lifecycle executable (`<action> <unit>`)
    #[arg(long, env = "HAWK_DAEMON_CTL", value_name = "PATH")]
    daemon_ctl: Option<PathBuf>,

    #[arg(long, env = "HAWK_LOG_FILE", value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[arg(long, env = "HAWK_STREAM_FILE", value_name = "PATH")]
    stream_file: Option<PathBuf>,

    #[arg(long, env = "HAWK_GRPC_TARGETS", value_name = "PATH")]
    grpc_targets: Option<PathBuf>,

    #[arg(long, env = "HAWK_GRPC_FAKE_FILE", value_name = "PATH")]
    grpc_fake: Option<PathBuf>,

    #[arg(long, env = "HAWK_UNITS_FILE", value_name = "PATH")]
    units_file: Option<PathBuf>,

    /// Operator notes file
    #[arg(long = "chat-file", env = "HAWK_CHAT_FILE", value_name = "PATH")]
    notes_file: Option<PathBuf>,

    /// Managed unit passed to lifecycle actions
    #[arg(long, env = "HAWK_DAEMON_UNIT", value_name = "UNIT")]
    unit: Option<String>,

    /// Where interactive mode writes its trace log [default: <base>/hawk-tui.trace.log]
    #[arg(long, env = "HAWK_TRACE_FILE", value_name = "PATH")]
    trace_file: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            bin: self.bin.clone(),
            daemon_ctl: self.daemon_ctl.clone(),
            log_file: self.log_file.clone(),
            stream_file: self.stream_file.clone(),
            grpc_targets: self.grpc_targets.clone(),
            grpc_fake: self.grpc_fake.clone(),
            units_file: self.units_file.clone(),
            notes_file: self.notes_file.clone(),
            default_unit: self.unit.clone(),
        }
    }
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Check mode: stdout carries only JSON
fn init_stderr_tracing() {
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_target(false)
        .with_writer(io::stderr)
        .try_init()
    {
        tracing::warn!(error = %e, "tracing subscriber already installed");
    }
}

/// Interactive mode: the terminal belongs to the UI
fn init_file_tracing(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create trace directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open trace file {}", path.display()))?;

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
    {
        tracing::warn!(error = %e, "tracing subscriber already installed");
    }
    Ok(())
}

// --- Terminal setup/teardown ---
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_check(config: HawkConfig) -> Result<()> {
    let mut poller = Poller::new(config, ProcessGateway::new());
    let mut snap = Snapshot::new();
    poller.poll_all(&mut snap, Instant::now()).await;

    let summary = CheckSummary::from_snapshot(&snap);
    println!("{}", summary.to_json().context("failed to encode summary")?);
    Ok(())
}

async fn run_console(config: HawkConfig) -> Result<()> {
    let mut console = Console::new(Poller::new(config, ProcessGateway::new()));

    let mut terminal = setup_terminal().context("failed to initialise terminal")?;
    let result = console::run(&mut terminal, &mut console).await;
    restore_terminal(terminal).context("failed to restore terminal")?;

    result.context("console loop failed")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let base_dir = match &cli.base_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };

    // Config errors are reported before anything is created on disk
    let config = HawkConfig::load(&base_dir, cli.overrides())
        .with_context(|| format!("invalid configuration in {}", base_dir.display()))?;

    if cli.check {
        init_stderr_tracing();
    } else {
        let trace_file = cli
            .trace_file
            .clone()
            .unwrap_or_else(|| base_dir.join(TRACE_FILE_NAME));
        init_file_tracing(&trace_file)?;
    }
    tracing::debug!(?config, "configuration resolved");

    if cli.check {
        run_check(config).await
    } else {
        run_console(config).await
    }
}
