use crate::catalog;
use crate::client::BacktestClient;
use crate::config::Settings;
use crate::logging::{self, LogTarget};
use crate::orchestrator::{App, RequestPhase};
use crate::tabs::Tab;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "backtest-console",
    version,
    about = "Portfolio backtesting client with optional TUI"
)]
pub struct Cli {
    /// Base URL of the backtesting service
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    pub base_url: String,

    /// Request timeout [default: 120s]
    #[arg(long)]
    pub timeout: Option<humantime::Duration>,

    /// How long notifications stay visible [default: 5s]
    #[arg(long)]
    pub notice_ttl: Option<humantime::Duration>,

    /// Fund catalog JSON file (fetched from the service when omitted)
    #[arg(long)]
    pub funds: Option<PathBuf>,

    /// Benchmark catalog JSON file (fetched from the service when omitted)
    #[arg(long)]
    pub benchmarks: Option<PathBuf>,

    /// JSON file with form defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Result tab shown first
    #[arg(long, value_enum, default_value_t = Tab::Equity)]
    pub initial_tab: Tab,

    /// Directory CSV exports are written to [default: download directory]
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Run one backtest, print the result as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Run one backtest, print a text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Write the equity curve CSV to this path (headless modes)
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Log file used while the TUI owns the terminal
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    pub fn is_headless(&self) -> bool {
        self.json || self.text || cfg!(not(feature = "tui"))
    }
}

/// Layer settings: defaults, then the config file, then explicit flags.
pub fn build_settings(args: &Cli) -> Result<Settings> {
    let mut settings = match args.config.as_deref() {
        Some(p) => Settings::load(p)?,
        None => Settings::default(),
    };
    if let Some(t) = args.timeout {
        settings.timeout = Duration::from(t);
    }
    if let Some(t) = args.notice_ttl {
        settings.notice_ttl = Duration::from(t);
    }
    Ok(settings)
}

/// Today's date in local time, or UTC when the offset is unavailable.
fn today() -> time::Date {
    time::OffsetDateTime::now_local()
        .unwrap_or_else(|_| time::OffsetDateTime::now_utc())
        .date()
}

/// Returns `false` when a headless backtest settled as a failure.
pub async fn run(args: Cli) -> Result<bool> {
    if args.json && args.text {
        anyhow::bail!("--json and --text are mutually exclusive");
    }

    if args.is_headless() {
        logging::init(LogTarget::Stderr)?;
    } else {
        let path = args.log_file.clone().unwrap_or_else(logging::default_log_file);
        logging::init(LogTarget::File(&path))?;
    }

    let settings = build_settings(&args)?;
    let client = BacktestClient::new(&args.base_url, settings.timeout)?;
    let (funds, benchmarks) =
        catalog::resolve(args.funds.as_deref(), args.benchmarks.as_deref(), &client).await?;
    let app = App::new(&settings, today(), funds, &benchmarks, args.initial_tab);

    if !args.is_headless() {
        #[cfg(feature = "tui")]
        {
            let export_dir = args
                .export_dir
                .clone()
                .unwrap_or_else(crate::export::default_export_dir);
            crate::tui::run(app, client, export_dir).await?;
            return Ok(true);
        }
    }

    run_headless(&args, app, &client).await
}

async fn run_headless(args: &Cli, mut app: App, client: &BacktestClient) -> Result<bool> {
    let (out_tx, out_handle) = spawn_output_writer();

    let (id, request) = app.submit();
    let outcome = client.submit(&request).await;
    app.settle(id, outcome, Instant::now());

    handle_exports(args, &app)?;

    if args.json {
        for notice in app.notices.iter() {
            let _ = out_tx.send(OutputLine::Stderr(format!(
                "[{}] {}",
                notice.severity.class(),
                notice.message
            )));
        }
        match (&app.phase, app.current.as_ref()) {
            (RequestPhase::Success, Some(result)) => {
                let out = serde_json::to_string_pretty(result)?;
                let _ = out_tx.send(OutputLine::Stdout(out));
            }
            (RequestPhase::Failed(message), _) => {
                let _ = out_tx.send(OutputLine::Stderr(format!("Error: {message}")));
            }
            _ => {}
        }
    } else {
        let summary = crate::text_summary::build_text_summary(&app);
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(app.phase.shows_results())
}

/// Write the CSV export if one was requested and there is a result to export.
fn handle_exports(args: &Cli, app: &App) -> Result<()> {
    let Some(path) = args.export_csv.as_deref() else {
        return Ok(());
    };
    match app.export_csv() {
        Some(artifact) => artifact
            .write_to(path)
            .with_context(|| format!("export csv to {}", path.display())),
        None => {
            tracing::info!("no result to export");
            Ok(())
        }
    }
}
