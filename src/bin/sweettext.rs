//! CLI binary for sweettext.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `PipelineConfig`, drives one run and prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use sweettext::{
    ChannelObserver, FileStatsStore, InputDescriptor, Notification, PipelineConfig,
    PipelineObserver, PipelineRun, Severity, Stage, StageIndicator, StageTimings, Stats,
    StatsStore, SweetTextApp, SystemClipboard,
};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn magenta(s: &str) -> String {
    format!("\x1b[35m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: one spinner line for the active stage, a log line per
/// completed stage and a coloured line per notification.
struct CliObserver {
    bar: ProgressBar,
    /// Wall-clock start of the active stage.
    stage_started: Mutex<Option<Instant>>,
    run_started: Mutex<Option<Instant>>,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.magenta} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Waiting");

        Arc::new(Self {
            bar,
            stage_started: Mutex::new(None),
            run_started: Mutex::new(None),
        })
    }

    /// Print above the spinner, or plainly once it has finished.
    fn line(&self, line: String) {
        self.bar.suspend(|| eprintln!("{line}"));
    }

    fn take_elapsed(slot: &Mutex<Option<Instant>>) -> f64 {
        slot.lock()
            .ok()
            .and_then(|mut g| g.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn mark(slot: &Mutex<Option<Instant>>) {
        if let Ok(mut g) = slot.lock() {
            *g = Some(Instant::now());
        }
    }
}

impl PipelineObserver for CliObserver {
    fn on_run_start(&self, input: &InputDescriptor) {
        Self::mark(&self.run_started);
        self.bar.enable_steady_tick(Duration::from_millis(80));
        self.line(format!(
            "{} {}  {}",
            magenta("◆"),
            bold(&format!("Processing {}", input.name)),
            dim(&format!("{:.2} MB", input.size_mb())),
        ));
    }

    fn on_stage_status(&self, stage: &Stage) {
        match stage.status.indicator() {
            StageIndicator::Spinner => {
                Self::mark(&self.stage_started);
                self.bar.set_prefix(format!("Stage {}/5", stage.id));
                self.bar.set_message(stage.name.label());
            }
            StageIndicator::Checkmark => {
                let secs = Self::take_elapsed(&self.stage_started);
                self.line(format!(
                    "  {} {:<24} {}",
                    green("✓"),
                    stage.name.label(),
                    dim(&format!("{secs:.1}s")),
                ));
            }
            StageIndicator::IdleSpinner => {
                self.line(format!("  {} {}", dim("○"), dim(stage.name.label())));
            }
        }
    }

    fn on_notification(&self, n: &Notification) {
        let marker = match n.severity {
            Severity::Info => magenta("•"),
            Severity::Success => green("✔"),
            Severity::Warning => yellow("⚠"),
            Severity::Error => red("✘"),
        };
        self.line(format!("{marker} {}", n.message));
    }

    fn on_run_complete(&self, run: &PipelineRun) {
        self.bar.finish_and_clear();
        let secs = Self::take_elapsed(&self.run_started);
        let label = run
            .verification()
            .map(|v| v.label())
            .unwrap_or("Not verified");
        eprintln!(
            "{} {} chars  {}  {}",
            green("✔"),
            bold(&run.accumulated_text().len().to_string()),
            dim(label),
            dim(&format!("{secs:.1}s total")),
        );
    }

    fn on_stats(&self, stats: &Stats) {
        self.line(dim(&format_stats(stats)));
    }
}

fn format_stats(stats: &Stats) -> String {
    format!(
        "PDFs processed: {}  AI generations: {}  Completed: {}",
        stats.pdfs_processed, stats.ai_generations, stats.completed
    )
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Process a PDF and print the final text
  sweettext thesis.pdf

  # Save the final text as sweettext-processed-<millis>.txt in ./out
  sweettext thesis.pdf -o out

  # Skip the stage pauses and copy the result to the clipboard
  sweettext --fast --copy thesis.pdf

  # Newline-delimited JSON events
  sweettext --json --fast thesis.pdf

  # Show the persisted counters
  sweettext --stats

ENVIRONMENT VARIABLES:
  SWEETTEXT_DOWNLOAD_DIR  Default for --download-dir
  SWEETTEXT_STATS_FILE    Default for --stats-file
  RUST_LOG                Override the log filter (e.g. sweettext=debug)
"#;

/// Turn a PDF into smooth, human-sounding text.
#[derive(Parser, Debug)]
#[command(
    name = "sweettext",
    version,
    about = "Turn a PDF into smooth, human-sounding text",
    long_about = "Run a PDF through the SweetText pipeline (upload, generate, smooth, \
verify, complete) and print, save or copy the resulting text. Only PDF files up to \
10 MB are accepted.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file.
    #[arg(required_unless_present = "stats")]
    input: Option<PathBuf>,

    /// Save the final text into this directory instead of printing it.
    #[arg(short = 'o', long, env = "SWEETTEXT_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Copy the final text to the clipboard.
    #[arg(long, env = "SWEETTEXT_COPY")]
    copy: bool,

    /// Skip the stage pauses.
    #[arg(long, env = "SWEETTEXT_FAST")]
    fast: bool,

    /// Multiply every stage pause by this factor.
    #[arg(long, env = "SWEETTEXT_SPEED", conflicts_with = "fast")]
    speed: Option<f64>,

    /// Stats storage file (default: $XDG_DATA_HOME/sweettext/storage.json).
    #[arg(long, env = "SWEETTEXT_STATS_FILE")]
    stats_file: Option<PathBuf>,

    /// Print the persisted counters and exit.
    #[arg(long)]
    stats: bool,

    /// Output newline-delimited JSON events instead of text.
    #[arg(long, env = "SWEETTEXT_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "SWEETTEXT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SWEETTEXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "SWEETTEXT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; keep INFO logs out of
    // its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress || cli.json {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let stats_path = cli
        .stats_file
        .clone()
        .unwrap_or_else(FileStatsStore::default_path);
    let store = Arc::new(FileStatsStore::new(stats_path));

    // ── Stats-only mode ──────────────────────────────────────────────────
    if cli.stats {
        let stats = store.load();
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?
            );
        } else {
            println!("{}", format_stats(&stats));
            println!("{}", dim(&store.path().display().to_string()));
        }
        return Ok(());
    }

    let Some(input) = cli.input.clone() else {
        anyhow::bail!("An input PDF is required");
    };

    // ── Build app ────────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let mut app = SweetTextApp::new(config, store);
    if let Some(ref dir) = cli.download_dir {
        app = app.with_download_dir(dir);
    }

    let printer = if cli.json {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        app.subscribe(Arc::new(ChannelObserver::new(tx)));
        Some(tokio::spawn(async move {
            let mut events = UnboundedReceiverStream::new(rx);
            while let Some(event) = events.next().await {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::error!("Failed to serialise event: {e}"),
                }
            }
        }))
    } else {
        if show_progress {
            app.subscribe(CliObserver::new());
        }
        None
    };

    app.start();

    // ── Run pipeline ─────────────────────────────────────────────────────
    let run = app
        .handle_path(&input)
        .await
        .with_context(|| format!("Failed to process {}", input.display()))?
        .clone();
    let text = run.accumulated_text();

    if cli.download_dir.is_some() {
        let artifact = app
            .download_content()
            .await
            .context("Failed to save the final text")?;
        if !cli.quiet && !cli.json {
            eprintln!(
                "{}  {} bytes  →  {}",
                green("✔"),
                artifact.size_bytes,
                bold(&artifact.path.display().to_string()),
            );
        }
    } else if !cli.json {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        if !text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if cli.copy {
        app.copy_content(&SystemClipboard)
            .context("Failed to copy the final text")?;
    }

    // Dropping the app closes the event channel and lets the printer drain.
    drop(app);
    if let Some(printer) = printer {
        printer.await.context("Event printer failed")?;
        println!(
            "{}",
            serde_json::to_string(&run).context("Failed to serialise run")?
        );
    }

    Ok(())
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let timings = if cli.fast {
        StageTimings::instant()
    } else if let Some(factor) = cli.speed {
        StageTimings::scaled(factor).context("Invalid --speed")?
    } else {
        StageTimings::default()
    };

    PipelineConfig::builder()
        .timings(timings)
        .build()
        .context("Invalid configuration")
}
