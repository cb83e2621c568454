//! # sweettext
//!
//! A staged text-transformation pipeline for uploaded PDFs.
//!
//! An accepted upload walks a fixed sequence of stages. Each stage is marked
//! active, pauses for a configurable time, appends a deterministic text
//! fragment and is marked completed. Observers see every transition. The
//! processing itself is simulated: no document bytes are parsed and no
//! external service is called.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF descriptor {name, size, type}
//!  │
//!  ├─ validate   reject non-PDF or > 10 MiB (no run created)
//!  ├─ 1. upload   completed the moment the file is accepted
//!  ├─ 2. generate append the generated body
//!  ├─ 3. smooth   append the smoothing addendum
//!  ├─ 4. verify   append the human-likeness verdict (score 94)
//!  └─ 5. complete run frozen; final text available to download / copy
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sweettext::{InputDescriptor, PipelineConfig, PipelineController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut controller = PipelineController::new(PipelineConfig::default());
//!     let input = InputDescriptor::from_path("thesis.pdf")?;
//!     controller.process(input).await?;
//!     println!("{}", controller.final_text()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `sweettext` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod actions;
pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod stage;
pub mod stats;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use actions::{Clipboard, CopyMethod, DownloadArtifact, SystemClipboard};
pub use app::SweetTextApp;
pub use config::{PipelineConfig, PipelineConfigBuilder, StageDelay, StageTimings};
pub use controller::{PipelineController, PipelineRun, StageResult, TextFragment};
pub use error::{RejectReason, SweetTextError};
pub use pipeline::input::{validate_input, Accepted, InputDescriptor};
pub use pipeline::verify::Verification;
pub use progress::{NoopObserver, Notification, ObserverHandle, PipelineObserver, Severity};
pub use stage::{Stage, StageIndicator, StageName, StageStatus};
pub use stats::{FileStatsStore, MemoryStatsStore, Stats, StatsIncrement, StatsStore};
pub use stream::{process_stream, ChannelObserver, EventStream, PipelineEvent, PipelineHandle};
