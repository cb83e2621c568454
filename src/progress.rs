//! Observer trait for stage transitions and user-facing notifications.
//!
//! Attach an [`Arc<dyn PipelineObserver>`] via
//! [`crate::config::PipelineConfigBuilder::observer`] or
//! [`crate::controller::PipelineController::subscribe`] to receive events as
//! the controller walks the pipeline.
//!
//! One trait covers both UI collaborators: the stage renderer (which only
//! cares about [`PipelineObserver::on_stage_status`]) and the toast/notifier
//! (which only cares about [`PipelineObserver::on_notification`]). All
//! methods default to no-ops so each implementation overrides just its half.
//!
//! # Example
//!
//! ```rust
//! use sweettext::{PipelineObserver, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CheckmarkCounter {
//!     done: AtomicUsize,
//! }
//!
//! impl PipelineObserver for CheckmarkCounter {
//!     fn on_stage_status(&self, stage: &Stage) {
//!         if stage.status == sweettext::StageStatus::Completed {
//!             self.done.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//!
//! let counter = Arc::new(CheckmarkCounter { done: AtomicUsize::new(0) });
//! let config = sweettext::PipelineConfig::builder()
//!     .observer(counter as Arc<dyn PipelineObserver>)
//!     .build()
//!     .unwrap();
//! ```

use crate::controller::PipelineRun;
use crate::pipeline::input::InputDescriptor;
use crate::stage::Stage;
use crate::stats::Stats;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Importance of a notification, drives toast styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// A transient, fire-and-forget message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Stage this message belongs to, if any.
    pub stage_id: Option<u32>,
    pub message: String,
    pub severity: Severity,
    /// How long the collaborator should keep it on screen.
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl Notification {
    pub fn new(message: impl Into<String>, severity: Severity, duration: Duration) -> Self {
        Self {
            stage_id: None,
            message: message.into(),
            severity,
            duration,
        }
    }

    pub fn for_stage(mut self, stage_id: u32) -> Self {
        self.stage_id = Some(stage_id);
        self
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Receives controller and application events.
///
/// Implementations must be `Send + Sync`: the streaming API drives the
/// controller from a spawned Tokio task. Calls for a single run arrive in
/// order from one task at a time.
pub trait PipelineObserver: Send + Sync {
    /// A descriptor was accepted and a run is about to start.
    fn on_run_start(&self, input: &InputDescriptor) {
        let _ = input;
    }

    /// A stage changed status. Renderers map `stage.status.indicator()`.
    fn on_stage_status(&self, stage: &Stage) {
        let _ = stage;
    }

    /// A toast-style message should be shown.
    fn on_notification(&self, notification: &Notification) {
        let _ = notification;
    }

    /// The terminal stage finished; `run` is now immutable.
    fn on_run_complete(&self, run: &PipelineRun) {
        let _ = run;
    }

    /// Persisted counters were (re)loaded.
    fn on_stats(&self, stats: &Stats) {
        let _ = stats;
    }
}

/// Observer that ignores every event.
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Shared handle type stored by the controller and config.
pub type ObserverHandle = Arc<dyn PipelineObserver>;
