//! The application object: controller + stats store + user actions.
//!
//! [`SweetTextApp`] is what a UI layer holds. It turns every library error
//! into a notification, so a UI only has to render what observers receive.
//! Nothing here is fatal: each failing call reports, returns `Err`, and
//! leaves the app in its previous state.

use crate::actions::{self, Clipboard, CopyMethod, DownloadArtifact};
use crate::config::PipelineConfig;
use crate::controller::{PipelineController, PipelineRun};
use crate::error::{RejectReason, SweetTextError};
use crate::pipeline::fragments;
use crate::pipeline::input::InputDescriptor;
use crate::progress::{ObserverHandle, Severity};
use crate::stats::{Stats, StatsIncrement, StatsStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, warn};

pub struct SweetTextApp {
    controller: PipelineController,
    stats: Arc<dyn StatsStore>,
    download_dir: PathBuf,
}

impl SweetTextApp {
    /// Downloads go to the current directory unless
    /// [`SweetTextApp::with_download_dir`] says otherwise.
    pub fn new(config: PipelineConfig, stats: Arc<dyn StatsStore>) -> Self {
        Self {
            controller: PipelineController::new(config),
            stats,
            download_dir: PathBuf::from("."),
        }
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn subscribe(&mut self, observer: ObserverHandle) {
        self.controller.subscribe(observer);
    }

    pub fn controller(&self) -> &PipelineController {
        &self.controller
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Load and publish stats, then greet.
    pub fn start(&self) -> Stats {
        let stats = self.refresh_stats();
        self.controller.notify(fragments::WELCOME, Severity::Info);
        stats
    }

    /// Re-read the counters and hand them to observers.
    pub fn refresh_stats(&self) -> Stats {
        let stats = self.stats.load();
        for obs in self.controller.observers() {
            obs.on_stats(&stats);
        }
        stats
    }

    /// Validate and process one uploaded file to completion.
    pub async fn handle_file(
        &mut self,
        descriptor: InputDescriptor,
    ) -> Result<&PipelineRun, SweetTextError> {
        if let Err(e) = self.controller.begin_run(descriptor).map(|_| ()) {
            self.report(&e);
            return Err(e);
        }
        if let Err(e) = self.controller.run_to_completion().await.map(|_| ()) {
            self.report(&e);
            return Err(e);
        }
        self.refresh_stats();
        self.controller.run().ok_or(SweetTextError::NoActiveRun)
    }

    /// Describe a local file, then [`SweetTextApp::handle_file`].
    pub async fn handle_path(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<&PipelineRun, SweetTextError> {
        let descriptor = match InputDescriptor::from_path(path) {
            Ok(d) => d,
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };
        self.handle_file(descriptor).await
    }

    /// Write the final text to the download directory and count it.
    ///
    /// `completed` is incremented only after the file is on disk.
    pub async fn download_content(&self) -> Result<DownloadArtifact, SweetTextError> {
        let text = match self.controller.final_text() {
            Ok(t) => t,
            Err(e) => {
                self.controller
                    .notify(fragments::NOTHING_TO_DOWNLOAD, Severity::Warning);
                return Err(e);
            }
        };

        let prefix = &self.controller.config().download_prefix;
        let artifact = match actions::download(&text, &self.download_dir, prefix).await {
            Ok(a) => a,
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };
        self.controller.notify(fragments::DOWNLOADED, Severity::Success);

        if let Err(e) = self.stats.increment(StatsIncrement::completed(1)) {
            // The download itself succeeded; only the counter is stale.
            warn!("Could not record download: {e}");
            self.controller
                .notify(fragments::STATS_NOT_SAVED, Severity::Warning);
        }
        self.refresh_stats();
        Ok(artifact)
    }

    /// Place the final text on `clipboard`, falling back if needed.
    pub fn copy_content(&self, clipboard: &dyn Clipboard) -> Result<CopyMethod, SweetTextError> {
        let text = match self.controller.final_text() {
            Ok(t) => t,
            Err(e) => {
                self.controller
                    .notify(fragments::NOTHING_TO_COPY, Severity::Warning);
                return Err(e);
            }
        };
        match actions::copy(&text, clipboard) {
            Ok(method) => {
                self.controller.notify(fragments::COPIED, Severity::Success);
                Ok(method)
            }
            Err(e) => {
                self.report(&e);
                Err(e)
            }
        }
    }

    /// Catch-all for failures outside the known taxonomy.
    ///
    /// Logs the detail; the user only sees a generic message.
    pub fn report_unexpected(&self, err: &dyn std::error::Error) {
        error!("Unexpected failure: {err}");
        self.controller.notify(fragments::UNEXPECTED, Severity::Error);
    }

    fn report(&self, err: &SweetTextError) {
        match err {
            SweetTextError::InvalidInput { reason, .. } => {
                let msg = match reason {
                    RejectReason::WrongType => fragments::WRONG_TYPE,
                    RejectReason::TooLarge => fragments::TOO_LARGE,
                };
                self.controller.notify(msg, Severity::Error);
            }
            SweetTextError::RunInProgress { .. } => {
                self.controller
                    .notify(fragments::RUN_IN_PROGRESS, Severity::Warning);
            }
            SweetTextError::NoContentAvailable => {
                self.controller
                    .notify(fragments::NOTHING_TO_DOWNLOAD, Severity::Warning);
            }
            SweetTextError::FileNotFound { .. }
            | SweetTextError::PermissionDenied { .. }
            | SweetTextError::OutputWriteFailed { .. }
            | SweetTextError::ClipboardUnavailable { .. } => {
                self.controller.notify(err.to_string(), Severity::Error);
            }
            other => self.report_unexpected(other),
        }
    }
}
