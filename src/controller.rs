//! The pipeline controller: stage progression, validation and text accumulation.
//!
//! ## Lifecycle
//!
//! ```text
//!   validate ──▶ begin_run ──▶ advance ×4 ──▶ terminal (immutable)
//!   (reject)     upload ✓      generate, smooth, verify, complete
//! ```
//!
//! The controller is the only thing that moves a run forward; there is no
//! API to jump to an arbitrary stage. While a run is advancing a new
//! `begin_run` fails with [`SweetTextError::RunInProgress`]. Once the terminal
//! stage completes the run is frozen and a later `begin_run` replaces it.
//!
//! ## Status invariant
//!
//! While running, at most one stage is `active`; every stage before the
//! current one is `completed`, every stage after it is `pending`. Before the
//! first run and after completion no stage is `active`. A stage's lead-in
//! pause happens before it turns `active`, so between stages none is.

use crate::config::PipelineConfig;
use crate::error::SweetTextError;
use crate::pipeline::fragments;
use crate::pipeline::input::{self, Accepted, InputDescriptor};
use crate::pipeline::verify::Verification;
use crate::progress::{Notification, ObserverHandle, Severity};
use crate::stage::{default_stages, Stage, StageName, StageStatus, TERMINAL_STAGE_ID};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// Text appended by one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFragment {
    pub stage_id: u32,
    pub stage: StageName,
    pub text: String,
}

/// One execution of the pipeline for one accepted input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRun {
    input: InputDescriptor,
    stages: Vec<Stage>,
    current_stage_id: u32,
    fragments: Vec<TextFragment>,
    verification: Option<Verification>,
}

impl PipelineRun {
    fn new(input: InputDescriptor) -> Self {
        Self {
            input,
            stages: default_stages(),
            current_stage_id: 0,
            fragments: Vec::new(),
            verification: None,
        }
    }

    pub fn input(&self) -> &InputDescriptor {
        &self.input
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, id: u32) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// 0 before start, then 1..=5.
    pub fn current_stage_id(&self) -> u32 {
        self.current_stage_id
    }

    pub fn active_stage(&self) -> Option<&Stage> {
        self.stages.iter().find(|s| s.status == StageStatus::Active)
    }

    /// Fragments in the order they were appended.
    pub fn fragments(&self) -> &[TextFragment] {
        &self.fragments
    }

    /// Concatenation of every fragment so far.
    pub fn accumulated_text(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }

    /// Verdict of the verify stage once it has run.
    pub fn verification(&self) -> Option<&Verification> {
        self.verification.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.current_stage_id == TERMINAL_STAGE_ID
            && self
                .stage(TERMINAL_STAGE_ID)
                .is_some_and(|s| s.status == StageStatus::Completed)
    }

    fn set_status(&mut self, id: u32, status: StageStatus) -> Result<Stage, SweetTextError> {
        let stage = self
            .stages
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| SweetTextError::Internal(format!("no stage with id {id}")))?;
        stage.status = status;
        Ok(stage.clone())
    }
}

/// Outcome of one [`PipelineController::advance`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageResult {
    /// A stage ran to completion.
    Advanced {
        stage: Stage,
        /// Bytes appended to the accumulated text (0 for `complete`).
        appended: usize,
        /// The run reached its terminal stage with this call.
        terminal: bool,
    },
    /// The run was already terminal; nothing changed.
    AlreadyTerminal,
}

impl StageResult {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StageResult::AlreadyTerminal | StageResult::Advanced { terminal: true, .. }
        )
    }
}

/// Owns the stage list, the current run and the observer list.
pub struct PipelineController {
    config: PipelineConfig,
    observers: Vec<ObserverHandle>,
    idle_stages: Vec<Stage>,
    run: Option<PipelineRun>,
}

impl PipelineController {
    pub fn new(config: PipelineConfig) -> Self {
        let observers = config.observer.iter().cloned().collect();
        Self {
            config,
            observers,
            idle_stages: default_stages(),
            run: None,
        }
    }

    /// Register another observer; it sees every event from now on.
    pub fn subscribe(&mut self, observer: ObserverHandle) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self) -> Option<&PipelineRun> {
        self.run.as_ref()
    }

    /// Current stage list: the run's, or all-pending before the first run.
    pub fn stages(&self) -> &[Stage] {
        self.run
            .as_ref()
            .map(PipelineRun::stages)
            .unwrap_or(&self.idle_stages)
    }

    /// A run exists and has not reached its terminal stage.
    pub fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(|r| !r.is_complete())
    }

    pub fn validate_input(&self, descriptor: &InputDescriptor) -> Result<Accepted, SweetTextError> {
        input::validate_input(descriptor, &self.config)
    }

    /// Validate `descriptor` and start a run with the upload stage completed.
    ///
    /// Rejected descriptors never create a run and leave any previous run
    /// untouched.
    pub fn begin_run(&mut self, descriptor: InputDescriptor) -> Result<&PipelineRun, SweetTextError> {
        if self.is_running() {
            let name = self
                .run
                .as_ref()
                .map(|r| r.input.name.clone())
                .unwrap_or_default();
            return Err(SweetTextError::RunInProgress { name });
        }
        let accepted = self.validate_input(&descriptor)?;
        let replaced = self.run.is_some();

        let Self {
            config,
            observers,
            run,
            ..
        } = self;
        let toast = config.toast_duration;

        let mut new_run = PipelineRun::new(accepted.into_descriptor());
        info!(
            "Starting run for '{}' ({} bytes)",
            new_run.input.name, new_run.input.size_bytes
        );
        for obs in observers.iter() {
            obs.on_run_start(&new_run.input);
        }
        if replaced {
            for stage in &new_run.stages {
                emit_stage(observers, stage);
            }
        }

        let upload = StageName::Upload.id();
        new_run.current_stage_id = upload;
        let stage = new_run.set_status(upload, StageStatus::Completed)?;
        debug!("Stage {} ({}) → completed", stage.id, stage.name);
        emit_stage(observers, &stage);
        emit_toast(
            observers,
            Notification::new(fragments::uploaded(&new_run.input.name), Severity::Success, toast)
                .for_stage(upload),
        );

        Ok(run.insert(new_run))
    }

    /// Run the next stage: pause, mark active, pause, append, mark completed.
    ///
    /// A no-op returning [`StageResult::AlreadyTerminal`] once the run is
    /// complete. If a previous `advance` future was dropped mid-stage, the
    /// interrupted stage is resumed rather than skipped.
    pub async fn advance(&mut self) -> Result<StageResult, SweetTextError> {
        let Self {
            config,
            observers,
            run,
            ..
        } = self;
        let run = run.as_mut().ok_or(SweetTextError::NoActiveRun)?;
        if run.is_complete() {
            return Ok(StageResult::AlreadyTerminal);
        }
        let toast = config.toast_duration;

        let interrupted = run
            .stage(run.current_stage_id)
            .is_some_and(|s| s.status == StageStatus::Active);
        let id = if interrupted {
            run.current_stage_id
        } else {
            run.current_stage_id + 1
        };
        let name = StageName::from_id(id)
            .ok_or_else(|| SweetTextError::Internal(format!("no stage with id {id}")))?;
        let delay = config.timings.for_stage(name);

        if !interrupted {
            pause(delay.lead_in).await;
            run.current_stage_id = id;
            let stage = run.set_status(id, StageStatus::Active)?;
            debug!("Stage {} ({}) → active", stage.id, stage.name);
            emit_stage(observers, &stage);
            if let Some(msg) = fragments::stage_started(name) {
                emit_toast(
                    observers,
                    Notification::new(msg, Severity::Info, toast).for_stage(id),
                );
            }
        }

        pause(delay.work).await;

        let verification = Verification::from_config(config);
        if name == StageName::Verify {
            run.verification = Some(verification);
        }
        let appended = match fragments::fragment_for(name, &verification) {
            Some(text) => {
                let len = text.len();
                run.fragments.push(TextFragment {
                    stage_id: id,
                    stage: name,
                    text,
                });
                len
            }
            None => 0,
        };

        let stage = run.set_status(id, StageStatus::Completed)?;
        debug!(
            "Stage {} ({}) → completed, {} bytes appended",
            stage.id, stage.name, appended
        );
        emit_stage(observers, &stage);
        if let Some(msg) = fragments::stage_finished(name, &verification) {
            emit_toast(
                observers,
                Notification::new(msg, Severity::Success, toast).for_stage(id),
            );
        }

        let terminal = run.is_complete();
        if terminal {
            info!(
                "Run for '{}' complete: {} bytes of text",
                run.input.name,
                run.fragments.iter().map(|f| f.text.len()).sum::<usize>()
            );
            emit_toast(
                observers,
                Notification::new(fragments::RUN_COMPLETE, Severity::Success, toast)
                    .for_stage(id),
            );
            for obs in observers.iter() {
                obs.on_run_complete(run);
            }
        }

        Ok(StageResult::Advanced {
            stage,
            appended,
            terminal,
        })
    }

    /// Advance until the terminal stage has completed.
    pub async fn run_to_completion(&mut self) -> Result<&PipelineRun, SweetTextError> {
        while !self.advance().await?.is_terminal() {}
        self.run.as_ref().ok_or(SweetTextError::NoActiveRun)
    }

    /// `begin_run` followed by `run_to_completion`.
    pub async fn process(&mut self, descriptor: InputDescriptor) -> Result<&PipelineRun, SweetTextError> {
        self.begin_run(descriptor)?;
        self.run_to_completion().await
    }

    /// Full accumulated text of a completed run.
    pub fn final_text(&self) -> Result<String, SweetTextError> {
        match self.run.as_ref() {
            Some(run) if run.is_complete() => Ok(run.accumulated_text()),
            _ => Err(SweetTextError::NoContentAvailable),
        }
    }

    pub(crate) fn notify(&self, message: impl Into<String>, severity: Severity) {
        emit_toast(
            &self.observers,
            Notification::new(message, severity, self.config.toast_duration),
        );
    }

    pub(crate) fn observers(&self) -> &[ObserverHandle] {
        &self.observers
    }
}

async fn pause(d: Duration) {
    if !d.is_zero() {
        sleep(d).await;
    }
}

fn emit_stage(observers: &[ObserverHandle], stage: &Stage) {
    for obs in observers {
        obs.on_stage_status(stage);
    }
}

fn emit_toast(observers: &[ObserverHandle], notification: Notification) {
    for obs in observers {
        obs.on_notification(&notification);
    }
}
