//! Integration tests for the sweettext pipeline.
//!
//! Everything runs with instant stage timings except the timing test, which
//! uses Tokio's paused clock. No test touches the real clipboard or the
//! user's stats file.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sweettext::pipeline::fragments;
use sweettext::{
    Clipboard, CopyMethod, FileStatsStore, InputDescriptor, MemoryStatsStore, Notification,
    PipelineConfig, PipelineController, PipelineObserver, PipelineRun, RejectReason, Severity,
    Stage, StageName, StageResult, StageStatus, StageTimings, StatsStore, SweetTextApp,
    SweetTextError,
};
use tokio_test::{assert_err, assert_ok};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Records every callback in arrival order.
#[derive(Default)]
struct Recorder {
    stages: Mutex<Vec<Stage>>,
    toasts: Mutex<Vec<Notification>>,
    completed_runs: Mutex<Vec<PipelineRun>>,
}

impl Recorder {
    fn toasts(&self) -> Vec<Notification> {
        self.toasts.lock().unwrap().clone()
    }

    fn last_toast(&self) -> Notification {
        self.toasts().last().cloned().expect("no toast recorded")
    }

    fn stage_events(&self) -> Vec<(u32, StageStatus)> {
        self.stages
            .lock()
            .unwrap()
            .iter()
            .map(|s| (s.id, s.status))
            .collect()
    }
}

impl PipelineObserver for Recorder {
    fn on_stage_status(&self, stage: &Stage) {
        self.stages.lock().unwrap().push(stage.clone());
    }

    fn on_notification(&self, n: &Notification) {
        self.toasts.lock().unwrap().push(n.clone());
    }

    fn on_run_complete(&self, run: &PipelineRun) {
        self.completed_runs.lock().unwrap().push(run.clone());
    }
}

#[derive(Default)]
struct FakeClipboard {
    deny_primary: bool,
    contents: Mutex<Option<String>>,
}

impl Clipboard for FakeClipboard {
    fn write_text(&self, text: &str) -> Result<(), SweetTextError> {
        if self.deny_primary {
            return Err(SweetTextError::ClipboardUnavailable {
                detail: "permission denied".into(),
            });
        }
        *self.contents.lock().unwrap() = Some(text.to_string());
        Ok(())
    }

    fn write_text_fallback(&self, text: &str) -> Result<(), SweetTextError> {
        *self.contents.lock().unwrap() = Some(text.to_string());
        Ok(())
    }
}

fn thesis() -> InputDescriptor {
    InputDescriptor::new("thesis.pdf", 2_000_000, "application/pdf")
}

fn instant_config(recorder: &Arc<Recorder>) -> PipelineConfig {
    PipelineConfig::builder()
        .timings(StageTimings::instant())
        .observer(recorder.clone())
        .build()
        .unwrap()
}

/// At most one active stage; completed before current, pending after.
fn assert_status_invariant(stages: &[Stage], current: u32) {
    let active = stages
        .iter()
        .filter(|s| s.status == StageStatus::Active)
        .count();
    assert!(active <= 1, "more than one active stage: {stages:?}");
    for s in stages {
        if s.id < current {
            assert_eq!(s.status, StageStatus::Completed, "stage {} before current", s.id);
        } else if s.id > current {
            assert_eq!(s.status, StageStatus::Pending, "stage {} after current", s.id);
        }
    }
}

fn app_in(dir: &Path, store: Arc<dyn StatsStore>) -> (SweetTextApp, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let app = SweetTextApp::new(instant_config(&recorder), store).with_download_dir(dir);
    (app, recorder)
}

// ── Controller ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn thesis_upload_starts_run_with_upload_completed() {
    let recorder = Arc::new(Recorder::default());
    let mut controller = PipelineController::new(instant_config(&recorder));

    let run = assert_ok!(controller.begin_run(thesis()));
    assert_eq!(run.current_stage_id(), 1);
    assert_eq!(run.stages()[0].status, StageStatus::Completed);
    assert!(run.stages()[1..]
        .iter()
        .all(|s| s.status == StageStatus::Pending));
    assert_eq!(run.accumulated_text(), "");

    let toast = recorder.last_toast();
    assert_eq!(toast.severity, Severity::Success);
    assert!(toast.message.contains("thesis.pdf"));
}

#[tokio::test]
async fn png_is_rejected_without_creating_a_run() {
    let recorder = Arc::new(Recorder::default());
    let mut controller = PipelineController::new(instant_config(&recorder));

    let err = assert_err!(controller.begin_run(InputDescriptor::new("image.png", 1000, "image/png")));
    assert_eq!(err.reject_reason(), Some(RejectReason::WrongType));
    assert!(controller.run().is_none());
    assert!(recorder.stage_events().is_empty());
}

#[tokio::test]
async fn oversized_pdf_is_rejected_but_exact_cap_is_accepted() {
    let recorder = Arc::new(Recorder::default());
    let mut controller = PipelineController::new(instant_config(&recorder));
    let cap = controller.config().max_file_size_bytes;

    let err = assert_err!(controller.begin_run(InputDescriptor::new(
        "big.pdf",
        cap + 1,
        "application/pdf"
    )));
    assert_eq!(err.reject_reason(), Some(RejectReason::TooLarge));

    assert_ok!(controller.begin_run(InputDescriptor::new("edge.pdf", cap, "application/pdf")));
}

#[tokio::test]
async fn four_advances_reach_terminal_and_keep_invariant() {
    let recorder = Arc::new(Recorder::default());
    let mut controller = PipelineController::new(instant_config(&recorder));
    controller.begin_run(thesis()).unwrap();

    for expected in 2..=5 {
        let result = assert_ok!(controller.advance().await);
        match result {
            StageResult::Advanced { stage, terminal, .. } => {
                assert_eq!(stage.id, expected);
                assert_eq!(stage.status, StageStatus::Completed);
                assert_eq!(terminal, expected == 5);
            }
            StageResult::AlreadyTerminal => panic!("terminal too early at {expected}"),
        }
        let run = controller.run().unwrap();
        assert_status_invariant(run.stages(), run.current_stage_id());
    }

    let run = controller.run().unwrap();
    assert!(run.is_complete());
    assert!(run.stages().iter().all(|s| s.status == StageStatus::Completed));
    assert_eq!(recorder.completed_runs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn every_stage_goes_active_then_completed_in_order() {
    let recorder = Arc::new(Recorder::default());
    let mut controller = PipelineController::new(instant_config(&recorder));
    controller.process(thesis()).await.unwrap();

    use StageStatus::{Active, Completed};
    assert_eq!(
        recorder.stage_events(),
        vec![
            (1, Completed),
            (2, Active),
            (2, Completed),
            (3, Active),
            (3, Completed),
            (4, Active),
            (4, Completed),
            (5, Active),
            (5, Completed),
        ]
    );
}

#[tokio::test]
async fn new_run_after_completion_resets_renderers_first() {
    let recorder = Arc::new(Recorder::default());
    let mut controller = PipelineController::new(instant_config(&recorder));
    controller.process(thesis()).await.unwrap();
    let first_run_events = recorder.stage_events().len();

    controller
        .begin_run(InputDescriptor::new("notes.pdf", 1_000, "application/pdf"))
        .unwrap();

    use StageStatus::{Completed, Pending};
    assert_eq!(
        recorder.stage_events()[first_run_events..].to_vec(),
        vec![
            (1, Pending),
            (2, Pending),
            (3, Pending),
            (4, Pending),
            (5, Pending),
            (1, Completed),
        ]
    );
    let run = controller.run().unwrap();
    assert_eq!(run.input().name, "notes.pdf");
    assert_eq!(run.accumulated_text(), "");
}

#[tokio::test]
async fn advancing_past_terminal_changes_nothing() {
    let recorder = Arc::new(Recorder::default());
    let mut controller = PipelineController::new(instant_config(&recorder));
    controller.process(thesis()).await.unwrap();

    let before = controller.run().cloned().unwrap();
    let events_before = recorder.stage_events().len();
    let toasts_before = recorder.toasts().len();

    let result = assert_ok!(controller.advance().await);
    assert_eq!(result, StageResult::AlreadyTerminal);
    assert_eq!(controller.run().unwrap(), &before);
    assert_eq!(recorder.stage_events().len(), events_before);
    assert_eq!(recorder.toasts().len(), toasts_before);
}

#[tokio::test]
async fn accumulated_text_is_fragments_in_stage_order() {
    let recorder = Arc::new(Recorder::default());
    let mut controller = PipelineController::new(instant_config(&recorder));
    let run = controller.process(thesis()).await.unwrap();

    let stages: Vec<StageName> = run.fragments().iter().map(|f| f.stage).collect();
    assert_eq!(
        stages,
        vec![StageName::Generate, StageName::Smooth, StageName::Verify]
    );

    let text = run.accumulated_text();
    assert!(text.starts_with(fragments::GENERATED_CONTENT));
    let smooth_at = text.find("After smoothing").unwrap();
    let verify_at = text.find("Verification Results").unwrap();
    assert!(smooth_at < verify_at);
    assert!(text.contains("Human-like Score: 94%"));
    assert!(text.contains("Passed verification"));
    assert_eq!(controller.final_text().unwrap(), text);
}

#[tokio::test]
async fn advance_without_run_fails() {
    let mut controller = PipelineController::new(PipelineConfig::default());
    let err = assert_err!(controller.advance().await);
    assert!(matches!(err, SweetTextError::NoActiveRun));
    assert!(matches!(
        controller.final_text(),
        Err(SweetTextError::NoContentAvailable)
    ));
}

#[tokio::test(start_paused = true)]
async fn generate_waits_for_its_lead_in() {
    let recorder = Arc::new(Recorder::default());
    let config = PipelineConfig::builder()
        .observer(recorder.clone())
        .build()
        .unwrap();
    let mut controller = PipelineController::new(config);
    controller.begin_run(thesis()).unwrap();

    let started = tokio::time::Instant::now();
    let result = controller.advance().await.unwrap();
    assert!(matches!(result, StageResult::Advanced { terminal: false, .. }));
    // 1 s lead-in plus 3 s of work.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(4_000), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(4_100), "{elapsed:?}");
    assert_eq!(
        recorder.stage_events()[1..].to_vec(),
        vec![(2, StageStatus::Active), (2, StageStatus::Completed)]
    );
}

// ── App: stats, download, copy ──────────────────────────────────────────────

#[tokio::test]
async fn download_before_any_run_warns_and_counts_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStatsStore::new());
    let (app, recorder) = app_in(dir.path(), store.clone());

    let err = assert_err!(app.download_content().await);
    assert!(matches!(err, SweetTextError::NoContentAvailable));
    assert_eq!(recorder.last_toast().message, fragments::NOTHING_TO_DOWNLOAD);
    assert_eq!(store.load().completed, 0);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn completed_counter_moves_only_on_download() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStatsStore::new());
    let (mut app, _) = app_in(dir.path(), store.clone());

    app.handle_file(thesis()).await.unwrap();
    assert_eq!(store.load().completed, 0);

    let clipboard = FakeClipboard::default();
    assert_ok!(app.copy_content(&clipboard));
    assert_eq!(store.load().completed, 0, "copy must not count");

    let artifact = assert_ok!(app.download_content().await);
    assert_eq!(store.load().completed, 1);
    assert_eq!(artifact.mime_type, "text/plain");
    assert!(artifact.file_name.starts_with("sweettext-processed-"));
    let saved = std::fs::read_to_string(&artifact.path).unwrap();
    assert_eq!(saved, app.controller().final_text().unwrap());
}

#[tokio::test]
async fn every_download_leaves_its_own_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStatsStore::new());
    let (mut app, _) = app_in(dir.path(), store.clone());
    app.handle_file(thesis()).await.unwrap();

    for _ in 0..20 {
        assert_ok!(app.download_content().await);
    }
    let files = std::fs::read_dir(dir.path()).unwrap().count() as u64;
    assert_eq!(store.load().completed, 20);
    assert_eq!(files, store.load().completed);
}

#[tokio::test]
async fn stats_persist_across_app_instances() {
    let dir = tempfile::tempdir().unwrap();
    let stats_path = dir.path().join("storage.json");

    {
        let (mut app, _) = app_in(dir.path(), Arc::new(FileStatsStore::new(&stats_path)));
        app.handle_file(thesis()).await.unwrap();
        app.download_content().await.unwrap();
        app.download_content().await.unwrap();
    }

    let (app, recorder) = app_in(dir.path(), Arc::new(FileStatsStore::new(&stats_path)));
    let stats = app.start();
    assert_eq!(stats.completed, 2);
    assert_eq!(recorder.last_toast().message, fragments::WELCOME);
}

#[tokio::test]
async fn copy_uses_fallback_when_primary_is_denied() {
    let dir = tempfile::tempdir().unwrap();
    let (mut app, recorder) = app_in(dir.path(), Arc::new(MemoryStatsStore::new()));
    app.handle_file(thesis()).await.unwrap();

    let clipboard = FakeClipboard {
        deny_primary: true,
        ..Default::default()
    };
    let method = assert_ok!(app.copy_content(&clipboard));
    assert_eq!(method, CopyMethod::Fallback);
    assert_eq!(
        clipboard.contents.lock().unwrap().clone(),
        Some(app.controller().final_text().unwrap())
    );
    assert_eq!(recorder.last_toast().message, fragments::COPIED);
}

#[tokio::test]
async fn copy_before_run_warns() {
    let dir = tempfile::tempdir().unwrap();
    let (app, recorder) = app_in(dir.path(), Arc::new(MemoryStatsStore::new()));
    let clipboard = FakeClipboard::default();

    assert_err!(app.copy_content(&clipboard));
    let toast = recorder.last_toast();
    assert_eq!(toast.severity, Severity::Warning);
    assert_eq!(toast.message, fragments::NOTHING_TO_COPY);
    assert!(clipboard.contents.lock().unwrap().is_none());
}

#[tokio::test]
async fn rejected_upload_leaves_previous_run_intact() {
    let dir = tempfile::tempdir().unwrap();
    let (mut app, recorder) = app_in(dir.path(), Arc::new(MemoryStatsStore::new()));
    app.handle_file(thesis()).await.unwrap();
    let before = app.controller().final_text().unwrap();

    assert_err!(
        app.handle_file(InputDescriptor::new("image.png", 1000, "image/png"))
            .await
    );
    assert_eq!(recorder.last_toast().message, fragments::WRONG_TYPE);
    assert_eq!(app.controller().final_text().unwrap(), before);
}

#[tokio::test]
async fn handle_path_reads_a_real_pdf_file() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = dir.path().join("thesis.pdf");
    std::fs::write(&pdf, b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n").unwrap();

    let (mut app, _) = app_in(dir.path(), Arc::new(MemoryStatsStore::new()));
    let run = assert_ok!(app.handle_path(&pdf).await);
    assert_eq!(run.input().name, "thesis.pdf");
    assert_eq!(run.input().mime_type, "application/pdf");
    assert!(run.is_complete());
}

#[tokio::test]
async fn handle_path_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let (mut app, recorder) = app_in(dir.path(), Arc::new(MemoryStatsStore::new()));

    let err = assert_err!(app.handle_path(dir.path().join("gone.pdf")).await);
    assert!(matches!(err, SweetTextError::FileNotFound { .. }));
    assert_eq!(recorder.last_toast().severity, Severity::Error);
}
