//! Streaming API: receive pipeline events as they happen.
//!
//! [`process_stream`] validates the descriptor up front (so rejections
//! surface as a plain `Err` and no task is spawned), then drives a fresh
//! [`PipelineController`] on a Tokio task. Every observer callback is
//! forwarded as a [`PipelineEvent`] over an unbounded channel; the stream
//! ends when the task finishes and drops its sender.

use crate::config::PipelineConfig;
use crate::controller::{PipelineController, PipelineRun};
use crate::error::SweetTextError;
use crate::pipeline::input::{self, InputDescriptor};
use crate::progress::{Notification, PipelineObserver};
use crate::stage::Stage;
use crate::stats::Stats;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;
use tracing::info;

/// One observer callback, as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    RunStarted { input: InputDescriptor },
    StageStatus { stage: Stage },
    Notification { notification: Notification },
    RunCompleted { text_len: usize },
    Stats { stats: Stats },
}

/// A boxed stream of pipeline events.
pub type EventStream = Pin<Box<dyn Stream<Item = PipelineEvent> + Send>>;

/// Observer that forwards every callback into a channel.
///
/// Events sent after the receiver is dropped are discarded.
pub struct ChannelObserver {
    tx: UnboundedSender<PipelineEvent>,
}

impl ChannelObserver {
    pub fn new(tx: UnboundedSender<PipelineEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: PipelineEvent) {
        let _ = self.tx.send(event);
    }
}

impl PipelineObserver for ChannelObserver {
    fn on_run_start(&self, input: &InputDescriptor) {
        self.send(PipelineEvent::RunStarted {
            input: input.clone(),
        });
    }

    fn on_stage_status(&self, stage: &Stage) {
        self.send(PipelineEvent::StageStatus {
            stage: stage.clone(),
        });
    }

    fn on_notification(&self, notification: &Notification) {
        self.send(PipelineEvent::Notification {
            notification: notification.clone(),
        });
    }

    fn on_run_complete(&self, run: &PipelineRun) {
        self.send(PipelineEvent::RunCompleted {
            text_len: run.fragments().iter().map(|f| f.text.len()).sum(),
        });
    }

    fn on_stats(&self, stats: &Stats) {
        self.send(PipelineEvent::Stats { stats: *stats });
    }
}

/// A pipeline running on a background task.
pub struct PipelineHandle {
    pub events: EventStream,
    pub task: JoinHandle<Result<PipelineRun, SweetTextError>>,
}

impl PipelineHandle {
    /// Wait for the run, discarding any unread events.
    pub async fn finish(self) -> Result<PipelineRun, SweetTextError> {
        drop(self.events);
        self.task
            .await
            .map_err(|e| SweetTextError::Internal(format!("pipeline task failed: {e}")))?
    }
}

/// Process `descriptor` on a spawned task, streaming events as they occur.
///
/// # Errors
/// Returns `Err(SweetTextError::InvalidInput)` synchronously if validation
/// fails; nothing is spawned in that case.
///
/// # Example
/// ```rust,no_run
/// use futures::StreamExt;
/// use sweettext::{process_stream, InputDescriptor, PipelineConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let input = InputDescriptor::new("thesis.pdf", 2_000_000, "application/pdf");
/// let mut handle = process_stream(input, PipelineConfig::default())?;
/// while let Some(event) = handle.events.next().await {
///     println!("{event:?}");
/// }
/// let run = handle.task.await??;
/// println!("{}", run.accumulated_text());
/// # Ok(())
/// # }
/// ```
pub fn process_stream(
    descriptor: InputDescriptor,
    config: PipelineConfig,
) -> Result<PipelineHandle, SweetTextError> {
    input::validate_input(&descriptor, &config)?;
    info!("Starting streaming run: {}", descriptor.name);

    let (tx, rx) = mpsc::unbounded_channel();
    let mut controller = PipelineController::new(config);
    controller.subscribe(Arc::new(ChannelObserver::new(tx)));

    let task = tokio::spawn(async move {
        controller
            .process(descriptor)
            .await
            .map(|run| run.clone())
    });

    Ok(PipelineHandle {
        events: Box::pin(UnboundedReceiverStream::new(rx)),
        task,
    })
}
