//! Configuration for a pipeline controller.
//!
//! Every knob lives in [`PipelineConfig`], built via
//! [`PipelineConfigBuilder`]. The stage pauses are plain [`Duration`]s so
//! test suites can swap in [`StageTimings::instant`] and run a full pipeline
//! without waiting.

use crate::error::SweetTextError;
use crate::progress::ObserverHandle;
use crate::stage::StageName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Largest accepted upload: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// The only MIME type the upload stage accepts.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Configuration for a [`crate::controller::PipelineController`].
///
/// # Example
/// ```rust
/// use sweettext::{PipelineConfig, StageTimings};
///
/// let config = PipelineConfig::builder()
///     .timings(StageTimings::instant())
///     .verification_threshold(90)
///     .build()
///     .unwrap();
/// assert_eq!(config.verification_score, 94);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Upload size cap in bytes. Default: 10 MiB. Sizes strictly above are rejected.
    pub max_file_size_bytes: u64,

    /// MIME type required of uploads. Default: `application/pdf`.
    pub accepted_mime_type: String,

    /// Pauses before and during each simulated stage.
    pub timings: StageTimings,

    /// Human-likeness score reported by the verify stage. Default: 94.
    pub verification_score: u8,

    /// Minimum score labelled as passing. Default: 80.
    pub verification_threshold: u8,

    /// File-name prefix for downloads: `<prefix>-<millis>.txt`.
    pub download_prefix: String,

    /// How long notifications stay visible. Default: 5 s.
    pub toast_duration: Duration,

    /// Initial observer registered on the controller.
    pub observer: Option<ObserverHandle>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE,
            accepted_mime_type: PDF_MIME_TYPE.to_string(),
            timings: StageTimings::default(),
            verification_score: 94,
            verification_threshold: 80,
            download_prefix: "sweettext-processed".to_string(),
            toast_duration: Duration::from_secs(5),
            observer: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("max_file_size_bytes", &self.max_file_size_bytes)
            .field("accepted_mime_type", &self.accepted_mime_type)
            .field("timings", &self.timings)
            .field("verification_score", &self.verification_score)
            .field("verification_threshold", &self.verification_threshold)
            .field("download_prefix", &self.download_prefix)
            .field("toast_duration", &self.toast_duration)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn PipelineObserver>"))
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn max_file_size_bytes(mut self, n: u64) -> Self {
        self.config.max_file_size_bytes = n;
        self
    }

    pub fn accepted_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.config.accepted_mime_type = mime.into();
        self
    }

    pub fn timings(mut self, timings: StageTimings) -> Self {
        self.config.timings = timings;
        self
    }

    pub fn verification_score(mut self, score: u8) -> Self {
        self.config.verification_score = score;
        self
    }

    pub fn verification_threshold(mut self, threshold: u8) -> Self {
        self.config.verification_threshold = threshold;
        self
    }

    pub fn download_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.download_prefix = prefix.into();
        self
    }

    pub fn toast_duration(mut self, d: Duration) -> Self {
        self.config.toast_duration = d;
        self
    }

    pub fn observer(mut self, observer: ObserverHandle) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, SweetTextError> {
        let c = &self.config;
        if c.max_file_size_bytes == 0 {
            return Err(SweetTextError::InvalidConfig(
                "max file size must be > 0".into(),
            ));
        }
        if c.verification_score > 100 || c.verification_threshold > 100 {
            return Err(SweetTextError::InvalidConfig(format!(
                "verification score/threshold must be 0–100, got {}/{}",
                c.verification_score, c.verification_threshold
            )));
        }
        if c.download_prefix.trim().is_empty() {
            return Err(SweetTextError::InvalidConfig(
                "download prefix must not be empty".into(),
            ));
        }
        if c.accepted_mime_type.trim().is_empty() {
            return Err(SweetTextError::InvalidConfig(
                "accepted MIME type must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Timings ──────────────────────────────────────────────────────────────

/// Pauses around one simulated stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageDelay {
    /// Pause before the stage is marked active.
    pub lead_in: Duration,
    /// Pause while the stage is active, before its fragment is appended.
    pub work: Duration,
}

impl StageDelay {
    pub const fn from_millis(lead_in: u64, work: u64) -> Self {
        Self {
            lead_in: Duration::from_millis(lead_in),
            work: Duration::from_millis(work),
        }
    }

    pub fn total(&self) -> Duration {
        self.lead_in + self.work
    }
}

/// Per-stage pauses. Upload has none: it completes the moment a file is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimings {
    pub generate: StageDelay,
    pub smooth: StageDelay,
    pub verify: StageDelay,
    pub complete: StageDelay,
}

impl Default for StageTimings {
    fn default() -> Self {
        Self {
            generate: StageDelay::from_millis(1000, 3000),
            smooth: StageDelay::from_millis(2000, 2500),
            verify: StageDelay::from_millis(2000, 2000),
            complete: StageDelay::from_millis(1000, 0),
        }
    }
}

impl StageTimings {
    /// No pauses at all.
    pub fn instant() -> Self {
        Self {
            generate: StageDelay::default(),
            smooth: StageDelay::default(),
            verify: StageDelay::default(),
            complete: StageDelay::default(),
        }
    }

    /// Every default pause multiplied by `factor` (e.g. `0.1` for a quick demo).
    ///
    /// # Errors
    /// `InvalidConfig` if `factor` is negative, not finite, or makes a pause
    /// too long to represent.
    pub fn scaled(factor: f64) -> Result<Self, SweetTextError> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(SweetTextError::InvalidConfig(format!(
                "timing factor must be a non-negative number (got {factor})"
            )));
        }
        let scale = |d: Duration| {
            Duration::try_from_secs_f64(d.as_secs_f64() * factor).map_err(|e| {
                SweetTextError::InvalidConfig(format!("timing factor {factor} is too large: {e}"))
            })
        };
        let s = |delay: StageDelay| -> Result<StageDelay, SweetTextError> {
            Ok(StageDelay {
                lead_in: scale(delay.lead_in)?,
                work: scale(delay.work)?,
            })
        };
        let d = Self::default();
        Ok(Self {
            generate: s(d.generate)?,
            smooth: s(d.smooth)?,
            verify: s(d.verify)?,
            complete: s(d.complete)?,
        })
    }

    pub fn for_stage(&self, name: StageName) -> StageDelay {
        match name {
            StageName::Upload => StageDelay::default(),
            StageName::Generate => self.generate,
            StageName::Smooth => self.smooth,
            StageName::Verify => self.verify,
            StageName::Complete => self.complete,
        }
    }

    /// Sum of all pauses for one full run.
    pub fn total(&self) -> Duration {
        StageName::ALL.iter().map(|n| self.for_stage(*n).total()).sum()
    }
}
