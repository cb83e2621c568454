//! Human-likeness verdict produced by the verify stage.
//!
//! No detector is wired in: the score is a configured constant and the
//! verdict is derived from it against the configured threshold.

use crate::config::PipelineConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    /// Percentage, 0–100.
    pub score: u8,
    pub threshold: u8,
    /// `score >= threshold`.
    pub passed: bool,
}

impl Verification {
    pub fn new(score: u8, threshold: u8) -> Self {
        Self {
            score,
            threshold,
            passed: score >= threshold,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.verification_score, config.verification_threshold)
    }

    pub fn label(&self) -> &'static str {
        if self.passed {
            "Passed verification"
        } else {
            "Failed verification"
        }
    }
}
