//! Stage descriptors for the fixed five-step pipeline.
//!
//! ```text
//! 1 upload ──▶ 2 generate ──▶ 3 smooth ──▶ 4 verify ──▶ 5 complete
//! ```
//!
//! Ids are stable 1-based ordinals. The ordering of [`StageName::ALL`] is the
//! only place the sequence is defined.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbolic identifier of a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Upload,
    Generate,
    Smooth,
    Verify,
    Complete,
}

impl StageName {
    /// Every stage in pipeline order.
    pub const ALL: [StageName; 5] = [
        StageName::Upload,
        StageName::Generate,
        StageName::Smooth,
        StageName::Verify,
        StageName::Complete,
    ];

    /// 1-based ordinal position.
    pub fn id(&self) -> u32 {
        match self {
            StageName::Upload => 1,
            StageName::Generate => 2,
            StageName::Smooth => 3,
            StageName::Verify => 4,
            StageName::Complete => 5,
        }
    }

    /// Look up a stage by its ordinal, `None` outside `1..=5`.
    pub fn from_id(id: u32) -> Option<StageName> {
        Self::ALL.iter().copied().find(|s| s.id() == id)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Upload => "upload",
            StageName::Generate => "generate",
            StageName::Smooth => "smooth",
            StageName::Verify => "verify",
            StageName::Complete => "complete",
        }
    }

    /// Human-readable label for progress displays.
    pub fn label(&self) -> &'static str {
        match self {
            StageName::Upload => "Upload PDF",
            StageName::Generate => "Generate content",
            StageName::Smooth => "Smooth text",
            StageName::Verify => "Verify human-likeness",
            StageName::Complete => "Complete",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress state of a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Pending,
    Active,
    Completed,
}

impl StageStatus {
    /// Visual indicator a renderer should show for this status.
    pub fn indicator(&self) -> StageIndicator {
        match self {
            StageStatus::Active => StageIndicator::Spinner,
            StageStatus::Completed => StageIndicator::Checkmark,
            StageStatus::Pending => StageIndicator::IdleSpinner,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::Active => "active",
            StageStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a stage-render collaborator draws next to a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageIndicator {
    Spinner,
    Checkmark,
    IdleSpinner,
}

/// One step of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: u32,
    pub name: StageName,
    pub status: StageStatus,
}

impl Stage {
    pub fn new(name: StageName) -> Self {
        Self {
            id: name.id(),
            name,
            status: StageStatus::Pending,
        }
    }
}

/// The full pipeline with every stage `pending`.
pub fn default_stages() -> Vec<Stage> {
    StageName::ALL.iter().copied().map(Stage::new).collect()
}

/// Id of the terminal stage.
pub const TERMINAL_STAGE_ID: u32 = 5;
