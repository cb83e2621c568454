//! Error types for the sweettext library.
//!
//! Every error here is fatal to the *operation* that raised it and never to
//! the process. The application layer ([`crate::app::SweetTextApp`]) turns
//! each one into a notification and leaves the controller in the state it
//! was in before the call.
//!
//! * [`SweetTextError::InvalidInput`]: the uploaded descriptor was rejected;
//!   no run is created.
//! * [`SweetTextError::NoContentAvailable`]: download/copy attempted before a
//!   run has completed.
//! * [`SweetTextError::ClipboardUnavailable`]: the primary clipboard failed.
//!   The copy action recovers from this locally via the fallback path, so
//!   callers only see it if the fallback fails too.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why an input descriptor was turned away by validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    /// MIME type is not `application/pdf`.
    WrongType,
    /// File exceeds the configured size cap.
    TooLarge,
}

impl RejectReason {
    /// Stable kebab-case identifier (`wrong-type`, `too-large`).
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::WrongType => "wrong-type",
            RejectReason::TooLarge => "too-large",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All errors returned by the sweettext library.
#[derive(Debug, Error)]
pub enum SweetTextError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Descriptor failed validation; no run was created.
    #[error("Input '{name}' rejected: {reason}")]
    InvalidInput { name: String, reason: RejectReason },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    // ── Run lifecycle errors ──────────────────────────────────────────────
    /// A run is already advancing; new uploads are refused until it completes.
    #[error("A pipeline run is already in progress for '{name}'")]
    RunInProgress { name: String },

    /// `advance` was called before any run was started.
    #[error("No pipeline run has been started")]
    NoActiveRun,

    /// Download or copy attempted with no completed run.
    #[error("No content available: the pipeline has not completed a run")]
    NoContentAvailable,

    // ── Action errors ─────────────────────────────────────────────────────
    /// Clipboard could not be written.
    #[error("Clipboard unavailable: {detail}")]
    ClipboardUnavailable { detail: String },

    /// Could not create or write the downloaded text file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not persist the stats document.
    #[error("Failed to save stats to '{path}': {source}")]
    StatsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SweetTextError {
    /// The rejection reason, if this is a validation failure.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            SweetTextError::InvalidInput { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, SweetTextError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_display_names_reason() {
        let e = SweetTextError::InvalidInput {
            name: "image.png".into(),
            reason: RejectReason::WrongType,
        };
        let msg = e.to_string();
        assert!(msg.contains("image.png"), "got: {msg}");
        assert!(msg.contains("wrong-type"), "got: {msg}");
    }

    #[test]
    fn reject_reason_serialises_kebab_case() {
        let json = serde_json::to_string(&RejectReason::TooLarge).unwrap();
        assert_eq!(json, "\"too-large\"");
        let back: RejectReason = serde_json::from_str("\"wrong-type\"").unwrap();
        assert_eq!(back, RejectReason::WrongType);
    }

    #[test]
    fn reject_reason_accessor() {
        let e = SweetTextError::InvalidInput {
            name: "big.pdf".into(),
            reason: RejectReason::TooLarge,
        };
        assert_eq!(e.reject_reason(), Some(RejectReason::TooLarge));
        assert_eq!(SweetTextError::NoContentAvailable.reject_reason(), None);
    }

    #[test]
    fn run_in_progress_display() {
        let e = SweetTextError::RunInProgress {
            name: "thesis.pdf".into(),
        };
        assert!(e.to_string().contains("thesis.pdf"));
    }
}
