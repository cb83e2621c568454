//! Text fragments and notification copy for every stage.
//!
//! All user-visible strings live here so the controller only decides *when*
//! something is said. Fragments are deterministic; the verify summary is
//! the only one parameterised (by the [`Verification`] verdict).

use crate::pipeline::verify::Verification;
use crate::stage::StageName;

/// Body appended by the generate stage.
pub const GENERATED_CONTENT: &str = "Here's your beautifully transformed content from the PDF! ✨

The document has been carefully processed and rewritten to sound naturally human while maintaining all the important information. The readability and flow have been enhanced, making it feel like it was written by a friendly, knowledgeable person rather than extracted from a formal document.

Key improvements include:
• Natural, conversational tone
• Better sentence structure and flow
• Enhanced clarity and readability
• Maintained factual accuracy
• Added warmth and personality

This content is now ready for the next step in the processing pipeline! 💖";

/// Addendum appended by the smooth stage.
pub const SMOOTHED_ADDENDUM: &str = "\n\nAfter smoothing, the content now flows even more naturally! The text has been refined to eliminate any remaining machine-like patterns and enhanced with subtle human touches that make it feel genuinely authentic.

The content now includes:
🌸 Natural variations in sentence length
🌸 Organic word choices and phrasing
🌸 Authentic transitions between ideas
🌸 Human-like emphasis and tone";

/// Summary appended by the verify stage.
pub fn verification_summary(v: &Verification) -> String {
    let (mark, quality, closing) = if v.passed {
        (
            "✅",
            "Excellent - reads naturally and authentically",
            "Your content has successfully passed the human-like quality checks! It's now ready for download and use. 💖",
        )
    } else {
        (
            "❌",
            "Needs work - some passages still read as generated",
            "Your content did not reach the human-like quality threshold. It is still available for download.",
        )
    };
    format!(
        "\n\n🛡️ Verification Results:\nHuman-like Score: {}%\nStatus: {} {}\nQuality: {}\n\n{}",
        v.score,
        mark,
        v.label(),
        quality,
        closing
    )
}

/// Text a stage appends when it finishes, `None` for stages that add nothing.
pub fn fragment_for(stage: StageName, verification: &Verification) -> Option<String> {
    match stage {
        StageName::Upload | StageName::Complete => None,
        StageName::Generate => Some(GENERATED_CONTENT.to_string()),
        StageName::Smooth => Some(SMOOTHED_ADDENDUM.to_string()),
        StageName::Verify => Some(verification_summary(verification)),
    }
}

// ── Notification copy ────────────────────────────────────────────────────

pub const WELCOME: &str = "Welcome to SweetText! Ready to transform your PDFs? 💖";
pub const WRONG_TYPE: &str = "Please select a PDF file";
pub const TOO_LARGE: &str = "File size must be less than 10MB";
pub const RUN_IN_PROGRESS: &str = "Please wait for the current file to finish processing";
pub const RUN_COMPLETE: &str = "Processing complete! Your beautiful content is ready! 💖✨";
pub const DOWNLOADED: &str = "Content downloaded successfully! 💖";
pub const COPIED: &str = "Content copied to clipboard! ✨";
pub const NOTHING_TO_DOWNLOAD: &str = "No content available for download";
pub const NOTHING_TO_COPY: &str = "No content available to copy";
pub const STATS_NOT_SAVED: &str = "Downloaded, but your stats could not be updated";
pub const UNEXPECTED: &str = "Oops! Something went wrong. Please try again. 🌸";

pub fn uploaded(name: &str) -> String {
    format!("File \"{name}\" uploaded successfully! 💖")
}

/// Info message shown when a stage turns active.
pub fn stage_started(stage: StageName) -> Option<&'static str> {
    match stage {
        StageName::Generate => Some("Generating human-like content... 🤖"),
        StageName::Smooth => Some("Smoothing content... 💫"),
        StageName::Verify => Some("Verifying human-like quality... 🛡️"),
        StageName::Upload | StageName::Complete => None,
    }
}

/// Success message shown when a stage completes.
pub fn stage_finished(stage: StageName, v: &Verification) -> Option<String> {
    match stage {
        StageName::Generate => Some("Content generation completed! ✨".to_string()),
        StageName::Smooth => Some("Smoothing completed! 🌸".to_string()),
        StageName::Verify if v.passed => Some(format!(
            "Verification passed! ({}% human-like) 🎉",
            v.score
        )),
        StageName::Verify => Some(format!(
            "Verification below threshold ({}% human-like, {}% required)",
            v.score, v.threshold
        )),
        StageName::Upload | StageName::Complete => None,
    }
}
