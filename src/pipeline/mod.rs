//! Stage bodies for the text-transformation pipeline.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ generate ──▶ smooth ──▶ verify ──▶ complete
//! (check)   (fragment)   (fragment)  (score)
//! ```
//!
//! 1. [`input`]    : build and validate the uploaded file descriptor
//! 2. [`fragments`]: deterministic text each stage appends, plus the
//!    notification copy for every transition
//! 3. [`verify`]   : the fixed human-likeness verdict
//!
//! The controller ([`crate::controller`]) owns sequencing and pauses; these
//! modules are pure and synchronous.

pub mod fragments;
pub mod input;
pub mod verify;
