//! Download and copy actions for a finished run's text.
//!
//! Both take the final text as a plain `&str`; deciding whether there *is*
//! a final text (and reporting `NoContentAvailable` otherwise) is the
//! caller's job, see [`crate::app::SweetTextApp`].

use crate::error::SweetTextError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::io::{ErrorKind, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// MIME type of every downloaded artifact.
pub const DOWNLOAD_MIME_TYPE: &str = "text/plain";

// ── Download ─────────────────────────────────────────────────────────────

/// A text file written by [`download`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub path: PathBuf,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// `<prefix>-<unix-millis>.txt`
pub fn download_file_name(prefix: &str, timestamp_ms: u128) -> String {
    format!("{prefix}-{timestamp_ms}.txt")
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Write `text` into `dir` as a timestamped `.txt` file.
///
/// The body goes to a per-call temp file which is then linked into place
/// without replacing anything. If the name is taken (two downloads in the
/// same millisecond) a `-1`, `-2`, ... suffix is added.
pub async fn download(
    text: &str,
    dir: impl AsRef<Path>,
    prefix: &str,
) -> Result<DownloadArtifact, SweetTextError> {
    let dir = dir.as_ref().to_path_buf();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|source| SweetTextError::OutputWriteFailed {
            path: dir.clone(),
            source,
        })?;

    let body = text.as_bytes().to_vec();
    let size_bytes = body.len() as u64;
    let prefix = prefix.to_string();
    let timestamp_ms = unix_millis();
    let (file_name, path) =
        tokio::task::spawn_blocking(move || persist_unique(&dir, &prefix, timestamp_ms, &body))
            .await
            .map_err(|e| SweetTextError::Internal(format!("download task failed: {e}")))??;

    info!("Downloaded {} bytes to {}", size_bytes, path.display());
    Ok(DownloadArtifact {
        file_name,
        path,
        mime_type: DOWNLOAD_MIME_TYPE.to_string(),
        size_bytes,
    })
}

fn persist_unique(
    dir: &Path,
    prefix: &str,
    timestamp_ms: u128,
    body: &[u8],
) -> Result<(String, PathBuf), SweetTextError> {
    let write_err = |path: &Path, source| SweetTextError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    // Dropping `tmp` on any error path deletes the temp file.
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| write_err(dir, e))?;
    tmp.write_all(body)
        .and_then(|_| tmp.flush())
        .map_err(|e| write_err(dir, e))?;

    let mut n = 0u32;
    loop {
        let file_name = if n == 0 {
            download_file_name(prefix, timestamp_ms)
        } else {
            format!("{prefix}-{timestamp_ms}-{n}.txt")
        };
        let path = dir.join(&file_name);
        match tmp.persist_noclobber(&path) {
            Ok(_) => return Ok((file_name, path)),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                debug!("{} exists, trying the next suffix", path.display());
                tmp = e.file;
                n += 1;
            }
            Err(e) => return Err(write_err(&path, e.error)),
        }
    }
}

// ── Copy ─────────────────────────────────────────────────────────────────

/// Which path placed the text on the clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyMethod {
    Primary,
    Fallback,
}

/// A system clipboard with a primary API and a legacy fallback.
pub trait Clipboard: Send + Sync {
    fn write_text(&self, text: &str) -> Result<(), SweetTextError>;

    /// Legacy mechanism used when `write_text` fails.
    fn write_text_fallback(&self, text: &str) -> Result<(), SweetTextError> {
        let _ = text;
        Err(SweetTextError::ClipboardUnavailable {
            detail: "no fallback mechanism".into(),
        })
    }
}

/// Place `text` on the clipboard, falling back transparently.
pub fn copy(text: &str, clipboard: &dyn Clipboard) -> Result<CopyMethod, SweetTextError> {
    match clipboard.write_text(text) {
        Ok(()) => Ok(CopyMethod::Primary),
        Err(e) => {
            warn!("Primary clipboard failed ({e}); using fallback");
            clipboard.write_text_fallback(text)?;
            Ok(CopyMethod::Fallback)
        }
    }
}

/// Platform clipboard via the usual command-line tools, with an OSC 52
/// terminal escape as the fallback.
#[derive(Debug, Clone, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    /// Candidate commands for this platform, in preference order.
    fn candidates() -> Vec<(&'static str, &'static [&'static str])> {
        const NO_ARGS: &[&str] = &[];
        const XCLIP_ARGS: &[&str] = &["-selection", "clipboard"];
        const XSEL_ARGS: &[&str] = &["--clipboard", "--input"];

        if cfg!(target_os = "macos") {
            vec![("pbcopy", NO_ARGS)]
        } else if cfg!(target_os = "windows") {
            vec![("clip.exe", NO_ARGS)]
        } else {
            let mut v = Vec::new();
            if std::env::var_os("WAYLAND_DISPLAY").is_some() {
                v.push(("wl-copy", NO_ARGS));
            }
            v.push(("xclip", XCLIP_ARGS));
            v.push(("xsel", XSEL_ARGS));
            v
        }
    }

    fn pipe_to(cmd: &str, args: &[&str], text: &str) -> std::io::Result<()> {
        let mut child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        // Close stdin before waiting so the child sees EOF, and always reap it.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(text.as_bytes()),
            None => Ok(()),
        };
        let status = child.wait()?;
        written?;
        if status.success() {
            Ok(())
        } else {
            Err(std::io::Error::other(format!("{cmd} exited with {status}")))
        }
    }
}

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), SweetTextError> {
        let mut last = String::from("no clipboard tool found");
        for (cmd, args) in Self::candidates() {
            match Self::pipe_to(cmd, args, text) {
                Ok(()) => {
                    debug!("Copied {} bytes via {}", text.len(), cmd);
                    return Ok(());
                }
                Err(e) => last = format!("{cmd}: {e}"),
            }
        }
        Err(SweetTextError::ClipboardUnavailable { detail: last })
    }

    fn write_text_fallback(&self, text: &str) -> Result<(), SweetTextError> {
        let stderr = std::io::stderr();
        if !stderr.is_terminal() {
            return Err(SweetTextError::ClipboardUnavailable {
                detail: "stderr is not a terminal".into(),
            });
        }
        let mut handle = stderr.lock();
        handle
            .write_all(osc52_sequence(text).as_bytes())
            .and_then(|_| handle.flush())
            .map_err(|e| SweetTextError::ClipboardUnavailable {
                detail: e.to_string(),
            })
    }
}

/// `ESC ] 52 ; c ; <base64> BEL`: sets the terminal's clipboard selection.
pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", STANDARD.encode(text.as_bytes()))
}
