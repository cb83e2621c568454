//! Input descriptors: the `{name, size, type}` view of an uploaded file.
//!
//! The core never reads document bytes beyond the first four. For local
//! files the MIME type is sniffed from the `%PDF` magic bytes so a renamed
//! PNG is still turned away as `wrong-type`; otherwise it falls back to the
//! extension.

use crate::config::{PipelineConfig, PDF_MIME_TYPE};
use crate::error::{RejectReason, SweetTextError};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-like object handed to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDescriptor {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
}

impl InputDescriptor {
    pub fn new(name: impl Into<String>, size_bytes: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Size in MiB, for display (`2.00 MB`).
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Describe a local file.
    ///
    /// Size comes from file metadata; the MIME type from the magic bytes,
    /// else from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SweetTextError> {
        let path = path.as_ref();

        let meta = match std::fs::metadata(path) {
            Ok(m) if m.is_file() => m,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(SweetTextError::PermissionDenied {
                    path: path.to_path_buf(),
                })
            }
            // Directories, dangling links and missing paths alike.
            _ => {
                return Err(SweetTextError::FileNotFound {
                    path: path.to_path_buf(),
                })
            }
        };

        let mime_type = sniff_mime(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!("Described {}: {} bytes, {}", path.display(), meta.len(), mime_type);
        Ok(Self::new(name, meta.len(), mime_type))
    }
}

/// Proof that a descriptor passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted(InputDescriptor);

impl Accepted {
    pub fn descriptor(&self) -> &InputDescriptor {
        &self.0
    }

    pub fn into_descriptor(self) -> InputDescriptor {
        self.0
    }
}

/// Check type first, then size.
pub fn validate_input(
    descriptor: &InputDescriptor,
    config: &PipelineConfig,
) -> Result<Accepted, SweetTextError> {
    let reject = |reason| SweetTextError::InvalidInput {
        name: descriptor.name.clone(),
        reason,
    };

    if descriptor.mime_type != config.accepted_mime_type {
        return Err(reject(RejectReason::WrongType));
    }
    if descriptor.size_bytes > config.max_file_size_bytes {
        return Err(reject(RejectReason::TooLarge));
    }
    Ok(Accepted(descriptor.clone()))
}

fn sniff_mime(path: &Path) -> Result<String, SweetTextError> {
    let mut magic = [0u8; 4];
    let read_ok = match std::fs::File::open(path) {
        Ok(mut f) => f.read_exact(&mut magic).is_ok(),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SweetTextError::PermissionDenied {
                path: PathBuf::from(path),
            })
        }
        Err(_) => {
            return Err(SweetTextError::FileNotFound {
                path: PathBuf::from(path),
            })
        }
    };

    if read_ok && &magic == b"%PDF" {
        return Ok(PDF_MIME_TYPE.to_string());
    }
    Ok(mime_from_extension(path).to_string())
}

/// Best-effort MIME type from the file extension.
pub fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        // Extension alone is not trusted for PDFs: without the magic bytes
        // the file cannot be one.
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}
