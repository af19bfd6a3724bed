//! Error types for the edgequake-doc2office library.
//!
//! Every failure the session controller can meet falls into one of three
//! classes, and the class decides how the message is worded in the error
//! region:
//!
//! * **Validation** — detected locally before any network call (wrong file
//!   type, oversized file, convert requested without an uploaded file or a
//!   chosen format). The message is fixed text.
//!
//! * **Transport** — the request never produced a readable answer (network
//!   failure, unreachable host, a body that is not JSON). Rendered as
//!   `"<Operation> failed: <underlying message>"`.
//!
//! * **Application** — the server answered but reported a non-success
//!   status. Its `message` is shown verbatim.
//!
//! None of them is fatal to the controller: the error is rendered, the
//! session keeps its staged data, and the caller may retry, remove or reset.
//! The remaining variants cover local I/O and configuration problems that only
//! the one-shot API and the CLI can hit.

use std::path::PathBuf;
use thiserror::Error;

/// Which request a transport or application error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Convert,
    Download,
    Cleanup,
}

impl Operation {
    /// Capitalised noun used as the prefix of transport error messages.
    pub fn label(self) -> &'static str {
        match self {
            Operation::Upload => "Upload",
            Operation::Convert => "Conversion",
            Operation::Download => "Download",
            Operation::Cleanup => "Cleanup",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// All errors returned by the edgequake-doc2office library.
#[derive(Debug, Error)]
pub enum Doc2OfficeError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// The selected file is not a PDF, PNG or JPEG.
    #[error("Invalid file type. Please upload PDF, PNG, or JPG files.")]
    InvalidFileType { mime: String },

    /// The selected file is larger than the upload limit.
    #[error("File size exceeds {} limit.", size_label(*limit))]
    FileTooLarge { size: u64, limit: u64 },

    /// Convert was requested without an uploaded file or a chosen format.
    #[error("Please upload a file and select output format")]
    MissingPrerequisites,

    /// Convert was requested again after a completed conversion.
    #[error("Conversion already completed. Start a new conversion to convert again.")]
    AlreadyConverted,

    /// The output format tag is not one the server understands.
    #[error("Unknown output format '{0}'. Expected one of: word, excel, both")]
    UnknownFormat(String),

    // ── Transport errors ──────────────────────────────────────────────────
    /// The request failed before a readable response arrived.
    #[error("{operation} failed: {reason}")]
    Transport { operation: Operation, reason: String },

    // ── Application errors ────────────────────────────────────────────────
    /// The server answered with a non-success status.
    #[error("{message}")]
    Server { operation: Operation, message: String },

    // ── Local I/O errors ──────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Could not create or write a downloaded output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
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

impl Doc2OfficeError {
    /// Build a transport error from anything displayable.
    pub fn transport(operation: Operation, reason: impl std::fmt::Display) -> Self {
        Doc2OfficeError::Transport {
            operation,
            reason: reason.to_string(),
        }
    }

    /// Build an application error, falling back to a generic message when the
    /// server did not send one.
    pub fn server(operation: Operation, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("{operation} failed"));
        Doc2OfficeError::Server { operation, message }
    }

    /// Detected locally, no request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Doc2OfficeError::InvalidFileType { .. }
                | Doc2OfficeError::FileTooLarge { .. }
                | Doc2OfficeError::MissingPrerequisites
                | Doc2OfficeError::AlreadyConverted
                | Doc2OfficeError::UnknownFormat(_)
        )
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Doc2OfficeError::Transport { .. })
    }

    pub fn is_application(&self) -> bool {
        matches!(self, Doc2OfficeError::Server { .. })
    }

    /// Text shown in the error region.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// `16MB` for whole mebibytes, one decimal above 1 MiB, bytes below.
fn size_label(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else if bytes >= MIB {
        format!("{:.1}MB", bytes as f64 / MIB as f64)
    } else {
        format!("{bytes} bytes")
    }
}
