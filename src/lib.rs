//! # edgequake-doc2office
//!
//! Client for a PDF / image → Word / Excel conversion server.
//!
//! ## Why this crate?
//!
//! The conversion itself (OCR, table detection, DOCX/XLSX generation) runs on
//! the server. What a client has to get right is the session around it: only
//! upload files the server accepts, never ask for a conversion before the
//! upload has been acknowledged and a format picked, and turn every failure
//! into a readable message instead of a crash. This crate packages that
//! session as a small state machine with an explicit view-model, usable from
//! a CLI, a TUI, or a test.
//!
//! ## Session Overview
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Stage     sniff MIME, check type (PDF/PNG/JPEG) and size (≤ 16 MiB)
//!  ├─ 2. Upload    POST /upload (multipart) → server identifier + preview
//!  ├─ 3. Format    word | excel | both
//!  ├─ 4. Convert   POST /convert (JSON) → download descriptors
//!  └─ 5. Download  GET each descriptor URL → atomic write to disk
//! ```
//!
//! After every step the [`SessionController`] hands its [`ViewState`] to the
//! configured [`SessionRenderer`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc2office::{convert_to_dir, ClientConfig, OutputFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .server_url("http://localhost:5000")
//!         .build()?;
//!     let outcome = convert_to_dir("scan.pdf", OutputFormat::Both, "out", &config).await?;
//!     for saved in &outcome.saved {
//!         println!("{} ({} bytes)", saved.path.display(), saved.bytes);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2office` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-doc2office = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod protocol;
pub mod render;
pub mod session;
pub mod view;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{ConversionBackend, HttpBackend};
pub use config::{ClientConfig, ClientConfigBuilder, OutputFormat, ACCEPTED_MIME_TYPES, DEFAULT_MAX_UPLOAD_BYTES};
pub use convert::{cleanup, convert_file, convert_file_sync, convert_to_dir, preview_file, ConversionOutcome, UploadPreview};
pub use error::{Doc2OfficeError, Operation};
pub use pipeline::download::SavedFile;
pub use pipeline::input::{load_file, LocalFile};
pub use protocol::{ConvertRequest, ConvertResponse, Download, DownloadKind, PreviewDescriptor, UploadResponse};
pub use render::{NoopRenderer, Renderer, SessionRenderer};
pub use session::{Phase, SessionController, StagedFile};
pub use view::{preview_lines, DownloadEntry, PreviewLine, Progress, ScrollTarget, ViewState};
