//! One-shot entry points.
//!
//! These drive a fresh [`SessionController`] through a whole attempt (stage,
//! upload, choose format, convert) and hand back a summary. Use the controller
//! directly when you need the intermediate states, e.g. to let a user pick
//! the format after seeing the preview.

use crate::backend::{ConversionBackend, HttpBackend};
use crate::config::{ClientConfig, OutputFormat};
use crate::error::{Doc2OfficeError, Operation};
use crate::pipeline::download::{save_all, SavedFile};
use crate::pipeline::input;
use crate::protocol::{CleanupRequest, PreviewDescriptor};
use crate::session::SessionController;
use crate::view::DownloadEntry;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Result of a completed conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutcome {
    /// Local file name that was uploaded.
    pub file_name: String,
    /// Identifier the server assigned to the upload.
    pub server_filename: String,
    pub format: OutputFormat,
    pub preview: Option<PreviewDescriptor>,
    pub downloads: Vec<DownloadEntry>,
    /// Files written by [`convert_to_dir`]; empty for [`convert_file`].
    pub saved: Vec<SavedFile>,
    pub duration_ms: u64,
}

/// Result of an upload without conversion.
#[derive(Debug, Clone, Serialize)]
pub struct UploadPreview {
    pub file_name: String,
    pub server_filename: String,
    pub preview: Option<PreviewDescriptor>,
}

/// Upload `path` and convert it to `format`.
///
/// # Errors
/// The first failure of the attempt: local read errors, validation errors
/// (type, size), transport errors and server-reported errors.
///
/// # Example
/// ```rust,no_run
/// use edgequake_doc2office::{convert_file, ClientConfig, OutputFormat};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ClientConfig::builder().server_url("http://localhost:5000").build()?;
/// let outcome = convert_file("invoice.pdf", OutputFormat::Excel, &config).await?;
/// for d in &outcome.downloads {
///     println!("{} → {}", d.name, config.resolve_url(&d.url));
/// }
/// # Ok(())
/// # }
/// ```
pub async fn convert_file(
    path: impl AsRef<Path>,
    format: OutputFormat,
    config: &ClientConfig,
) -> Result<ConversionOutcome, Doc2OfficeError> {
    let start = Instant::now();
    let (session, file_name) = run_session(path.as_ref(), format, config).await?;
    Ok(outcome(&session, file_name, format, Vec::new(), start))
}

/// [`convert_file`], then download every output into `dir`.
pub async fn convert_to_dir(
    path: impl AsRef<Path>,
    format: OutputFormat,
    dir: impl AsRef<Path>,
    config: &ClientConfig,
) -> Result<ConversionOutcome, Doc2OfficeError> {
    let start = Instant::now();
    let (session, file_name) = run_session(path.as_ref(), format, config).await?;
    let saved = save_all(session.backend().as_ref(), session.downloads(), dir.as_ref()).await?;
    Ok(outcome(&session, file_name, format, saved, start))
}

/// Upload `path` and return the server's preview without converting.
pub async fn preview_file(
    path: impl AsRef<Path>,
    config: &ClientConfig,
) -> Result<UploadPreview, Doc2OfficeError> {
    let file = input::load_file(path).await?;
    let file_name = file.name.clone();

    let mut session = SessionController::new(config)?;
    session.select_file(file).await?;

    Ok(UploadPreview {
        file_name,
        server_filename: session.server_filename().unwrap_or_default().to_string(),
        preview: session.view().preview.clone(),
    })
}

/// Ask the server to delete an uploaded file.
pub async fn cleanup(server_filename: &str, config: &ClientConfig) -> Result<(), Doc2OfficeError> {
    let backend = resolve_backend(config)?;
    let response = backend
        .cleanup(&CleanupRequest {
            filename: server_filename.to_string(),
        })
        .await?;
    if !response.is_success() {
        return Err(Doc2OfficeError::server(Operation::Cleanup, response.message));
    }
    info!("Cleaned up {}", server_filename);
    Ok(())
}

/// Synchronous wrapper around [`convert_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_file_sync(
    path: impl AsRef<Path>,
    format: OutputFormat,
    config: &ClientConfig,
) -> Result<ConversionOutcome, Doc2OfficeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Doc2OfficeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_file(path, format, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_session(
    path: &Path,
    format: OutputFormat,
    config: &ClientConfig,
) -> Result<(SessionController, String), Doc2OfficeError> {
    info!("Starting conversion: {} → {}", path.display(), format);
    let file = input::load_file(path).await?;
    let file_name = file.name.clone();

    let mut session = SessionController::new(config)?;
    session.select_file(file).await?;
    session.choose_format(format);
    session.convert().await?;
    Ok((session, file_name))
}

fn outcome(
    session: &SessionController,
    file_name: String,
    format: OutputFormat,
    saved: Vec<SavedFile>,
    start: Instant,
) -> ConversionOutcome {
    ConversionOutcome {
        file_name,
        server_filename: session.server_filename().unwrap_or_default().to_string(),
        format,
        preview: session.view().preview.clone(),
        downloads: session.view().results.clone().unwrap_or_default(),
        saved,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

fn resolve_backend(config: &ClientConfig) -> Result<Arc<dyn ConversionBackend>, Doc2OfficeError> {
    match config.backend {
        Some(ref backend) => Ok(Arc::clone(backend)),
        None => Ok(Arc::new(HttpBackend::new(config)?)),
    }
}
