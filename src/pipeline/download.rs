//! Fetch converted files to disk.
//!
//! Each download is streamed into a [`tempfile::NamedTempFile`] created in
//! the destination directory and renamed into place only after the body has
//! been fully written, so an interrupted transfer never leaves a truncated
//! `.docx`/`.xlsx` behind under its final name.

use crate::backend::ConversionBackend;
use crate::error::Doc2OfficeError;
use crate::protocol::Download;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

/// A download written to disk.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SavedFile {
    pub name: String,
    pub path: PathBuf,
    pub bytes: u64,
}

/// Stream `download` into `dir`, creating the directory if needed.
pub async fn save_download(
    backend: &dyn ConversionBackend,
    download: &Download,
    dir: &Path,
) -> Result<SavedFile, Doc2OfficeError> {
    let name = safe_file_name(&download.name);
    let dest = dir.join(&name);

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| Doc2OfficeError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let tmp = tempfile::Builder::new()
        .prefix(".doc2office-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|e| Doc2OfficeError::OutputWriteFailed {
            path: dest.clone(),
            source: e,
        })?;
    let std_file = tmp
        .as_file()
        .try_clone()
        .map_err(|e| Doc2OfficeError::OutputWriteFailed {
            path: dest.clone(),
            source: e,
        })?;
    let mut file = tokio::fs::File::from_std(std_file);

    let bytes = backend.download(&download.url, &mut file).await?;
    file.flush()
        .await
        .map_err(|e| Doc2OfficeError::OutputWriteFailed {
            path: dest.clone(),
            source: e,
        })?;
    drop(file);

    tmp.persist(&dest)
        .map_err(|e| Doc2OfficeError::OutputWriteFailed {
            path: dest.clone(),
            source: e.error,
        })?;

    info!("Saved {} ({} bytes)", dest.display(), bytes);
    Ok(SavedFile {
        name,
        path: dest,
        bytes,
    })
}

/// Save every download into `dir`, stopping at the first failure.
pub async fn save_all(
    backend: &dyn ConversionBackend,
    downloads: &[Download],
    dir: &Path,
) -> Result<Vec<SavedFile>, Doc2OfficeError> {
    let mut saved = Vec::with_capacity(downloads.len());
    for download in downloads {
        saved.push(save_download(backend, download, dir).await?);
    }
    Ok(saved)
}

/// Keep only the final path component of a server-supplied name.
fn safe_file_name(name: &str) -> String {
    let last = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if last.is_empty() || last == "." || last == ".." {
        "download.bin".to_string()
    } else {
        last.to_string()
    }
}
