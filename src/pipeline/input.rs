//! Input resolution: turn a user-supplied path into a [`LocalFile`].
//!
//! A browser hands the page a `File` object that already carries a name,
//! a MIME type and a size. From the command line we only get a path, so the
//! MIME type is sniffed from the content: `%PDF` magic bytes for PDFs,
//! [`image::guess_format`] for PNG/JPEG, and the file extension as a last
//! resort. Whatever is detected here is what the session controller validates
//! against the accepted types, exactly as it would validate a browser `File`.

use crate::error::Doc2OfficeError;
use image::ImageFormat;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A file selected on the client, before or after upload.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Display name (the path's file name component).
    pub name: String,
    /// Detected MIME type, e.g. `application/pdf`.
    pub mime: String,
    /// Size in bytes.
    pub size: u64,
    /// Raw content, sent as the multipart `file` field.
    pub bytes: Vec<u8>,
}

impl LocalFile {
    /// Build a file from in-memory content with an explicit MIME type.
    pub fn from_bytes(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }
}

impl std::fmt::Debug for LocalFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Read a local file and detect its MIME type.
///
/// Only existence and readability are checked here; type and size checks
/// belong to the session controller.
pub async fn load_file(path: impl AsRef<Path>) -> Result<LocalFile, Doc2OfficeError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Doc2OfficeError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => Doc2OfficeError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Doc2OfficeError::Internal(format!("reading {}: {e}", path.display())),
    })?;

    let name = file_name(path);
    let mime = sniff_mime(&bytes, path).to_string();
    debug!("Loaded {} ({} bytes, {})", name, bytes.len(), mime);

    Ok(LocalFile::from_bytes(name, mime, bytes))
}

/// Detect a MIME type from content, falling back to the extension.
pub fn sniff_mime(bytes: &[u8], path: &Path) -> &'static str {
    if bytes.starts_with(b"%PDF") {
        return "application/pdf";
    }
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => return "image/png",
        Ok(ImageFormat::Jpeg) => return "image/jpeg",
        Ok(ImageFormat::Tiff) => return "image/tiff",
        Ok(ImageFormat::Bmp) => return "image/bmp",
        Ok(ImageFormat::Gif) => return "image/gif",
        Ok(ImageFormat::WebP) => return "image/webp",
        _ => {}
    }
    mime_from_extension(path)
}

fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(path).display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG_MAGIC: &[u8] = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0";

    #[test]
    fn sniff_by_content() {
        let p = Path::new("whatever.bin");
        assert_eq!(sniff_mime(b"%PDF-1.7\n", p), "application/pdf");
        assert_eq!(sniff_mime(PNG_MAGIC, p), "image/png");
        assert_eq!(sniff_mime(JPEG_MAGIC, p), "image/jpeg");
    }

    #[test]
    fn content_beats_extension() {
        // A PNG renamed to .pdf is still a PNG.
        assert_eq!(sniff_mime(PNG_MAGIC, Path::new("scan.pdf")), "image/png");
    }

    #[test]
    fn extension_fallback() {
        assert_eq!(sniff_mime(b"hello", Path::new("notes.txt")), "text/plain");
        assert_eq!(sniff_mime(b"", Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(sniff_mime(b"??", Path::new("blob")), "application/octet-stream");
    }

    #[tokio::test]
    async fn load_existing_file() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"%PDF-1.4\n%%EOF\n").unwrap();

        let file = load_file(tmp.path()).await.unwrap();
        assert_eq!(file.mime, "application/pdf");
        assert_eq!(file.size, 15);
        assert!(file.name.ends_with(".pdf"));
    }

    #[tokio::test]
    async fn load_missing_file() {
        let err = load_file("/definitely/not/here.pdf").await.unwrap_err();
        assert!(matches!(err, Doc2OfficeError::FileNotFound { .. }));
    }
}
