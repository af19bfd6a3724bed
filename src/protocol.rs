//! Wire payloads exchanged with the conversion server.
//!
//! Both endpoints answer with a JSON envelope carrying a `status` string.
//! Only the exact value `"success"` counts as success; anything else is an
//! application-level failure whose `message` is shown to the user verbatim.
//! Optional fields are genuinely optional on the wire, so every one of them is
//! an `Option` with `#[serde(default)]` and unknown fields are ignored.

use crate::config::OutputFormat;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// The `status` value that marks a successful response.
pub const STATUS_SUCCESS: &str = "success";

/// Response body of `POST /upload`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub status: String,
    /// Server-assigned identifier of the stored upload.
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Display-only; a malformed descriptor is dropped rather than failing
    /// the whole upload.
    #[serde(default, deserialize_with = "lenient_preview")]
    pub preview: Option<PreviewDescriptor>,
}

fn lenient_preview<'de, D>(deserializer: D) -> Result<Option<PreviewDescriptor>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match serde_json::from_value(v) {
        Ok(preview) => Some(preview),
        Err(e) => {
            warn!("Ignoring malformed preview descriptor: {}", e);
            None
        }
    }))
}

impl UploadResponse {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Request body of `POST /convert`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub filename: String,
    pub format: OutputFormat,
}

/// Response body of `POST /convert`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvertResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub downloads: Option<Vec<Download>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ConvertResponse {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Request body of `POST /cleanup`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupRequest {
    pub filename: String,
}

/// Response body of `POST /cleanup`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleanupResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl CleanupResponse {
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// Display metadata about an uploaded document.
///
/// Read-only to the client; never sent back to the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewDescriptor {
    /// Document type tag, e.g. `"pdf"` or `"image"`.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub pages: Option<u32>,
    /// `true` for image-based (scanned) documents, `false` for text-based.
    #[serde(default)]
    pub is_scanned: Option<bool>,
    #[serde(default)]
    pub has_tables: Option<bool>,
    /// Short text excerpt.
    #[serde(default)]
    pub preview: Option<String>,
}

/// One converted output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Download {
    pub name: String,
    pub url: String,
    /// Explicit kind tag. Older servers omit it; see [`Download::resolved_kind`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<DownloadKind>,
}

impl Download {
    /// The kind to display: the server's tag when present, otherwise inferred
    /// from the file name suffix. Unknown suffixes are [`DownloadKind::Other`].
    pub fn resolved_kind(&self) -> DownloadKind {
        self.kind
            .unwrap_or_else(|| DownloadKind::from_file_name(&self.name))
    }
}

/// Coarse category of a converted file, used for icon and colour choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadKind {
    Document,
    Spreadsheet,
    #[serde(other)]
    Other,
}

impl DownloadKind {
    pub fn from_file_name(name: &str) -> Self {
        let lower = name.trim().to_ascii_lowercase();
        if lower.ends_with(".docx") {
            DownloadKind::Document
        } else if lower.ends_with(".xlsx") {
            DownloadKind::Spreadsheet
        } else {
            DownloadKind::Other
        }
    }
}
