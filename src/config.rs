//! Configuration types for the upload/convert session client.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via its
//! [`ClientConfigBuilder`]. The limits that the session controller enforces
//! before any request is sent (accepted MIME types, maximum upload size) live
//! here as well so the CLI and the library agree on them.

use crate::backend::ConversionBackend;
use crate::error::Doc2OfficeError;
use crate::render::SessionRenderer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Default upload limit: 16 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

/// MIME types the server accepts. `image/jpg` is a non-standard alias some
/// platforms report for JPEG files.
pub const ACCEPTED_MIME_TYPES: &[&str] =
    &["application/pdf", "image/png", "image/jpeg", "image/jpg"];

/// Default server address (the conversion server's development bind).
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// True when `mime` is one of [`ACCEPTED_MIME_TYPES`].
pub fn is_accepted_mime(mime: &str) -> bool {
    ACCEPTED_MIME_TYPES
        .iter()
        .any(|m| m.eq_ignore_ascii_case(mime.trim()))
}

/// Configuration for a conversion session.
///
/// Built via [`ClientConfig::builder()`] or using [`ClientConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_doc2office::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .server_url("http://localhost:5000")
///     .result_delay_ms(0)
///     .build()
///     .unwrap();
/// assert_eq!(config.server_url, "http://localhost:5000");
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the conversion server. Default: `http://127.0.0.1:5000`.
    ///
    /// `/upload`, `/convert` and `/cleanup` are joined onto it, as are
    /// relative download URLs returned by the server.
    pub server_url: String,

    /// Largest file accepted for upload, in bytes. Default: 16 MiB.
    ///
    /// Checked locally before any request is sent.
    pub max_upload_bytes: u64,

    /// Pause between the 100 % progress frame and the results view, in
    /// milliseconds. Default: 500.
    ///
    /// Purely cosmetic. Set to 0 in tests and scripted runs.
    pub result_delay_ms: u64,

    /// Per-request timeout in seconds. Default: none.
    ///
    /// With no timeout a hung server leaves the progress region visible
    /// indefinitely, matching the browser client.
    pub request_timeout_secs: Option<u64>,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// Pre-constructed backend. Takes precedence over `server_url`.
    pub backend: Option<Arc<dyn ConversionBackend>>,

    /// Render function invoked after every session transition.
    pub renderer: Option<Arc<dyn SessionRenderer>>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            result_delay_ms: 500,
            request_timeout_secs: None,
            user_agent: concat!("edgequake-doc2office/", env!("CARGO_PKG_VERSION")).to_string(),
            backend: None,
            renderer: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("server_url", &self.server_url)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("result_delay_ms", &self.result_delay_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn ConversionBackend>"))
            .field("renderer", &self.renderer.as_ref().map(|_| "<dyn SessionRenderer>"))
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Upload limit expressed in whole MiB, as shown in the size error.
    pub fn max_upload_mib(&self) -> u64 {
        self.max_upload_bytes / (1024 * 1024)
    }

    /// Join a server-relative path (or pass through an absolute URL).
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.server_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

/// Builder for [`ClientConfig`].
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl fmt::Debug for ClientConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ClientConfigBuilder {
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into().trim().trim_end_matches('/').to_string();
        self
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn result_delay_ms(mut self, ms: u64) -> Self {
        self.config.result_delay_ms = ms;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ConversionBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn SessionRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, Doc2OfficeError> {
        let c = &self.config;
        if c.backend.is_none()
            && !(c.server_url.starts_with("http://") || c.server_url.starts_with("https://"))
        {
            return Err(Doc2OfficeError::InvalidConfig(format!(
                "server URL must start with http:// or https://, got '{}'",
                c.server_url
            )));
        }
        if c.max_upload_bytes == 0 {
            return Err(Doc2OfficeError::InvalidConfig(
                "Upload limit must be > 0 bytes".into(),
            ));
        }
        if c.request_timeout_secs == Some(0) {
            return Err(Doc2OfficeError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Output document the server should produce.
///
/// | Format | Wire tag | Server output |
/// |--------|----------|---------------|
/// | `Word` | `word`   | `.docx` with text, headings and tables |
/// | `Excel`| `excel`  | `.xlsx` with one sheet per detected table |
/// | `Both` | `both`   | both of the above |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Word,
    Excel,
    Both,
}

impl OutputFormat {
    /// Every format, in the order the picker shows them.
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Word, OutputFormat::Excel, OutputFormat::Both];

    /// Tag sent in the `format` field of the convert request.
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Word => "word",
            OutputFormat::Excel => "excel",
            OutputFormat::Both => "both",
        }
    }

    /// Human-readable label for the format picker.
    pub fn label(self) -> &'static str {
        match self {
            OutputFormat::Word => "Word (.docx)",
            OutputFormat::Excel => "Excel (.xlsx)",
            OutputFormat::Both => "Word + Excel",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Doc2OfficeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" | "docx" | "doc" => Ok(OutputFormat::Word),
            "excel" | "xlsx" | "xls" => Ok(OutputFormat::Excel),
            "both" | "all" => Ok(OutputFormat::Both),
            other => Err(Doc2OfficeError::UnknownFormat(other.to_string())),
        }
    }
}
