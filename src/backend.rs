//! The conversion server seam.
//!
//! [`ConversionBackend`] is everything the session controller knows about the
//! server: four requests, each returning either the decoded response envelope
//! or a transport error. Whether the envelope reports success is the
//! controller's business, not the backend's, so a backend never produces
//! [`Doc2OfficeError::Server`].
//!
//! [`HttpBackend`] is the production implementation on top of `reqwest`.
//! Tests inject their own implementation through
//! [`crate::config::ClientConfigBuilder::backend`].

use crate::config::ClientConfig;
use crate::error::{Doc2OfficeError, Operation};
use crate::pipeline::input::LocalFile;
use crate::protocol::{CleanupRequest, CleanupResponse, ConvertRequest, ConvertResponse, UploadResponse};
use async_trait::async_trait;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Requests the session controller issues against the conversion server.
///
/// Implementations must be `Send + Sync` so a single backend can be shared
/// between a controller and the one-shot helpers through an `Arc`.
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    /// `POST /upload` with the file in multipart field `file`.
    async fn upload(&self, file: &LocalFile) -> Result<UploadResponse, Doc2OfficeError>;

    /// `POST /convert` with a JSON body.
    async fn convert(&self, request: &ConvertRequest) -> Result<ConvertResponse, Doc2OfficeError>;

    /// `GET` a download URL, streaming the body into `sink`.
    ///
    /// Returns the number of bytes written.
    async fn download(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, Doc2OfficeError>;

    /// `POST /cleanup`: ask the server to delete an uploaded file.
    async fn cleanup(&self, request: &CleanupRequest) -> Result<CleanupResponse, Doc2OfficeError>;
}

/// [`ConversionBackend`] talking HTTP to a live server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpBackend {
    /// Build a backend for `config.server_url`.
    pub fn new(config: &ClientConfig) -> Result<Self, Doc2OfficeError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| Doc2OfficeError::Internal(format!("HTTP client: {e}")))?;

        // Keep only the plain settings; the backend/renderer slots would
        // otherwise form a reference cycle when this backend is stored there.
        let config = ClientConfig {
            backend: None,
            renderer: None,
            ..config.clone()
        };
        Ok(Self { client, config })
    }

    pub fn server_url(&self) -> &str {
        &self.config.server_url
    }
}

#[async_trait]
impl ConversionBackend for HttpBackend {
    async fn upload(&self, file: &LocalFile) -> Result<UploadResponse, Doc2OfficeError> {
        let url = self.config.resolve_url("/upload");
        debug!("POST {} ({} bytes, {})", url, file.size, file.mime);

        let part = reqwest::multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime)
            .map_err(|e| Doc2OfficeError::transport(Operation::Upload, e))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Doc2OfficeError::transport(Operation::Upload, e))?;

        read_json(response, Operation::Upload).await
    }

    async fn convert(&self, request: &ConvertRequest) -> Result<ConvertResponse, Doc2OfficeError> {
        let url = self.config.resolve_url("/convert");
        debug!("POST {} filename={} format={}", url, request.filename, request.format);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Doc2OfficeError::transport(Operation::Convert, e))?;

        read_json(response, Operation::Convert).await
    }

    async fn download(
        &self,
        url: &str,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64, Doc2OfficeError> {
        let url = self.config.resolve_url(url);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Doc2OfficeError::transport(Operation::Download, e))?;

        if !response.status().is_success() {
            return Err(Doc2OfficeError::transport(
                Operation::Download,
                format!("HTTP {} for {}", response.status(), url),
            ));
        }

        let mut written = 0u64;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| Doc2OfficeError::transport(Operation::Download, e))?;
            sink.write_all(&chunk)
                .await
                .map_err(|e| Doc2OfficeError::transport(Operation::Download, e))?;
            written += chunk.len() as u64;
        }
        sink.flush()
            .await
            .map_err(|e| Doc2OfficeError::transport(Operation::Download, e))?;

        Ok(written)
    }

    async fn cleanup(&self, request: &CleanupRequest) -> Result<CleanupResponse, Doc2OfficeError> {
        let url = self.config.resolve_url("/cleanup");
        debug!("POST {} filename={}", url, request.filename);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Doc2OfficeError::transport(Operation::Cleanup, e))?;

        read_json(response, Operation::Cleanup).await
    }
}

/// Decode a JSON envelope regardless of HTTP status.
///
/// The server reports failures as `{status: "error", message}` with 4xx/5xx
/// codes, so the body is what matters. A body that is not JSON (proxy error
/// page, truncated response) is a transport error.
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: Operation,
) -> Result<T, Doc2OfficeError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Doc2OfficeError::transport(operation, e))?;
    debug!("{} response: HTTP {} ({} bytes)", operation, status, body.len());

    serde_json::from_str(&body).map_err(|e| {
        Doc2OfficeError::transport(
            operation,
            format!("HTTP {status}: response is not valid JSON ({e})"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::session::{Phase, SessionController};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answer a single HTTP request with a canned reply and hand back the
    /// raw request text.
    async fn serve_once(
        status: &'static str,
        content_type: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&raw) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }

            let reply = format!(
                "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&raw).into_owned()
        });

        (url, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let Some(end) = raw.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&raw[..end]);
        let length = head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            if key.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        });
        match length {
            Some(len) => raw.len() >= end + 4 + len,
            None => raw.ends_with(b"0\r\n\r\n"),
        }
    }

    fn backend_for(url: &str) -> HttpBackend {
        let config = ClientConfig::builder()
            .server_url(url)
            .request_timeout_secs(5)
            .build()
            .unwrap();
        HttpBackend::new(&config).unwrap()
    }

    fn pdf() -> LocalFile {
        LocalFile::from_bytes("report.pdf", "application/pdf", b"%PDF-1.4\n%%EOF\n".to_vec())
    }

    #[tokio::test]
    async fn json_error_body_on_4xx_is_an_application_error() {
        let (url, server) = serve_once(
            "400 Bad Request",
            "application/json",
            r#"{"status":"error","message":"corrupt file"}"#,
        )
        .await;
        let config = ClientConfig::builder()
            .server_url(url)
            .request_timeout_secs(5)
            .result_delay_ms(0)
            .build()
            .unwrap();
        let mut session = SessionController::new(&config).unwrap();

        let err = session.select_file(pdf()).await.unwrap_err();
        assert!(err.is_application(), "got: {err:?}");
        assert_eq!(err.user_message(), "corrupt file");
        assert_eq!(session.phase(), Phase::Errored);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /upload "), "{request}");
        assert!(request.contains(r#"name="file""#), "{request}");
        assert!(request.contains(r#"filename="report.pdf""#), "{request}");
        assert!(request.contains("application/pdf"), "{request}");
    }

    #[tokio::test]
    async fn non_json_body_is_a_transport_error() {
        let (url, server) = serve_once(
            "502 Bad Gateway",
            "text/html",
            "<html><body>Bad Gateway</body></html>",
        )
        .await;

        let err = backend_for(&url).upload(&pdf()).await.unwrap_err();
        assert!(err.is_transport(), "got: {err:?}");
        assert!(
            err.user_message().starts_with("Upload failed: HTTP 502"),
            "{err}"
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn convert_posts_json_body() {
        let (url, server) = serve_once(
            "200 OK",
            "application/json",
            r#"{"status":"success","downloads":[{"name":"abc.docx","url":"/download/abc.docx"}]}"#,
        )
        .await;

        let response = backend_for(&url)
            .convert(&ConvertRequest {
                filename: "abc.pdf".into(),
                format: OutputFormat::Word,
            })
            .await
            .unwrap();
        assert!(response.is_success());
        assert_eq!(response.downloads.unwrap()[0].name, "abc.docx");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /convert "), "{request}");
        assert!(
            request.contains(r#"{"filename":"abc.pdf","format":"word"}"#),
            "{request}"
        );
    }

    #[test]
    fn http_backend_drops_nested_slots() {
        let inner = HttpBackend::new(&ClientConfig::default()).unwrap();
        let config = ClientConfig::builder()
            .server_url("http://10.0.0.2:8080")
            .backend(std::sync::Arc::new(inner))
            .build()
            .unwrap();

        let backend = HttpBackend::new(&config).unwrap();
        assert!(backend.config.backend.is_none());
        assert_eq!(backend.server_url(), "http://10.0.0.2:8080");
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        // Port 9 (discard) on localhost is closed on any sane test machine.
        let config = ClientConfig::builder()
            .server_url("http://127.0.0.1:9")
            .request_timeout_secs(2)
            .build()
            .unwrap();
        let backend = HttpBackend::new(&config).unwrap();

        let err = backend
            .convert(&ConvertRequest {
                filename: "abc.pdf".into(),
                format: OutputFormat::Word,
            })
            .await
            .unwrap_err();
        assert!(err.is_transport(), "got: {err:?}");
        assert!(err.to_string().starts_with("Conversion failed: "));
    }
}
