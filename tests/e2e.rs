//! End-to-end tests against a live conversion server.
//!
//! These upload real files from `./test_cases/` and download the generated
//! documents. They are gated behind the `E2E_ENABLED` environment variable so
//! they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 DOC2OFFICE_SERVER=http://127.0.0.1:5000 cargo test --test e2e -- --nocapture
//!
//! To restrict to a specific test:
//!   E2E_ENABLED=1 cargo test --test e2e test_preview -- --nocapture

use edgequake_doc2office::{
    cleanup, convert_file, convert_to_dir, preview_file, ClientConfig, Doc2OfficeError,
    DownloadKind, LocalFile, OutputFormat, Phase, SessionController,
};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn output_dir(name: &str) -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_cases/output")
        .join(name);
    std::fs::create_dir_all(&d).ok();
    d
}

fn live_config() -> ClientConfig {
    let server =
        std::env::var("DOC2OFFICE_SERVER").unwrap_or_else(|_| "http://127.0.0.1:5000".into());
    ClientConfig::builder()
        .server_url(server)
        .request_timeout_secs(300)
        .result_delay_ms(0)
        .build()
        .expect("valid e2e config")
}

/// Skip this test if E2E_ENABLED is not set *or* no file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

fn assert_office_file(path: &std::path::Path) {
    let bytes = std::fs::read(path).expect("saved file readable");
    // DOCX and XLSX are both ZIP containers.
    assert!(
        bytes.starts_with(b"PK"),
        "{} is not an Office Open XML file",
        path.display()
    );
}

// ── Preview ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_preview_digital_pdf() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("digital.pdf"));
    let config = live_config();

    let preview = preview_file(&path, &config).await.expect("upload");
    println!("{:#?}", preview);

    assert!(!preview.server_filename.is_empty());
    let descriptor = preview.preview.expect("server sends a preview for PDFs");
    assert_eq!(descriptor.kind, "pdf");
    assert!(descriptor.pages.unwrap_or(0) > 0);

    cleanup(&preview.server_filename, &config).await.expect("cleanup");
}

#[tokio::test]
async fn test_preview_image() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("scan.png"));
    let preview = preview_file(&path, &live_config()).await.expect("upload");
    assert!(!preview.server_filename.is_empty());
}

// ── Conversion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_convert_to_word() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("digital.pdf"));
    let dir = output_dir("word");

    let outcome = convert_to_dir(&path, OutputFormat::Word, &dir, &live_config())
        .await
        .expect("conversion");
    println!("{} file(s) in {}ms", outcome.saved.len(), outcome.duration_ms);

    assert!(outcome
        .downloads
        .iter()
        .any(|d| d.kind == DownloadKind::Document));
    for saved in &outcome.saved {
        assert!(saved.bytes > 0);
        assert_office_file(&saved.path);
    }
}

#[tokio::test]
async fn test_convert_to_both() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("tables.pdf"));
    let dir = output_dir("both");

    let outcome = convert_to_dir(&path, OutputFormat::Both, &dir, &live_config())
        .await
        .expect("conversion");

    let kinds: Vec<DownloadKind> = outcome.downloads.iter().map(|d| d.kind).collect();
    assert!(kinds.contains(&DownloadKind::Document), "kinds: {kinds:?}");
    assert!(kinds.contains(&DownloadKind::Spreadsheet), "kinds: {kinds:?}");
}

#[tokio::test]
async fn test_convert_scanned_image_to_excel() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("scan.png"));
    let outcome = convert_file(&path, OutputFormat::Excel, &live_config())
        .await
        .expect("conversion");
    assert!(!outcome.downloads.is_empty());
}

// ── Session ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_session_reconvert_after_new_file() {
    let path = e2e_skip_unless_ready!(test_cases_dir().join("digital.pdf"));
    let mut session = SessionController::new(&live_config()).expect("session");

    let file = edgequake_doc2office::load_file(&path).await.expect("read");
    session.select_file(file.clone()).await.expect("upload");
    session.choose_format(OutputFormat::Word);
    assert_eq!(session.convert().await.expect("convert"), Phase::Converted);

    session.select_file(file).await.expect("second upload");
    session.choose_format(OutputFormat::Excel);
    assert_eq!(session.convert().await.expect("convert"), Phase::Converted);
}

#[tokio::test]
async fn test_server_rejects_unknown_filename() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let config = live_config();
    let mut session = SessionController::new(&config).expect("session");

    // A file that passes local checks but is not a real PDF.
    let bogus = LocalFile::from_bytes("bogus.pdf", "application/pdf", b"not a pdf".to_vec());
    match session.select_file(bogus).await {
        Ok(_) => {
            session.choose_format(OutputFormat::Word);
            let err = session.convert().await.expect_err("server should fail");
            assert!(matches!(
                err,
                Doc2OfficeError::Server { .. } | Doc2OfficeError::Transport { .. }
            ));
        }
        Err(err) => assert!(!err.is_validation(), "{err}"),
    }
    assert_eq!(session.phase(), Phase::Errored);
}
