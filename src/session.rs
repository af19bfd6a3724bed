//! The upload/convert session controller.
//!
//! ## States
//!
//! ```text
//!  Empty ──select──▶ FileStaged ──▶ Uploading ──ok──▶ Previewed ──format──▶ FormatChosen
//!    ▲                                  │                                        │
//!    │                                  └──fail──▶ Errored ◀──fail── Converting ◀┘ convert
//!    │                                               │                    │
//!    └──────────────── reset / remove ───────────────┴──── Converted ◀────┘ ok
//! ```
//!
//! The session owns two pieces of state, the staged file and the selected
//! format, and a [`ViewState`] derived from them. Every operation takes
//! `&mut self`, so there is exactly one writer and never more than one
//! request in flight.
//!
//! ## Failure handling
//!
//! Nothing here is fatal. Each operation returns `Result<Phase, _>`, and on
//! failure the same error has already been written to the view's error
//! region and rendered before the `Err` is returned. Validation failures do
//! not change the phase. Network and server failures move the session to
//! [`Phase::Errored`], remembering the phase to resume from; staged data is
//! kept so the user can retry, remove or reset.

use crate::backend::{ConversionBackend, HttpBackend};
use crate::config::{is_accepted_mime, ClientConfig, OutputFormat};
use crate::error::{Doc2OfficeError, Operation};
use crate::pipeline::input::LocalFile;
use crate::protocol::{ConvertRequest, Download};
use crate::render::{NoopRenderer, Renderer};
use crate::view::{ScrollTarget, ViewState};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

const UPLOAD_PENDING: (u8, &str) = (20, "Uploading file...");
const UPLOAD_DONE: (u8, &str) = (40, "File uploaded successfully");
const CONVERT_PENDING: (u8, &str) = (50, "Converting document...");
const CONVERT_DONE: (u8, &str) = (100, "Conversion complete!");

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    Empty,
    FileStaged,
    Uploading,
    Previewed,
    FormatChosen,
    Converting,
    Converted,
    Errored,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A selected file, plus the server's identifier once the upload succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub file: LocalFile,
    pub server_filename: Option<String>,
}

/// Single-writer state machine driving one upload/convert attempt at a time.
pub struct SessionController {
    backend: Arc<dyn ConversionBackend>,
    renderer: Renderer,
    max_upload_bytes: u64,
    result_delay: Duration,

    staged: Option<StagedFile>,
    format: Option<OutputFormat>,
    downloads: Vec<Download>,
    phase: Phase,
    /// Phase to resume from while `phase == Errored`.
    resume: Phase,
    view: ViewState,
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("phase", &self.phase)
            .field("resume", &self.resume)
            .field("staged", &self.staged)
            .field("format", &self.format)
            .field("downloads", &self.downloads.len())
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Create an empty session.
    ///
    /// Uses `config.backend` when set, otherwise an [`HttpBackend`] for
    /// `config.server_url`. The initial empty view is not rendered; the
    /// first transition is.
    pub fn new(config: &ClientConfig) -> Result<Self, Doc2OfficeError> {
        let backend: Arc<dyn ConversionBackend> = match config.backend {
            Some(ref backend) => Arc::clone(backend),
            None => Arc::new(HttpBackend::new(config)?),
        };
        let renderer: Renderer = match config.renderer {
            Some(ref renderer) => Arc::clone(renderer),
            None => Arc::new(NoopRenderer),
        };

        Ok(Self {
            backend,
            renderer,
            max_upload_bytes: config.max_upload_bytes,
            result_delay: Duration::from_millis(config.result_delay_ms),
            staged: None,
            format: None,
            downloads: Vec::new(),
            phase: Phase::Empty,
            resume: Phase::Empty,
            view: ViewState::default(),
        })
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The phase an errored session returns to; `None` unless errored.
    pub fn resume_phase(&self) -> Option<Phase> {
        (self.phase == Phase::Errored).then_some(self.resume)
    }

    /// The current phase, looking through `Errored` to the phase it resumes.
    pub fn effective_phase(&self) -> Phase {
        self.resume_phase().unwrap_or(self.phase)
    }

    pub fn staged_file(&self) -> Option<&StagedFile> {
        self.staged.as_ref()
    }

    pub fn server_filename(&self) -> Option<&str> {
        self.staged.as_ref()?.server_filename.as_deref()
    }

    pub fn selected_format(&self) -> Option<OutputFormat> {
        self.format
    }

    /// Downloads from the last successful conversion.
    pub fn downloads(&self) -> &[Download] {
        &self.downloads
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn backend(&self) -> &Arc<dyn ConversionBackend> {
        &self.backend
    }

    /// True when both a server identifier and a format are present.
    pub fn can_convert(&self) -> bool {
        self.server_filename().is_some() && self.format.is_some()
    }

    // ── Operations ───────────────────────────────────────────────────────

    /// Validate and stage `file`, then upload it.
    pub async fn select_file(&mut self, file: LocalFile) -> Result<Phase, Doc2OfficeError> {
        self.stage_file(file)?;
        self.upload().await
    }

    /// Validate and stage `file` without uploading it.
    ///
    /// Rejects anything that is not a PDF, PNG or JPEG, and anything larger
    /// than the configured limit. A rejected file leaves the session as it
    /// was; only the error region changes.
    pub fn stage_file(&mut self, file: LocalFile) -> Result<Phase, Doc2OfficeError> {
        if !is_accepted_mime(&file.mime) {
            return Err(self.reject(Doc2OfficeError::InvalidFileType { mime: file.mime }));
        }
        if file.size > self.max_upload_bytes {
            return Err(self.reject(Doc2OfficeError::FileTooLarge {
                size: file.size,
                limit: self.max_upload_bytes,
            }));
        }

        info!("Staged {} ({} bytes, {})", file.name, file.size, file.mime);
        self.view.file_info = Some(file.name.clone());
        self.view.file_input = Some(file.name.clone());
        self.view.format_picker_visible = true;
        self.view.convert_visible = true;
        self.view.convert_enabled = self.format.is_some();
        self.view.preview = None;
        self.staged = Some(StagedFile {
            file,
            server_filename: None,
        });

        self.transition(Phase::FileStaged);
        self.commit();
        Ok(self.phase)
    }

    /// Upload the staged file and bind the server's identifier to it.
    pub async fn upload(&mut self) -> Result<Phase, Doc2OfficeError> {
        let Some(file) = self.staged.as_ref().map(|s| s.file.clone()) else {
            return Err(self.reject(Doc2OfficeError::MissingPrerequisites));
        };
        let before = self.effective_phase();

        self.view.show_progress(UPLOAD_PENDING.0, UPLOAD_PENDING.1);
        self.transition(Phase::Uploading);
        self.commit();

        let result = self.backend.upload(&file).await;
        let response = match result {
            Ok(r) => r,
            Err(e) => return Err(self.fail(as_transport(Operation::Upload, e), before)),
        };
        if !response.is_success() {
            return Err(self.fail(Doc2OfficeError::server(Operation::Upload, response.message), before));
        }
        let Some(server_filename) = response.filename.filter(|f| !f.trim().is_empty()) else {
            return Err(self.fail(
                Doc2OfficeError::server(
                    Operation::Upload,
                    Some("Upload response did not include a file identifier".into()),
                ),
                before,
            ));
        };

        info!("Uploaded {} as {}", file.name, server_filename);
        if let Some(staged) = self.staged.as_mut() {
            staged.server_filename = Some(server_filename);
        }

        self.view.show_progress(UPLOAD_DONE.0, UPLOAD_DONE.1);
        self.view.convert_enabled = self.format.is_some();
        self.commit();

        if let Some(preview) = response.preview {
            debug!("Preview: {:?}", preview);
            self.view.preview = Some(preview);
        }
        self.view.hide_progress();

        let next = if self.format.is_some() {
            Phase::FormatChosen
        } else {
            Phase::Previewed
        };
        self.transition(next);
        self.commit();
        Ok(self.phase)
    }

    /// Select `format`, replacing any previous choice.
    pub fn choose_format(&mut self, format: OutputFormat) -> Phase {
        debug!("Format selected: {}", format);
        self.format = Some(format);
        self.view.selected_format = Some(format);
        self.view.convert_enabled = self.phase != Phase::Converted;

        match self.phase {
            Phase::Previewed => self.transition(Phase::FormatChosen),
            Phase::Errored if self.resume == Phase::Previewed => self.resume = Phase::FormatChosen,
            _ => {}
        }
        self.commit();
        self.phase
    }

    /// [`Self::choose_format`] from a tag such as `"word"` or `"xlsx"`.
    pub fn choose_format_tag(&mut self, tag: &str) -> Result<Phase, Doc2OfficeError> {
        match tag.parse::<OutputFormat>() {
            Ok(format) => Ok(self.choose_format(format)),
            Err(e) => Err(self.reject(e)),
        }
    }

    /// Ask the server to convert the uploaded file to the selected format.
    ///
    /// Refused locally (no request) unless a server identifier and a format
    /// are both present, and after a completed conversion until the session
    /// is reset or a new file is selected.
    pub async fn convert(&mut self) -> Result<Phase, Doc2OfficeError> {
        if self.phase == Phase::Converted {
            return Err(self.reject(Doc2OfficeError::AlreadyConverted));
        }
        let filename = self.server_filename().map(str::to_owned);
        let (Some(filename), Some(format)) = (filename, self.format) else {
            return Err(self.reject(Doc2OfficeError::MissingPrerequisites));
        };
        let request = ConvertRequest { filename, format };
        let before = self.effective_phase();

        self.view.hide_error();
        self.view.show_progress(CONVERT_PENDING.0, CONVERT_PENDING.1);
        self.transition(Phase::Converting);
        self.commit();

        info!("Converting {} to {}", request.filename, request.format);
        let result = self.backend.convert(&request).await;
        let response = match result {
            Ok(r) => r,
            Err(e) => return Err(self.fail(as_transport(Operation::Convert, e), before)),
        };
        if !response.is_success() {
            return Err(self.fail(Doc2OfficeError::server(Operation::Convert, response.message), before));
        }

        self.view.show_progress(CONVERT_DONE.0, CONVERT_DONE.1);
        self.commit();
        if !self.result_delay.is_zero() {
            sleep(self.result_delay).await;
        }

        self.downloads = response.downloads.unwrap_or_default();
        info!("Conversion produced {} file(s)", self.downloads.len());
        self.view.hide_progress();
        self.view.show_results(&self.downloads);
        self.view.convert_enabled = false;

        self.transition(Phase::Converted);
        self.commit();
        Ok(self.phase)
    }

    /// Drop the staged file and format and hide their regions.
    ///
    /// Results and error regions stay as they are.
    pub fn remove_file(&mut self) -> Phase {
        self.clear_selection();
        self.transition(Phase::Empty);
        self.commit();
        self.phase
    }

    /// Return to a pristine session: remove the file, hide results, error and
    /// progress, scroll to the top.
    pub fn reset(&mut self) -> Phase {
        self.clear_selection();
        self.downloads.clear();
        self.view.results = None;
        self.view.hide_error();
        self.view.hide_progress();
        self.view.scroll = ScrollTarget::Top;
        self.transition(Phase::Empty);
        self.commit();
        self.phase
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn clear_selection(&mut self) {
        self.staged = None;
        self.format = None;
        self.view.file_info = None;
        self.view.file_input = None;
        self.view.format_picker_visible = false;
        self.view.selected_format = None;
        self.view.convert_visible = false;
        self.view.convert_enabled = false;
        self.view.preview = None;
    }

    fn transition(&mut self, to: Phase) {
        if self.phase != to {
            debug!("Session {} → {}", self.phase, to);
            self.renderer.on_phase_change(self.phase, to);
            self.phase = to;
        }
    }

    fn commit(&self) {
        self.renderer.render(&self.view, self.phase);
    }

    /// Show a validation error without touching session state.
    fn reject(&mut self, err: Doc2OfficeError) -> Doc2OfficeError {
        warn!("Rejected: {}", err);
        self.view.show_error(err.user_message());
        self.commit();
        err
    }

    /// Show a request failure and move to `Errored`, resuming at `before`.
    fn fail(&mut self, err: Doc2OfficeError, before: Phase) -> Doc2OfficeError {
        warn!("{}", err);
        self.view.show_error(err.user_message());
        self.resume = before;
        self.transition(Phase::Errored);
        self.commit();
        err
    }
}

/// Backends are expected to return transport errors already; wrap anything
/// else so the message still reads "<Operation> failed: …".
fn as_transport(operation: Operation, err: Doc2OfficeError) -> Doc2OfficeError {
    if err.is_transport() {
        err
    } else {
        Doc2OfficeError::transport(operation, err)
    }
}
