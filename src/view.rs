//! View-model handed to the render function after every transition.
//!
//! [`ViewState`] describes the five visible regions (file info, format
//! picker, progress, preview, results/error) as plain data. The session
//! controller is the only writer; renderers only read it. Nothing in here
//! knows how it will be drawn, so the same state can drive a terminal, a
//! JSON dump, or a test assertion.

use crate::config::OutputFormat;
use crate::protocol::{Download, DownloadKind, PreviewDescriptor};
use serde::Serialize;

/// Determinate progress indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// 0–100.
    pub percent: u8,
    pub label: String,
}

impl Progress {
    pub fn new(percent: u8, label: impl Into<String>) -> Self {
        Self {
            percent: percent.min(100),
            label: label.into(),
        }
    }
}

/// Where the view was last asked to scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollTarget {
    #[default]
    None,
    Top,
    Results,
    Error,
}

/// One row of the results list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadEntry {
    pub name: String,
    pub url: String,
    pub kind: DownloadKind,
}

impl DownloadEntry {
    /// Icon name (Bootstrap Icons naming, as used by the web front-end).
    pub fn icon(&self) -> &'static str {
        match self.kind {
            DownloadKind::Document => "file-word",
            DownloadKind::Spreadsheet => "file-excel",
            DownloadKind::Other => "file-earmark",
        }
    }

    /// Button colour role.
    pub fn color(&self) -> &'static str {
        match self.kind {
            DownloadKind::Document => "primary",
            DownloadKind::Spreadsheet => "success",
            DownloadKind::Other => "secondary",
        }
    }
}

impl From<&Download> for DownloadEntry {
    fn from(d: &Download) -> Self {
        Self {
            name: d.name.clone(),
            url: d.url.clone(),
            kind: d.resolved_kind(),
        }
    }
}

/// A labelled line of the preview region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PreviewLine {
    /// `Label: value` pair.
    Field { label: &'static str, value: String },
    /// Highlighted notice (tables detected).
    Notice(String),
    /// Text excerpt.
    Excerpt(String),
}

impl std::fmt::Display for PreviewLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreviewLine::Field { label, value } => write!(f, "{label}: {value}"),
            PreviewLine::Notice(text) => f.write_str(text),
            PreviewLine::Excerpt(text) => write!(f, "Preview: {text}"),
        }
    }
}

/// Lay out a preview descriptor as display lines.
///
/// Absent fields produce no line. A page count of 0 is treated as absent.
pub fn preview_lines(preview: &PreviewDescriptor) -> Vec<PreviewLine> {
    let mut lines = vec![PreviewLine::Field {
        label: "Type",
        value: preview.kind.to_uppercase(),
    }];

    if let Some(pages) = preview.pages.filter(|&p| p > 0) {
        lines.push(PreviewLine::Field {
            label: "Pages",
            value: pages.to_string(),
        });
    }

    if let Some(scanned) = preview.is_scanned {
        lines.push(PreviewLine::Field {
            label: "Document Type",
            value: if scanned {
                "Scanned (Image-based)".to_string()
            } else {
                "Digital (Text-based)".to_string()
            },
        });
    }

    if preview.has_tables == Some(true) {
        lines.push(PreviewLine::Notice("Tables detected in document".to_string()));
    }

    if let Some(text) = preview.preview.as_deref().filter(|t| !t.trim().is_empty()) {
        lines.push(PreviewLine::Excerpt(text.to_string()));
    }

    lines
}

/// Everything a renderer needs to draw the session.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ViewState {
    /// Name shown in the file-info region; `None` hides the region.
    pub file_info: Option<String>,
    /// Value of the raw file input. Cleared on remove/reset.
    pub file_input: Option<String>,
    pub format_picker_visible: bool,
    /// The single highlighted format card.
    pub selected_format: Option<OutputFormat>,
    pub convert_visible: bool,
    pub convert_enabled: bool,
    /// `None` hides the progress region.
    pub progress: Option<Progress>,
    /// `None` hides the preview region.
    pub preview: Option<PreviewDescriptor>,
    /// `None` hides the results region.
    pub results: Option<Vec<DownloadEntry>>,
    /// `None` hides the error region.
    pub error: Option<String>,
    pub scroll: ScrollTarget,
}

impl ViewState {
    pub fn show_progress(&mut self, percent: u8, label: impl Into<String>) {
        self.progress = Some(Progress::new(percent, label));
    }

    pub fn hide_progress(&mut self) {
        self.progress = None;
    }

    /// Reveal the error region, hide progress, scroll the error into view.
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.progress = None;
        self.scroll = ScrollTarget::Error;
    }

    pub fn hide_error(&mut self) {
        self.error = None;
    }

    pub fn show_results(&mut self, downloads: &[Download]) {
        self.results = Some(downloads.iter().map(DownloadEntry::from).collect());
        self.scroll = ScrollTarget::Results;
    }

    /// Preview region as lines; empty when hidden.
    pub fn preview_lines(&self) -> Vec<PreviewLine> {
        self.preview.as_ref().map(preview_lines).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(preview: &PreviewDescriptor) -> Vec<String> {
        preview_lines(preview).iter().map(ToString::to_string).collect()
    }

    #[test]
    fn digital_pdf_preview() {
        let p = PreviewDescriptor {
            kind: "pdf".into(),
            pages: Some(3),
            is_scanned: Some(false),
            ..Default::default()
        };
        assert_eq!(
            lines(&p),
            vec!["Type: PDF", "Pages: 3", "Document Type: Digital (Text-based)"]
        );
    }

    #[test]
    fn scanned_image_with_tables_and_excerpt() {
        let p = PreviewDescriptor {
            kind: "image".into(),
            pages: None,
            is_scanned: Some(true),
            has_tables: Some(true),
            preview: Some("Invoice #42".into()),
        };
        assert_eq!(
            lines(&p),
            vec![
                "Type: IMAGE",
                "Document Type: Scanned (Image-based)",
                "Tables detected in document",
                "Preview: Invoice #42",
            ]
        );
    }

    #[test]
    fn absent_fields_are_skipped() {
        let p = PreviewDescriptor {
            kind: "pdf".into(),
            pages: Some(0),
            has_tables: Some(false),
            preview: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(lines(&p), vec!["Type: PDF"]);
    }

    #[test]
    fn download_entry_styles() {
        let word = DownloadEntry::from(&Download {
            name: "out.docx".into(),
            url: "/dl/out.docx".into(),
            kind: None,
        });
        assert_eq!(word.icon(), "file-word");
        assert_eq!(word.color(), "primary");

        let sheet = DownloadEntry::from(&Download {
            name: "out.xlsx".into(),
            url: "/dl/out.xlsx".into(),
            kind: None,
        });
        assert_eq!(sheet.icon(), "file-excel");
        assert_eq!(sheet.color(), "success");

        let other = DownloadEntry::from(&Download {
            name: "out.csv".into(),
            url: "/dl/out.csv".into(),
            kind: None,
        });
        assert_eq!(other.kind, DownloadKind::Other);
        assert_eq!(other.icon(), "file-earmark");
    }

    #[test]
    fn show_error_hides_progress_and_scrolls() {
        let mut view = ViewState::default();
        view.show_progress(20, "Uploading file...");
        view.show_error("boom");
        assert!(view.progress.is_none());
        assert_eq!(view.error.as_deref(), Some("boom"));
        assert_eq!(view.scroll, ScrollTarget::Error);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(Progress::new(150, "x").percent, 100);
    }
}
