//! CLI binary for edgequake-doc2office.
//!
//! A thin shim over the library crate: maps CLI flags to `ClientConfig`,
//! drives one `SessionController` attempt and draws its view-model to the
//! terminal.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_doc2office::pipeline::download::save_all;
use edgequake_doc2office::{
    cleanup, load_file, ClientConfig, Doc2OfficeError, DownloadKind, OutputFormat, Phase, PreviewLine,
    SavedFile, SessionController, SessionRenderer, ViewState,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}
fn blue(s: &str) -> String {
    format!("\x1b[34m{s}\x1b[0m")
}

// ── Terminal renderer ────────────────────────────────────────────────────────

#[derive(Default)]
struct Drawn {
    bar: Option<ProgressBar>,
    preview_shown: bool,
    results_shown: bool,
    error_shown: Option<String>,
}

/// Draws the session view-model to stderr: an indicatif bar for the progress
/// region, plus one-off blocks for the preview, results and error regions.
struct TerminalRenderer {
    progress: bool,
    drawn: Mutex<Drawn>,
}

impl TerminalRenderer {
    fn new(progress: bool) -> Arc<Self> {
        Arc::new(Self {
            progress,
            drawn: Mutex::new(Drawn::default()),
        })
    }

    fn new_bar() -> ProgressBar {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Session");
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    }

    fn print_preview(lines: &[PreviewLine]) {
        eprintln!("{} {}", cyan("◆"), bold("Preview"));
        for line in lines {
            match line {
                PreviewLine::Field { label, value } => {
                    eprintln!("  {:<15} {}", dim(&format!("{label}:")), value)
                }
                PreviewLine::Notice(text) => eprintln!("  {} {}", cyan("▦"), text),
                PreviewLine::Excerpt(text) => {
                    eprintln!("  {}", dim("Preview:"));
                    for l in text.lines().take(8) {
                        eprintln!("    {}", dim(l));
                    }
                }
            }
        }
    }

    fn print_results(view: &ViewState) {
        let Some(ref results) = view.results else {
            return;
        };
        eprintln!("{} {}", green("✔"), bold("Conversion complete"));
        if results.is_empty() {
            eprintln!("  {}", dim("(server returned no files)"));
        }
        for entry in results {
            let name = match entry.kind {
                DownloadKind::Document => blue(&entry.name),
                DownloadKind::Spreadsheet => green(&entry.name),
                DownloadKind::Other => entry.name.clone(),
            };
            eprintln!("  ⬇ {:<40} {}", name, dim(&entry.url));
        }
    }
}

impl SessionRenderer for TerminalRenderer {
    fn render(&self, view: &ViewState, phase: Phase) {
        let Ok(mut drawn) = self.drawn.lock() else {
            return;
        };

        match (&view.progress, self.progress) {
            (Some(p), true) => {
                let bar = drawn.bar.get_or_insert_with(Self::new_bar);
                bar.set_position(p.percent as u64);
                bar.set_message(p.label.clone());
            }
            (None, _) => {
                if let Some(bar) = drawn.bar.take() {
                    bar.finish_and_clear();
                }
            }
            _ => {}
        }

        if view.preview.is_none() {
            drawn.preview_shown = false;
        } else if !drawn.preview_shown
            && matches!(phase, Phase::Previewed | Phase::FormatChosen)
        {
            Self::print_preview(&view.preview_lines());
            drawn.preview_shown = true;
        }

        if view.results.is_none() {
            drawn.results_shown = false;
        } else if !drawn.results_shown && phase == Phase::Converted {
            Self::print_results(view);
            drawn.results_shown = true;
        }

        if view.error != drawn.error_shown {
            if let Some(ref message) = view.error {
                eprintln!("{} {}", red("✘"), red(message));
            }
            drawn.error_shown = view.error.clone();
        }
    }
}

// ── CLI ──────────────────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a PDF to Word and save the result in ./out
  doc2office report.pdf -o out

  # Extract tables from a scanned invoice into Excel
  doc2office --format excel invoice.png -o out

  # Both outputs, against a remote server
  doc2office --server https://convert.example.com --format both scan.jpg -o out

  # Show what the server detected without converting
  doc2office --preview-only contract.pdf

  # Machine-readable result, delete the upload afterwards
  doc2office --json --cleanup report.pdf > result.json

ACCEPTED INPUT:
  PDF, PNG, JPEG — at most 16 MB. Anything else is rejected before upload.

ENVIRONMENT VARIABLES:
  DOC2OFFICE_SERVER       Conversion server base URL
  DOC2OFFICE_FORMAT       Output format (word, excel, both)
  DOC2OFFICE_OUTPUT_DIR   Directory to save converted files into
  RUST_LOG                Override log filter (e.g. edgequake_doc2office=debug)
"#;

/// Convert PDF and image files to Word/Excel through a conversion server.
#[derive(Parser, Debug)]
#[command(
    name = "doc2office",
    version,
    about = "Convert PDF and image files to Word/Excel through a conversion server",
    long_about = "Upload a PDF, PNG or JPEG to a document conversion server, convert it to \
Word (.docx), Excel (.xlsx) or both, and optionally download the results.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF, PNG or JPEG file.
    input: PathBuf,

    /// Output format.
    #[arg(short, long, env = "DOC2OFFICE_FORMAT", value_enum, default_value = "word")]
    format: FormatArg,

    /// Conversion server base URL.
    #[arg(long, env = "DOC2OFFICE_SERVER", default_value = "http://127.0.0.1:5000")]
    server: String,

    /// Download converted files into this directory.
    #[arg(short, long, env = "DOC2OFFICE_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Upload and print the server's preview, without converting.
    #[arg(long)]
    preview_only: bool,

    /// Ask the server to delete the upload when done.
    #[arg(long, env = "DOC2OFFICE_CLEANUP")]
    cleanup: bool,

    /// Output a JSON report instead of human-readable text.
    #[arg(long, env = "DOC2OFFICE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOC2OFFICE_NO_PROGRESS")]
    no_progress: bool,

    /// Pause between the 100% frame and the results, in milliseconds.
    #[arg(long, env = "DOC2OFFICE_RESULT_DELAY", default_value_t = 500)]
    result_delay: u64,

    /// Per-request timeout in seconds (default: wait indefinitely).
    #[arg(long, env = "DOC2OFFICE_TIMEOUT")]
    timeout: Option<u64>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2OFFICE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2OFFICE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Word,
    Excel,
    Both,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Word => OutputFormat::Word,
            FormatArg::Excel => OutputFormat::Excel,
            FormatArg::Both => OutputFormat::Both,
        }
    }
}

/// JSON report printed with `--json`.
#[derive(Serialize)]
struct Report<'a> {
    file_name: &'a str,
    server_filename: Option<&'a str>,
    format: Option<OutputFormat>,
    view: &'a ViewState,
    saved: &'a [SavedFile],
    cleaned_up: bool,
    duration_ms: u64,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let start = Instant::now();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the renderer provides all the feedback that matters to the user.
    let rendered = !cli.quiet && !cli.json;
    let show_progress = rendered && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli, show_progress)?;

    // ── Stage + upload ───────────────────────────────────────────────────
    let file = load_file(&cli.input)
        .await
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let file_name = file.name.clone();

    let mut session = SessionController::new(&config).context("Failed to start session")?;
    if let Err(e) = session.select_file(file).await {
        return Failure::from_session(e, rendered, format!("Could not upload '{file_name}'"))
            .into_exit();
    }

    // ── Convert + cleanup ────────────────────────────────────────────────
    let (saved, cleaned_up) = match finish(&mut session, &cli, &config, &file_name, rendered).await {
        Ok(done) => done,
        Err(failure) => return failure.into_exit(),
    };

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        let report = Report {
            file_name: &file_name,
            server_filename: session.server_filename(),
            format: session.selected_format(),
            view: session.view(),
            saved: &saved,
            cleaned_up,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        for s in &saved {
            eprintln!(
                "  {} {}  {}",
                green("✓"),
                bold(&s.path.display().to_string()),
                dim(&format!("{} bytes", s.bytes)),
            );
        }
        if cleaned_up {
            eprintln!("  {}", dim("upload deleted on server"));
        }
        eprintln!(
            "{}",
            dim(&format!("{}ms total", start.elapsed().as_millis()))
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// How a failed run reaches the user.
#[derive(Debug)]
enum Failure {
    /// Already drawn by the terminal renderer.
    Shown,
    Report(anyhow::Error),
}

impl Failure {
    fn from_session(err: Doc2OfficeError, rendered: bool, context: String) -> Self {
        if rendered {
            Failure::Shown
        } else {
            Failure::Report(anyhow::Error::new(err).context(context))
        }
    }

    fn into_exit(self) -> Result<ExitCode> {
        match self {
            Failure::Shown => Ok(ExitCode::FAILURE),
            Failure::Report(e) => Err(e),
        }
    }
}

/// Convert (unless preview-only) and save, then delete the upload when
/// `--cleanup` is set, whether or not the conversion succeeded.
async fn finish(
    session: &mut SessionController,
    cli: &Cli,
    config: &ClientConfig,
    file_name: &str,
    rendered: bool,
) -> Result<(Vec<SavedFile>, bool), Failure> {
    let result = convert_and_save(session, cli, file_name, rendered).await;

    let cleanup_result = match (cli.cleanup, session.server_filename()) {
        (true, Some(server_filename)) => Some(cleanup(server_filename, config).await),
        _ => None,
    };

    let saved = match result {
        Ok(saved) => saved,
        Err(failure) => {
            if let Some(Err(e)) = cleanup_result {
                tracing::error!("Failed to clean up the upload: {}", e);
            }
            return Err(failure);
        }
    };
    let cleaned_up = match cleanup_result {
        Some(r) => {
            r.context("Failed to clean up the upload")
                .map_err(Failure::Report)?;
            true
        }
        None => false,
    };
    Ok((saved, cleaned_up))
}

async fn convert_and_save(
    session: &mut SessionController,
    cli: &Cli,
    file_name: &str,
    rendered: bool,
) -> Result<Vec<SavedFile>, Failure> {
    if cli.preview_only {
        return Ok(Vec::new());
    }
    session.choose_format(cli.format.into());
    session.convert().await.map_err(|e| {
        Failure::from_session(e, rendered, format!("Could not convert '{file_name}'"))
    })?;

    let Some(ref dir) = cli.output_dir else {
        return Ok(Vec::new());
    };
    save_all(session.backend().as_ref(), session.downloads(), dir)
        .await
        .context("Failed to save converted files")
        .map_err(Failure::Report)
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli, show_progress: bool) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .server_url(cli.server.clone())
        .result_delay_ms(if cli.json || cli.quiet { 0 } else { cli.result_delay });

    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if !cli.quiet && !cli.json {
        builder = builder.renderer(TerminalRenderer::new(show_progress));
    }

    builder.build().context("Invalid configuration")
}
