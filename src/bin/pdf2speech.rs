//! CLI binary for pdf2speech.
//!
//! A thin shim over the library crate that maps CLI flags to `ReaderConfig`,
//! runs one conversion and writes the audio, page images and transcript.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2speech::audio::extension_for;
use pdf2speech::pipeline::encode::write_pages;
use pdf2speech::{
    AudioOutcome, PageRange, ProgressCallback, Reader, ReaderConfig, ReaderConfigBuilder,
    RunProgressCallback, RunReport, RunState,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
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

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a page bar while rendering, a spinner while the speech
/// service works, one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the page currently being processed.
    page_started: Mutex<Option<Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(SPINNER);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(SPINNER);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Reading");
        self.bar.reset_eta();
    }

    fn page_elapsed(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, range: PageRange) {
        self.activate_bar(range.len());
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Reading pages {}–{} ({} pages)…",
                range.start(),
                range.end(),
                range.len()
            ))
        ));
    }

    fn on_page_start(&self, page_num: usize, _index: usize, _total: usize) {
        if let Ok(mut t) = self.page_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, text_len: usize) {
        self.bar.println(format!(
            "  {} Page {:>3}  {:<3}  {:<8}  {}",
            green("✓"),
            page_num,
            dim(&format!("({total})")),
            dim(&format!("{text_len:>5} chars")),
            dim(&format!("{:.1}s", self.page_elapsed())),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, _total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}  {}  {}",
            red("✗"),
            page_num,
            red(&msg),
            dim(&format!("{:.1}s", self.page_elapsed())),
        ));
    }

    fn on_synthesis_start(&self, transcript_len: usize) {
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(SPINNER);
        self.bar.set_style(spinner_style);
        self.bar.set_prefix("Speaking");
        self.bar
            .set_message(format!("synthesising {transcript_len} chars…"));
    }

    fn on_state_change(&self, state: RunState) {
        if !state.is_terminal() {
            return;
        }
        self.bar.finish_and_clear();
        match state {
            RunState::Published => eprintln!("{} audio ready", green("✔")),
            RunState::Failed(stage) => eprintln!("{} stopped at {:?}", red("✘"), stage),
            _ => {}
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Read pages 2–4 aloud, audio saved next to the PDF name
  pdf2speech report.pdf --start 2 --end 4

  # Choose the audio file and keep the rendered pages
  pdf2speech report.pdf --start 1 --end 3 -o intro.flac --pages-dir pages/

  # End past the last page is clamped to the last page
  pdf2speech report.pdf --start 3 --end 999

  # From a URL, transcript to a file, JSON report on stdout
  pdf2speech https://arxiv.org/pdf/1706.03762 --start 1 --end 1 \
      --transcript p1.txt --json

ENVIRONMENT VARIABLES:
  PDF2SPEECH_API_KEY      Bearer token for the speech endpoint
  HF_TOKEN                Fallback token (Hugging Face)
  PDF2SPEECH_ENDPOINT     Override the speech endpoint URL
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  RUST_LOG                Override log filtering (e.g. pdf2speech=debug)

SETUP:
  1. Install libpdfium (https://github.com/bblanchon/pdfium-binaries) or
     point PDFIUM_LIB_PATH at it.
  2. export PDF2SPEECH_API_KEY=hf_...
  3. pdf2speech document.pdf --start 1 --end 2
"#;

/// Render a page range of a PDF and read it aloud.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2speech",
    version,
    about = "Render a page range of a PDF and read it aloud via a text-to-speech service",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// First page to read (1-based).
    #[arg(short, long, allow_hyphen_values = true)]
    start: String,

    /// Last page to read (inclusive; clamped to the last page).
    #[arg(short, long, allow_hyphen_values = true)]
    end: String,

    /// Write the audio to this file (default: <input stem>.<ext>).
    #[arg(short, long, env = "PDF2SPEECH_OUTPUT")]
    output: Option<PathBuf>,

    /// Write each rendered page as page-NNN.png into this directory.
    #[arg(long, env = "PDF2SPEECH_PAGES_DIR")]
    pages_dir: Option<PathBuf>,

    /// Write the transcript to this file ("-" for stdout).
    #[arg(long, env = "PDF2SPEECH_TRANSCRIPT")]
    transcript: Option<PathBuf>,

    /// Page magnification (0.1–8.0).
    #[arg(long, env = "PDF2SPEECH_SCALE", default_value_t = 1.5)]
    scale: f32,

    /// Speech endpoint URL.
    #[arg(long, env = "PDF2SPEECH_ENDPOINT")]
    endpoint: Option<String>,

    /// Speech API key (prefer the environment variable).
    #[arg(long, env = "PDF2SPEECH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Speech request timeout in seconds.
    #[arg(long, env = "PDF2SPEECH_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2SPEECH_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2SPEECH_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Print the run report as JSON on stdout.
    #[arg(long, env = "PDF2SPEECH_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2SPEECH_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2SPEECH_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2SPEECH_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn RunProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let mut reader = Reader::new(config).context("Failed to set up reader")?;
    let result = reader.run_input(&cli.input, &cli.start, &cli.end).await;

    // Pages rendered before a failure are still written out.
    if let Some(ref dir) = cli.pages_dir {
        if !reader.pages().is_empty() {
            let paths = write_pages(reader.pages(), dir).context("Failed to write page images")?;
            if !cli.quiet {
                eprintln!(
                    "{} {} page images → {}",
                    dim("•"),
                    paths.len(),
                    bold(&dir.display().to_string())
                );
            }
        }
    }

    let report = result.context("Conversion failed")?;

    if let Some(ref path) = cli.transcript {
        write_transcript(&report, path)?;
    }

    let audio_path = match report.audio {
        AudioOutcome::Published(ref handle) => {
            let dest = cli.output.clone().unwrap_or_else(|| {
                default_audio_path(&cli.input, extension_for(handle.content_type.as_deref()))
            });
            reader
                .audio_store()
                .save_current(&dest)
                .context("Failed to save audio")?;
            Some(dest)
        }
        AudioOutcome::Unavailable(ref e) => {
            if !cli.quiet {
                eprintln!("{} No audio available: {}", cyan("⚠"), e);
            }
            None
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    }

    if !cli.quiet {
        eprintln!(
            "{}  pages {}–{} of {}  {}ms",
            if report.audio.is_published() {
                green("✔")
            } else {
                cyan("⚠")
            },
            report.range.start(),
            report.range.end(),
            report.page_count,
            report.total_duration_ms,
        );
        if let Some(ref path) = audio_path {
            eprintln!("   audio  →  {}", bold(&path.display().to_string()));
        }
    }

    Ok(())
}

/// Map CLI args to `ReaderConfig`, on top of the environment defaults.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ReaderConfig> {
    let mut builder = ReaderConfigBuilder::from_config(ReaderConfig::from_env())
        .scale(cli.scale)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref endpoint) = cli.endpoint {
        builder = builder.endpoint(endpoint.clone());
    }
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library(lib.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn write_transcript(report: &RunReport, path: &Path) -> Result<()> {
    let text = report.transcript.render();
    if path == Path::new("-") {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        if !text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
        return Ok(());
    }
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write transcript to {}", path.display()))
}

/// `<stem>.<ext>` in the current directory, derived from a path or URL.
fn default_audio_path(input: &str, ext: &str) -> PathBuf {
    let name = input
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    // Only a `.pdf` suffix is dropped; dots elsewhere (`1706.03762`) are kept.
    let stem = match name.len().checked_sub(4) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".pdf") => {
            &name[..cut]
        }
        _ => name,
    };
    let stem = if stem.is_empty() { "speech" } else { stem };
    PathBuf::from(format!("{stem}.{ext}"))
}
