//! # pdf2speech
//!
//! Render a range of pages from a PDF and read their text aloud through a
//! remote text-to-speech service.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Input       %PDF signature check (path / URL / bytes)
//!  ├─ 2. Open        pdfium, on a blocking thread
//!  ├─ 3. Validate    start/end against the page count, end clamped
//!  ├─ 4. Pages       for p in start..=end: render at 1.5×, extract text
//!  ├─ 5. Transcript  "Page p: …" blocks joined by a blank line
//!  ├─ 6. Speech      one POST {"inputs": transcript} → audio bytes
//!  └─ 7. Publish     audio file behind a revocable handle
//! ```
//!
//! A failed speech request does not fail the run: the report carries
//! [`AudioOutcome::Unavailable`] and the pages and transcript are kept.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2speech::{Reader, ReaderConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from PDF2SPEECH_API_KEY (or HF_TOKEN)
//!     let config = ReaderConfig::from_env();
//!     let mut reader = Reader::new(config)?;
//!     let report = reader.run_input("document.pdf", "2", "4").await?;
//!     println!("{}", report.transcript);
//!     match reader.audio() {
//!         Some(handle) => println!("audio: {}", handle.resource_ref),
//!         None => eprintln!("no audio available"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2speech` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod audio;
pub mod config;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod reader;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use audio::{AudioHandle, AudioStore};
pub use config::{ReaderConfig, ReaderConfigBuilder};
pub use document::{Document, DocumentBackend, PdfiumBackend};
pub use error::{ExtractError, PipelineError, RenderError, SynthesisError, ValidationError};
pub use output::{AudioOutcome, FailedStage, PageText, RenderedPage, RunReport, RunState};
pub use pipeline::range::{validate, PageRange};
pub use pipeline::speech::{AudioPayload, SpeechClient};
pub use pipeline::transcript::Transcript;
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use reader::Reader;
