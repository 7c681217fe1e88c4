//! Error types for the pdf2speech library.
//!
//! Failures fall into three groups that the caller treats differently:
//!
//! * [`ValidationError`] — the requested page range does not fit the
//!   document. Surfaced to the user as a blocking message; no pages are
//!   rendered and the previous run's output is left alone.
//!
//! * [`PipelineError`] — the run cannot continue (not a PDF, corrupt file,
//!   a page that cannot be rendered or read). Returned as `Err` from
//!   [`crate::reader::Reader::run`]. Pages rendered before the failure stay
//!   in the reader's slots.
//!
//! * [`SynthesisError`] — the speech service refused or could not be reached.
//!   This is never returned as `Err`: the run still produces pages and a
//!   transcript, and the error is carried in
//!   [`crate::output::AudioOutcome::Unavailable`].

use std::path::PathBuf;
use thiserror::Error;

/// A requested page range that cannot be applied to the document.
///
/// The `Display` text is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
pub enum ValidationError {
    /// A page value did not parse as an integer.
    #[error("Please enter valid start and end page numbers. ('{input}' is not a number)")]
    NotANumber { input: String },

    /// `start < 1` or `end < start`.
    #[error("Please enter valid start and end page numbers. (got {start}–{end})")]
    InvalidOrder { start: i64, end: i64 },

    /// `start` lies past the last page.
    #[error(
        "Start page number exceeds the total number of pages in the PDF. \
         (start {start}, document has {total} pages)"
    )]
    StartBeyondDocument { start: i64, total: usize },
}

/// A single page could not be rasterised.
#[derive(Debug, Clone, Error, serde::Serialize)]
#[error("Rasterisation failed for page {page}: {detail}")]
pub struct RenderError {
    pub page: usize,
    pub detail: String,
}

/// A single page's text content could not be read.
#[derive(Debug, Clone, Error, serde::Serialize)]
#[error("Text extraction failed for page {page}: {detail}")]
pub struct ExtractError {
    pub page: usize,
    pub detail: String,
}

/// The speech service did not return audio.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
pub enum SynthesisError {
    /// The service answered with a non-success status.
    #[error("Speech request failed with HTTP {status}: {body}")]
    RequestFailed { status: u16, body: String },

    /// No response at all: DNS, connect, TLS or timeout failure.
    #[error("Speech service unreachable: {reason}")]
    Unreachable { reason: String },
}

/// Errors that abort a conversion run.
#[derive(Debug, Error)]
pub enum PipelineError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The payload does not carry the `%PDF` signature.
    #[error("Please select a PDF file. (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not parse the document.
    #[error("PDF could not be opened: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    OpenFailed { detail: String },

    /// The requested page range does not fit the document.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A page in the range could not be rasterised.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// A page in the range had an unreadable content stream.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    // ── Output errors ─────────────────────────────────────────────────────
    /// The audio payload could not be stored or copied.
    #[error("Failed to write audio file '{path}': {source}")]
    AudioWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium for your platform (https://github.com/bblanchon/pdfium-binaries)\n\
and either place it on the system library path or set\n\
PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// True for errors the user caused by picking the wrong file or range,
    /// as opposed to environment or document faults.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            PipelineError::NotAPdf { .. } | PipelineError::Validation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_match_user_prompts() {
        let e = ValidationError::NotANumber { input: "abc".into() };
        assert!(e.to_string().starts_with("Please enter valid start and end page numbers."));
        assert!(e.to_string().contains("abc"));

        let e = ValidationError::InvalidOrder { start: 4, end: 2 };
        assert!(e.to_string().starts_with("Please enter valid start and end page numbers."));

        let e = ValidationError::StartBeyondDocument { start: 6, total: 5 };
        let msg = e.to_string();
        assert!(msg.starts_with("Start page number exceeds"), "got: {msg}");
        assert!(msg.contains("5 pages"));
    }

    #[test]
    fn validation_error_is_transparent_in_pipeline_error() {
        let inner = ValidationError::StartBeyondDocument { start: 9, total: 3 };
        let outer: PipelineError = inner.clone().into();
        assert_eq!(outer.to_string(), inner.to_string());
        assert!(outer.is_user_input());
    }

    #[test]
    fn synthesis_error_display() {
        let e = SynthesisError::RequestFailed {
            status: 503,
            body: "model loading".into(),
        };
        assert!(e.to_string().contains("503"));
        assert!(e.to_string().contains("model loading"));

        let e = SynthesisError::Unreachable {
            reason: "connection refused".into(),
        };
        assert!(e.to_string().contains("connection refused"));
    }

    #[test]
    fn page_errors_name_the_page() {
        let e: PipelineError = RenderError {
            page: 7,
            detail: "bad xobject".into(),
        }
        .into();
        assert!(e.to_string().contains("page 7"));
        assert!(!e.is_user_input());

        let e = ExtractError {
            page: 2,
            detail: "truncated stream".into(),
        };
        assert!(e.to_string().contains("page 2"));
    }
}
