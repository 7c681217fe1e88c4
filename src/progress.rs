//! Progress-callback trait for per-run and per-page events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::ReaderConfigBuilder::progress_callback`] to follow a run
//! as it validates, renders each page, and waits on the speech service.
//!
//! # Example
//!
//! ```rust
//! use pdf2speech::{ReaderConfig, RunProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: AtomicUsize,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {} of {} read ({} chars)", page_num, total_pages, text_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { pages: AtomicUsize::new(0) });
//!
//! let config = ReaderConfig::builder()
//!     .progress_callback(counter as Arc<dyn RunProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::RunState;
use crate::pipeline::range::PageRange;
use std::sync::Arc;

/// Called by the reader as a run moves through its stages.
///
/// Page events are emitted from the blocking render thread, in ascending
/// page order and never concurrently. All methods default to no-ops.
pub trait RunProgressCallback: Send + Sync {
    /// Called once the range has been validated, before the first page.
    fn on_run_start(&self, range: PageRange) {
        let _ = range;
    }

    /// Called before a page is rendered.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `index`       — 0-based slot within the range
    /// * `total_pages` — pages in the range
    fn on_page_start(&self, page_num: usize, index: usize, total_pages: usize) {
        let _ = (page_num, index, total_pages);
    }

    /// Called after a page has been rendered and its text extracted.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, text_len: usize) {
        let _ = (page_num, total_pages, text_len);
    }

    /// Called when a page fails; the run stops after this.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called just before the transcript is sent for synthesis.
    fn on_synthesis_start(&self, transcript_len: usize) {
        let _ = transcript_len;
    }

    /// Called on every state transition, including one
    /// `Rendering { page }` per page and exactly one terminal state.
    fn on_state_change(&self, state: RunState) {
        let _ = state;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ReaderConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;
