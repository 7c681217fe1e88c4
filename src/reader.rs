//! The conversion run: PDF bytes in, rendered pages and speech out.
//!
//! A [`Reader`] is the long-lived owner of everything a run produces: the
//! page slots the presentation layer displays, the current audio handle, and
//! the state of the last run. Each call to [`Reader::run`] starts from
//! [`RunState::Idle`] and walks
//!
//! ```text
//! Idle ─▶ Validating ─▶ Rendering{start..=end} ─▶ Synthesizing ─▶ Published
//!   │          │                 │                      │
//!   └──────────┴─────────────────┴──────────────────────┴──▶ Failed(stage)
//! ```
//!
//! Pages are rendered and read strictly in ascending order on one blocking
//! thread (pdfium is not async-safe); synthesis is a single awaited request
//! after the last page. `run` takes `&mut self`, so two runs can never
//! interleave on one reader, and a run future that is dropped part-way never
//! writes its results back.

use crate::audio::{AudioHandle, AudioStore};
use crate::config::ReaderConfig;
use crate::document::{DocumentBackend, PdfiumBackend};
use crate::error::PipelineError;
use crate::output::{AudioOutcome, FailedStage, PageText, RenderedPage, RunReport, RunState};
use crate::pipeline::range::{self, PageRange};
use crate::pipeline::speech::SpeechClient;
use crate::pipeline::transcript::Transcript;
use crate::pipeline::{input, render, text};
use crate::progress::RunProgressCallback;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Owner of page slots, audio and run state across repeated runs.
pub struct Reader {
    config: ReaderConfig,
    backend: Arc<dyn DocumentBackend>,
    speech: SpeechClient,
    audio: AudioStore,
    pages: Vec<RenderedPage>,
    state: RunState,
    runs: u64,
}

impl Reader {
    /// A reader backed by pdfium.
    pub fn new(config: ReaderConfig) -> Result<Self, PipelineError> {
        let mut backend = PdfiumBackend::new();
        if let Some(ref lib) = config.pdfium_library {
            backend = backend.with_library(lib);
        }
        if let Some(ref pwd) = config.password {
            backend = backend.with_password(pwd);
        }
        Self::with_backend(config, Arc::new(backend))
    }

    /// A reader using a caller-supplied document backend.
    pub fn with_backend(
        config: ReaderConfig,
        backend: Arc<dyn DocumentBackend>,
    ) -> Result<Self, PipelineError> {
        let speech = SpeechClient::from_config(&config)?;
        Ok(Self {
            config,
            backend,
            speech,
            audio: AudioStore::new()?,
            pages: Vec::new(),
            state: RunState::Idle,
            runs: 0,
        })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Rendered pages of the most recent run that got past validation, in
    /// slot order. After a failed page this holds the pages rendered before it.
    pub fn pages(&self) -> &[RenderedPage] {
        &self.pages
    }

    /// The current audio handle, if any.
    pub fn audio(&self) -> Option<&AudioHandle> {
        self.audio.current()
    }

    pub fn audio_store(&self) -> &AudioStore {
        &self.audio
    }

    /// Release the current audio; e.g. when the user discards the result.
    pub fn release_audio(&mut self) -> bool {
        self.audio.release_current()
    }

    /// State of the last run.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Number of runs started on this reader.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Read a local path or URL, then [`run`](Self::run) it.
    pub async fn run_input(
        &mut self,
        input_str: &str,
        raw_start: &str,
        raw_end: &str,
    ) -> Result<RunReport, PipelineError> {
        info!("Resolving input: {}", input_str);
        let bytes = input::resolve_input(input_str, self.config.download_timeout_secs).await?;
        self.run(bytes, raw_start, raw_end).await
    }

    /// Synchronous wrapper around [`run_input`](Self::run_input).
    ///
    /// Creates a temporary tokio runtime internally; do not call from within
    /// an async context.
    pub fn run_input_sync(
        &mut self,
        input_str: &str,
        raw_start: &str,
        raw_end: &str,
    ) -> Result<RunReport, PipelineError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| PipelineError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.run_input(input_str, raw_start, raw_end))
    }

    /// Convert pages `raw_start..=raw_end` of the PDF in `bytes`.
    ///
    /// # Returns
    /// `Ok(RunReport)` once pages are rendered and the transcript is built,
    /// whether or not synthesis succeeded (see [`RunReport::audio`]).
    ///
    /// # Errors
    /// - [`PipelineError::NotAPdf`] / [`PipelineError::OpenFailed`]
    /// - [`PipelineError::Validation`] for a bad range; nothing is rendered
    ///   and the previous run's pages and audio are kept
    /// - [`PipelineError::Render`] / [`PipelineError::Extract`] for the first
    ///   page that fails; earlier pages stay in [`pages`](Self::pages)
    pub async fn run(
        &mut self,
        bytes: Vec<u8>,
        raw_start: &str,
        raw_end: &str,
    ) -> Result<RunReport, PipelineError> {
        let total_start = Instant::now();
        self.runs += 1;
        let run = self.runs;
        self.transition(RunState::Idle);
        info!(
            "Run {}: {} bytes, pages '{}'–'{}'",
            run,
            bytes.len(),
            raw_start,
            raw_end
        );

        // ── Step 1: Signature check ──────────────────────────────────────────
        if let Err(e) = input::check_signature(&bytes) {
            return Err(self.fail(FailedStage::Input, e));
        }

        // ── Steps 2–4: Open, validate, render + extract each page ───────────
        self.transition(RunState::Validating);
        let backend = Arc::clone(&self.backend);
        let progress = self.config.progress_callback.clone();
        let scale = self.config.scale;
        let (raw_start, raw_end) = (raw_start.to_string(), raw_end.to_string());

        let render_start = Instant::now();
        let (stage, result) = tokio::task::spawn_blocking(move || {
            process_pages(
                backend.as_ref(),
                &bytes,
                &raw_start,
                &raw_end,
                scale,
                progress.as_deref(),
            )
        })
        .await
        .map_err(|e| PipelineError::Internal(format!("Render task panicked: {}", e)))?;
        let render_duration_ms = render_start.elapsed().as_millis() as u64;

        // Past validation the previous run's output is superseded, even if a
        // page fails below.
        if stage.range.is_some() {
            self.pages = stage.pages;
            self.audio.release_current();
        }

        if let Err(e) = result {
            let failed = failed_stage(&e);
            return Err(self.fail(failed, e));
        }

        let Some(range) = stage.range else {
            return Err(self.fail(
                FailedStage::Validating,
                PipelineError::Internal("page stage finished without a range".into()),
            ));
        };
        info!(
            "Rendered {} pages ({}–{} of {}) in {}ms",
            self.pages.len(),
            range.start(),
            range.end(),
            stage.page_count,
            render_duration_ms
        );

        // ── Step 5: Synthesis ────────────────────────────────────────────────
        let transcript = stage.transcript;
        let request_text = transcript.render();
        self.transition(RunState::Synthesizing);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_synthesis_start(request_text.len());
        }

        let synth_start = Instant::now();
        let audio = match self.speech.synthesize(&request_text).await {
            Ok(payload) => match self.audio.publish(&payload) {
                Ok(handle) => AudioOutcome::Published(handle),
                Err(e) => return Err(self.fail(FailedStage::Synthesizing, e)),
            },
            Err(e) => {
                warn!("Speech synthesis failed, continuing without audio: {}", e);
                AudioOutcome::Unavailable(e)
            }
        };
        let synthesis_duration_ms = synth_start.elapsed().as_millis() as u64;

        let report = RunReport {
            run,
            page_count: stage.page_count,
            range,
            transcript,
            audio,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
            render_duration_ms,
            synthesis_duration_ms,
        };
        self.transition(report.state());

        info!(
            "Run {} complete: {} pages, audio {}, {}ms total",
            run,
            report.range.len(),
            if report.audio.is_published() {
                "published"
            } else {
                "unavailable"
            },
            report.total_duration_ms
        );

        Ok(report)
    }

    fn transition(&mut self, state: RunState) {
        debug!("Run {}: {:?} → {:?}", self.runs, self.state, state);
        self.state = state;
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_state_change(state);
        }
    }

    fn fail(&mut self, stage: FailedStage, err: PipelineError) -> PipelineError {
        warn!("Run {} failed at {:?}: {}", self.runs, stage, err);
        self.transition(RunState::Failed(stage));
        err
    }
}

/// Everything the page loop produced, kept even when the loop stops early.
#[derive(Default)]
struct PageStage {
    page_count: usize,
    range: Option<PageRange>,
    pages: Vec<RenderedPage>,
    transcript: Transcript,
}

/// Open the document, validate the range and process every page in order.
///
/// Runs on a blocking thread. Returns the partial stage alongside the
/// outcome so pages rendered before a failure are not lost.
fn process_pages(
    backend: &dyn DocumentBackend,
    bytes: &[u8],
    raw_start: &str,
    raw_end: &str,
    scale: f32,
    progress: Option<&dyn RunProgressCallback>,
) -> (PageStage, Result<(), PipelineError>) {
    let mut stage = PageStage::default();

    let result = backend.with_document(bytes, &mut |document| {
        stage.page_count = document.page_count();
        let range = range::validate(raw_start, raw_end, stage.page_count)?;
        stage.range = Some(range);
        if let Some(cb) = progress {
            cb.on_run_start(range);
        }

        let total = range.len();
        stage.pages.reserve(total);

        for (index, page_num) in range.pages().enumerate() {
            if let Some(cb) = progress {
                cb.on_state_change(RunState::Rendering { page: page_num });
                cb.on_page_start(page_num, index, total);
            }

            let page = render::render_page(document, page_num, index, scale)
                .map_err(PipelineError::from)
                .and_then(|page| {
                    let text = text::extract_text(document, page_num)?;
                    Ok((page, text))
                });

            match page {
                Ok((page, text)) => {
                    if let Some(cb) = progress {
                        cb.on_page_complete(page_num, total, text.len());
                    }
                    stage.pages.push(page);
                    stage.transcript.push(PageText { page_num, text });
                }
                Err(e) => {
                    if let Some(cb) = progress {
                        cb.on_page_error(page_num, total, &e.to_string());
                    }
                    return Err(e);
                }
            }
        }

        Ok(())
    });

    (stage, result)
}

fn failed_stage(err: &PipelineError) -> FailedStage {
    match err {
        PipelineError::Validation(_) => FailedStage::Validating,
        PipelineError::Render(e) => FailedStage::Rendering { page: e.page },
        PipelineError::Extract(e) => FailedStage::Rendering { page: e.page },
        PipelineError::NotAPdf { .. } => FailedStage::Input,
        _ => FailedStage::Opening,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::error::{ExtractError, RenderError, ValidationError};
    use image::{DynamicImage, RgbaImage};
    use std::sync::Mutex;

    /// Document with `pages` pages; records every render/extract call.
    struct Recording {
        pages: usize,
        fail_render: Option<usize>,
        calls: Mutex<Vec<String>>,
    }

    impl Recording {
        fn new(pages: usize) -> Self {
            Self {
                pages,
                fail_render: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl Document for Recording {
        fn page_count(&self) -> usize {
            self.pages
        }

        fn render(&self, page: usize, _scale: f32) -> Result<DynamicImage, RenderError> {
            self.calls.lock().unwrap().push(format!("render {page}"));
            if self.fail_render == Some(page) {
                return Err(RenderError {
                    page,
                    detail: "broken".into(),
                });
            }
            Ok(DynamicImage::ImageRgba8(RgbaImage::new(2, 2)))
        }

        fn text_fragments(&self, page: usize) -> Result<Vec<String>, ExtractError> {
            self.calls.lock().unwrap().push(format!("text {page}"));
            Ok(vec![format!("p{page}")])
        }
    }

    impl DocumentBackend for Recording {
        fn with_document(
            &self,
            _bytes: &[u8],
            visit: &mut dyn FnMut(&dyn Document) -> Result<(), PipelineError>,
        ) -> Result<(), PipelineError> {
            visit(self)
        }
    }

    #[test]
    fn pages_are_rendered_then_read_in_ascending_order() {
        let doc = Recording::new(10);
        let (stage, result) = process_pages(&doc, b"%PDF", "2", "4", 1.0, None);
        result.unwrap();

        assert_eq!(
            *doc.calls.lock().unwrap(),
            vec!["render 2", "text 2", "render 3", "text 3", "render 4", "text 4"]
        );
        assert_eq!(stage.transcript.render(), "Page 2: p2\n\nPage 3: p3\n\nPage 4: p4");
        let slots: Vec<_> = stage.pages.iter().map(|p| (p.index, p.page_num)).collect();
        assert_eq!(slots, vec![(0, 2), (1, 3), (2, 4)]);
    }

    #[test]
    fn invalid_range_renders_nothing() {
        let doc = Recording::new(5);
        let (stage, result) = process_pages(&doc, b"%PDF", "6", "9", 1.0, None);
        assert!(matches!(
            result,
            Err(PipelineError::Validation(ValidationError::StartBeyondDocument { .. }))
        ));
        assert!(stage.range.is_none());
        assert!(doc.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn failing_page_keeps_earlier_pages_and_stops() {
        let mut doc = Recording::new(5);
        doc.fail_render = Some(3);
        let (stage, result) = process_pages(&doc, b"%PDF", "1", "5", 1.0, None);

        let err = result.unwrap_err();
        assert_eq!(failed_stage(&err), FailedStage::Rendering { page: 3 });
        assert_eq!(stage.pages.len(), 2);
        assert_eq!(stage.transcript.len(), 2);
        assert!(!doc.calls.lock().unwrap().contains(&"render 4".to_string()));
    }

    #[test]
    fn failed_stage_mapping() {
        assert_eq!(
            failed_stage(&PipelineError::OpenFailed {
                detail: "x".into()
            }),
            FailedStage::Opening
        );
        assert_eq!(
            failed_stage(&PipelineError::Extract(ExtractError {
                page: 4,
                detail: "x".into()
            })),
            FailedStage::Rendering { page: 4 }
        );
    }
}
