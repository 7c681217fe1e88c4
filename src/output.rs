//! Result types produced by a conversion run.

use crate::audio::AudioHandle;
use crate::error::SynthesisError;
use crate::pipeline::range::PageRange;
use crate::pipeline::transcript::Transcript;
use image::DynamicImage;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// One rasterised page, stored at its slot within the run's range.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// 0-based position within the range (`page_num - range.start`).
    pub index: usize,
    /// 1-based page number in the document.
    pub page_num: usize,
    /// The finished surface.
    pub image: DynamicImage,
}

impl RenderedPage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

// Pixels are not serialised; reports carry geometry only.
impl Serialize for RenderedPage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("RenderedPage", 4)?;
        s.serialize_field("index", &self.index)?;
        s.serialize_field("page_num", &self.page_num)?;
        s.serialize_field("width", &self.width())?;
        s.serialize_field("height", &self.height())?;
        s.end()
    }
}

/// Extracted text of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageText {
    pub page_num: usize,
    pub text: String,
}

/// What became of the synthesis step.
#[derive(Debug, Clone, Serialize)]
pub enum AudioOutcome {
    /// Audio was produced and is the store's current handle.
    Published(AudioHandle),
    /// The speech service failed; pages and transcript are still valid.
    Unavailable(SynthesisError),
}

impl AudioOutcome {
    pub fn handle(&self) -> Option<&AudioHandle> {
        match self {
            AudioOutcome::Published(h) => Some(h),
            AudioOutcome::Unavailable(_) => None,
        }
    }

    pub fn error(&self) -> Option<&SynthesisError> {
        match self {
            AudioOutcome::Published(_) => None,
            AudioOutcome::Unavailable(e) => Some(e),
        }
    }

    pub fn is_published(&self) -> bool {
        matches!(self, AudioOutcome::Published(_))
    }
}

/// Stage at which a run stopped without publishing audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailedStage {
    /// The payload was not a PDF.
    Input,
    /// The PDF could not be opened.
    Opening,
    /// The page range was rejected.
    Validating,
    /// A page could not be rendered or its text read.
    Rendering { page: usize },
    /// The speech service did not return audio.
    Synthesizing,
}

/// Lifecycle of a single run.
///
/// `Published` and `Failed` are terminal; every run starts from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RunState {
    #[default]
    Idle,
    Validating,
    Rendering { page: usize },
    Synthesizing,
    Published,
    Failed(FailedStage),
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Published | RunState::Failed(_))
    }
}

/// Summary of a completed run (full or degraded success).
///
/// Rendered pages live in the reader's slots; see
/// [`crate::reader::Reader::pages`].
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Monotonic id of the run within its reader.
    pub run: u64,
    /// Total pages in the document.
    pub page_count: usize,
    /// The validated, clamped range.
    pub range: PageRange,
    /// Labeled page text in ascending page order.
    pub transcript: Transcript,
    /// Published audio, or the reason there is none.
    pub audio: AudioOutcome,
    /// Wall-clock time for the whole run.
    pub total_duration_ms: u64,
    /// Time spent rendering and extracting pages.
    pub render_duration_ms: u64,
    /// Time spent waiting on the speech service.
    pub synthesis_duration_ms: u64,
}

impl RunReport {
    /// Terminal state this report corresponds to.
    pub fn state(&self) -> RunState {
        if self.audio.is_published() {
            RunState::Published
        } else {
            RunState::Failed(FailedStage::Synthesizing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn rendered_page_serialises_geometry_only() {
        let page = RenderedPage {
            index: 1,
            page_num: 4,
            image: DynamicImage::ImageRgba8(RgbaImage::new(30, 20)),
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"index": 1, "page_num": 4, "width": 30, "height": 20})
        );
    }

    #[test]
    fn outcome_accessors() {
        let outcome = AudioOutcome::Unavailable(SynthesisError::Unreachable {
            reason: "dns".into(),
        });
        assert!(!outcome.is_published());
        assert!(outcome.handle().is_none());
        assert!(outcome.error().is_some());
    }

    #[test]
    fn terminal_states() {
        assert!(RunState::Published.is_terminal());
        assert!(RunState::Failed(FailedStage::Opening).is_terminal());
        assert!(!RunState::Rendering { page: 3 }.is_terminal());
        assert_eq!(RunState::default(), RunState::Idle);
    }
}
