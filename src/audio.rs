//! Ownership of the synthesised audio between runs.
//!
//! An [`AudioStore`] holds at most one current [`AudioHandle`]. Each payload
//! is written to a file inside a store-owned temporary directory and exposed
//! as a `file://` URL that any audio player can open. Publishing a new
//! payload releases the previous one first, so repeated runs never pile up
//! files; dropping the store removes the directory and everything in it.

use crate::error::PipelineError;
use crate::pipeline::speech::AudioPayload;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

/// A player-consumable reference to published audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioHandle {
    /// Store-assigned, increasing per publish.
    pub id: u64,
    /// `file://` URL of the audio file.
    pub resource_ref: String,
    /// Size of the payload in bytes.
    pub payload_size: usize,
    /// Media type reported by the speech service.
    pub content_type: Option<String>,
    #[serde(skip)]
    path: PathBuf,
}

impl AudioHandle {
    /// Local path of the audio file while the handle is live.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Owner of the current audio resource.
#[derive(Debug)]
pub struct AudioStore {
    dir: TempDir,
    current: Option<AudioHandle>,
    next_id: u64,
}

impl AudioStore {
    /// Create a store backed by a fresh temporary directory.
    pub fn new() -> Result<Self, PipelineError> {
        let dir = tempfile::Builder::new()
            .prefix("pdf2speech-")
            .tempdir()
            .map_err(|e| PipelineError::Internal(format!("audio store: {}", e)))?;
        Ok(Self {
            dir,
            current: None,
            next_id: 1,
        })
    }

    /// Make `payload` the current audio, releasing the previous handle.
    ///
    /// Empty payloads are published like any other; whether they play is
    /// up to the player.
    pub fn publish(&mut self, payload: &AudioPayload) -> Result<AudioHandle, PipelineError> {
        self.release_current();

        let id = self.next_id;
        self.next_id += 1;

        let ext = extension_for(payload.content_type.as_deref());
        let path = self.dir.path().join(format!("audio-{:04}.{}", id, ext));
        std::fs::write(&path, &payload.bytes).map_err(|e| PipelineError::AudioWriteFailed {
            path: path.clone(),
            source: e,
        })?;

        let resource_ref = reqwest::Url::from_file_path(&path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| path.display().to_string());

        let handle = AudioHandle {
            id,
            resource_ref,
            payload_size: payload.bytes.len(),
            content_type: payload.content_type.clone(),
            path,
        };
        debug!(
            "Published audio {} ({} bytes) at {}",
            handle.id, handle.payload_size, handle.resource_ref
        );

        self.current = Some(handle.clone());
        Ok(handle)
    }

    /// Release `handle` if it is the current one. Returns whether anything
    /// was released.
    pub fn release(&mut self, handle: &AudioHandle) -> bool {
        match self.current {
            Some(ref current) if current.id == handle.id => self.release_current(),
            _ => false,
        }
    }

    /// Release whatever handle is current.
    pub fn release_current(&mut self) -> bool {
        let Some(handle) = self.current.take() else {
            return false;
        };
        if let Err(e) = std::fs::remove_file(&handle.path) {
            warn!("Could not remove audio {}: {}", handle.path.display(), e);
        }
        debug!("Released audio {}", handle.id);
        true
    }

    pub fn current(&self) -> Option<&AudioHandle> {
        self.current.as_ref()
    }

    /// Number of audio files currently held on disk.
    pub fn live_count(&self) -> usize {
        std::fs::read_dir(self.dir.path())
            .map(|entries| entries.filter_map(Result::ok).count())
            .unwrap_or(0)
    }

    /// Copy the current audio to `dest`. Returns the number of bytes copied,
    /// or `None` when there is no current audio.
    pub fn save_current(&self, dest: &Path) -> Result<Option<u64>, PipelineError> {
        let Some(ref handle) = self.current else {
            return Ok(None);
        };
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PipelineError::AudioWriteFailed {
                path: dest.to_path_buf(),
                source: e,
            })?;
        }
        let n = std::fs::copy(&handle.path, dest).map_err(|e| PipelineError::AudioWriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;
        Ok(Some(n))
    }
}

/// File extension for a speech-service media type.
pub fn extension_for(content_type: Option<&str>) -> &'static str {
    let mime = content_type
        .and_then(|c| c.split(';').next())
        .map(|c| c.trim().to_ascii_lowercase());
    match mime.as_deref() {
        Some("audio/flac") | Some("audio/x-flac") => "flac",
        Some("audio/wav") | Some("audio/x-wav") | Some("audio/wave") => "wav",
        Some("audio/mpeg") | Some("audio/mp3") => "mp3",
        Some("audio/ogg") => "ogg",
        Some("audio/webm") => "webm",
        _ => "bin",
    }
}
