//! Configuration for a PDF-to-speech reader.
//!
//! Every knob lives in [`ReaderConfig`], built via its
//! [`ReaderConfigBuilder`] or read from the process environment with
//! [`ReaderConfig::from_env`]. The speech API key is process-wide
//! configuration and is never hard-coded or printed.

use crate::error::PipelineError;
use crate::pipeline::render::DEFAULT_SCALE;
use crate::pipeline::speech::DEFAULT_ENDPOINT;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Environment variable holding the speech API key.
pub const ENV_API_KEY: &str = "PDF2SPEECH_API_KEY";
/// Fallback key variable used by Hugging Face tooling.
pub const ENV_HF_TOKEN: &str = "HF_TOKEN";
/// Environment variable overriding the speech endpoint.
pub const ENV_ENDPOINT: &str = "PDF2SPEECH_ENDPOINT";
/// Environment variable naming an existing pdfium shared library.
pub const ENV_PDFIUM_LIB: &str = "PDFIUM_LIB_PATH";

/// Configuration for a [`crate::reader::Reader`].
///
/// # Example
/// ```rust
/// use pdf2speech::ReaderConfig;
///
/// let config = ReaderConfig::builder()
///     .scale(2.0)
///     .api_key("hf_xxx")
///     .build()
///     .unwrap();
/// assert_eq!(config.scale, 2.0);
/// ```
#[derive(Clone)]
pub struct ReaderConfig {
    /// Magnification applied to every rendered page. Range: 0.1–8.0. Default: 1.5.
    ///
    /// The surface of a US-letter page (612 × 792 pt) at 1.5 is 918 × 1188 px.
    pub scale: f32,

    /// Speech endpoint receiving `POST {"inputs": …}`.
    pub endpoint: String,

    /// Bearer token for the speech endpoint.
    pub api_key: Option<String>,

    /// Timeout for the synthesis request in seconds. Default: 120.
    ///
    /// Hosted models can take a while to warm up; a long transcript can take
    /// longer still.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Path to a pdfium shared library. If None, binds the system library.
    pub pdfium_library: Option<PathBuf>,

    /// Receives per-run and per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            password: None,
            pdfium_library: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ReaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderConfig")
            .field("scale", &self.scale)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_library", &self.pdfium_library)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RunProgressCallback>"),
            )
            .finish()
    }
}

impl ReaderConfig {
    /// Create a new builder for `ReaderConfig`.
    pub fn builder() -> ReaderConfigBuilder {
        ReaderConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults overlaid with `PDF2SPEECH_API_KEY` (or `HF_TOKEN`),
    /// `PDF2SPEECH_ENDPOINT` and `PDFIUM_LIB_PATH`. Empty values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        config.api_key = get(ENV_API_KEY).or_else(|| get(ENV_HF_TOKEN));
        if let Some(endpoint) = get(ENV_ENDPOINT) {
            config.endpoint = endpoint;
        }
        config.pdfium_library = get(ENV_PDFIUM_LIB).map(PathBuf::from);
        config
    }
}

/// Builder for [`ReaderConfig`].
#[derive(Debug)]
pub struct ReaderConfigBuilder {
    config: ReaderConfig,
}

impl ReaderConfigBuilder {
    /// Start from an existing configuration (e.g. [`ReaderConfig::from_env`]).
    pub fn from_config(config: ReaderConfig) -> Self {
        Self { config }
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.config.scale = scale.clamp(0.1, 8.0);
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ReaderConfig, PipelineError> {
        let c = &self.config;
        if !c.scale.is_finite() || c.scale < 0.1 || c.scale > 8.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "scale must be 0.1–8.0, got {}",
                c.scale
            )));
        }
        if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
            return Err(PipelineError::InvalidConfig(format!(
                "speech endpoint must be an HTTP(S) URL, got '{}'",
                c.endpoint
            )));
        }
        Ok(self.config)
    }
}
