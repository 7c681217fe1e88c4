//! Remote text-to-speech: one POST per run, raw audio back.
//!
//! The whole transcript goes out in a single request. There is no local
//! length limit and no retry; an oversized or rejected request is reported
//! as [`SynthesisError::RequestFailed`] and the run degrades to "no audio".
//!
//! ## Wire format
//!
//! ```text
//! POST <endpoint>
//! Authorization: Bearer <key>
//! Content-Type: application/json
//!
//! {"inputs": "<transcript>"}
//! ```
//!
//! A 2xx response body is the audio, in whatever format the service emits
//! (FLAC for the default model). It is not validated or transcoded here.

use crate::config::ReaderConfig;
use crate::error::{PipelineError, SynthesisError};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

/// Hosted FastSpeech2 (LJSpeech voice) on the Hugging Face inference API.
pub const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/facebook/fastspeech2-en-ljspeech";

/// Error bodies longer than this are cut before being reported.
const MAX_ERROR_BODY: usize = 200;

/// Synthesised audio exactly as the service returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    /// The response `Content-Type`, if any.
    pub content_type: Option<String>,
}

#[derive(Serialize)]
struct SynthesisRequest<'a> {
    inputs: &'a str,
}

/// HTTP client for the speech endpoint.
#[derive(Clone)]
pub struct SpeechClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl fmt::Debug for SpeechClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl SpeechClient {
    /// Build a client for `endpoint`; requests time out after `timeout_secs`.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, PipelineError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PipelineError::Internal(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn from_config(config: &ReaderConfig) -> Result<Self, PipelineError> {
        Self::new(
            config.endpoint.clone(),
            config.api_key.clone(),
            config.api_timeout_secs,
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `text` for synthesis and return the audio body.
    pub async fn synthesize(&self, text: &str) -> Result<AudioPayload, SynthesisError> {
        info!(
            "Requesting speech for {} chars from {}",
            text.len(),
            self.endpoint
        );

        let mut request = self
            .http
            .post(&self.endpoint)
            .json(&SynthesisRequest { inputs: text });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SynthesisError::Unreachable {
                reason: describe_transport_error(&e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::RequestFailed {
                status: status.as_u16(),
                body: truncate(body.trim(), MAX_ERROR_BODY),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Unreachable {
                reason: describe_transport_error(&e),
            })?;

        debug!(
            "Speech response: {} bytes ({})",
            bytes.len(),
            content_type.as_deref().unwrap_or("no content-type")
        );

        Ok(AudioPayload {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out ({})", e)
    } else if e.is_connect() {
        format!("connection failed ({})", e)
    } else {
        e.to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}\u{2026}", &s[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, key: Option<&str>) -> SpeechClient {
        SpeechClient::new(
            format!("{}/tts", server.uri()),
            key.map(str::to_string),
            5,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn posts_json_inputs_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tts"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(serde_json::json!({"inputs": "Page 1: hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8, 2, 3], "audio/flac"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("secret"));
        let audio = client.synthesize("Page 1: hello").await.unwrap();
        assert_eq!(audio.bytes, vec![1, 2, 3]);
        assert_eq!(audio.content_type.as_deref(), Some("audio/flac"));
    }

    #[tokio::test]
    async fn no_authorization_header_without_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![9u8], "audio/wav"))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        client.synthesize("x").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("k"));
        let err = client.synthesize("text").await.unwrap_err();
        assert_eq!(
            err,
            SynthesisError::RequestFailed {
                status: 500,
                body: "model overloaded".into()
            }
        );
    }

    #[tokio::test]
    async fn empty_success_body_is_still_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let audio = client.synthesize("").await.unwrap();
        assert!(audio.bytes.is_empty());
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        // Port 1 is reserved and nothing listens there.
        let client = SpeechClient::new("http://127.0.0.1:1/tts", None, 2).unwrap();
        let err = client.synthesize("text").await.unwrap_err();
        assert!(
            matches!(err, SynthesisError::Unreachable { .. }),
            "got: {err:?}"
        );
    }

    #[test]
    fn debug_redacts_key() {
        let client = SpeechClient::new(DEFAULT_ENDPOINT, Some("hf_secret".into()), 5).unwrap();
        let dbg = format!("{:?}", client);
        assert!(!dbg.contains("hf_secret"));
        assert!(dbg.contains("redacted"));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        let long = "é".repeat(150);
        let cut = truncate(&long, 201);
        assert!(cut.ends_with('\u{2026}'));
        assert!(cut.len() <= 201 + '\u{2026}'.len_utf8());
    }
}
