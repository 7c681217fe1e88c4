//! Input resolution: turn a user-supplied path or URL into PDF bytes.
//!
//! pdfium opens documents straight from a byte slice, so nothing is staged
//! on disk. Every payload, local or downloaded, must carry the `%PDF`
//! signature before it is handed to the document backend.

use crate::error::PipelineError;
use reqwest::header::CONTENT_TYPE;
use std::path::PathBuf;
use tracing::{debug, info};

/// Leading bytes of every PDF file.
pub const PDF_SIGNATURE: &[u8] = b"%PDF";

/// Media type a server should report for a PDF.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Reject payloads that are not PDFs.
pub fn check_signature(bytes: &[u8]) -> Result<(), PipelineError> {
    if bytes.starts_with(PDF_SIGNATURE) {
        Ok(())
    } else {
        Err(PipelineError::NotAPdf {
            magic: bytes.iter().take(PDF_SIGNATURE.len()).copied().collect(),
        })
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Read the PDF named by `input`: a local path or an HTTP(S) URL.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<Vec<u8>, PipelineError> {
    let bytes = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };
    check_signature(&bytes)?;
    Ok(bytes)
}

async fn read_local(path_str: &str) -> Result<Vec<u8>, PipelineError> {
    let path = PathBuf::from(path_str);

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(PipelineError::PermissionDenied { path })
        }
        Err(_) => Err(PipelineError::FileNotFound { path }),
    }
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, PipelineError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PipelineError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            PipelineError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            PipelineError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(PipelineError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
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
        .map_err(|e| PipelineError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    // Many servers label PDFs as octet-stream; the signature check that
    // follows is what decides.
    if let Some(ct) = content_type.as_deref() {
        if !ct.starts_with(PDF_MEDIA_TYPE) {
            debug!("Server reported '{}' for {}", ct, url);
        }
    }

    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn signature_check() {
        assert!(check_signature(b"%PDF-1.7\n...").is_ok());
        match check_signature(b"PK\x03\x04zip") {
            Err(PipelineError::NotAPdf { magic }) => assert_eq!(magic, b"PK\x03\x04"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
        assert!(matches!(
            check_signature(b""),
            Err(PipelineError::NotAPdf { .. })
        ));
    }

    #[tokio::test]
    async fn local_file_is_read_and_checked() {
        let mut pdf = tempfile::NamedTempFile::new().unwrap();
        pdf.write_all(b"%PDF-1.4 body").unwrap();
        let bytes = resolve_input(pdf.path().to_str().unwrap(), 5)
            .await
            .unwrap();
        assert_eq!(bytes, b"%PDF-1.4 body");

        let mut txt = tempfile::NamedTempFile::new().unwrap();
        txt.write_all(b"hello").unwrap();
        let err = resolve_input(txt.path().to_str().unwrap(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = resolve_input("/definitely/not/here.pdf", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn url_is_downloaded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.5".to_vec(), PDF_MEDIA_TYPE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let bytes = resolve_input(&format!("{}/doc.pdf", server.uri()), 5)
            .await
            .unwrap();
        assert_eq!(bytes, b"%PDF-1.5");

        let err = resolve_input(&format!("{}/gone.pdf", server.uri()), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::DownloadFailed { .. }), "got: {err:?}");
    }
}
