//! Input resolution: read a user-supplied path or URL into PDF bytes.
//!
//! The bytes are checked for the `%PDF` magic before they are returned so
//! callers get a meaningful error instead of a parser failure deep inside
//! text extraction.

use crate::error::PostcraftError;
use std::path::PathBuf;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF loaded into memory, with a name suitable for messages.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub source_name: String,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to PDF bytes.
///
/// URLs are downloaded with `timeout_secs` as the whole-request limit;
/// anything else is treated as a local path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, PostcraftError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

/// Reject anything that does not start with `%PDF`.
pub fn check_pdf_magic(source_name: &str, bytes: &[u8]) -> Result<(), PostcraftError> {
    if bytes.len() >= 4 && &bytes[..4] == PDF_MAGIC {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    Err(PostcraftError::NotAPdf {
        source_name: source_name.to_string(),
        magic,
    })
}

async fn read_local(path_str: &str) -> Result<ResolvedInput, PostcraftError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(PostcraftError::PermissionDenied { path });
        }
        Err(_) => return Err(PostcraftError::FileNotFound { path }),
    };

    check_pdf_magic(path_str, &bytes)?;
    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(ResolvedInput {
        source_name: path_str.to_string(),
        bytes,
    })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, PostcraftError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PostcraftError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            PostcraftError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            PostcraftError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(PostcraftError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            PostcraftError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            PostcraftError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    let source_name = file_name_from_url(url);
    check_pdf_magic(&source_name, &bytes)?;
    info!("Downloaded {} ({} bytes)", source_name, bytes.len());

    Ok(ResolvedInput {
        source_name,
        bytes: bytes.to_vec(),
    })
}

/// Last path segment of `url` when it looks like a file name.
fn file_name_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn file_name_from_url_path() {
        assert_eq!(file_name_from_url("https://x.org/a/cv.pdf"), "cv.pdf");
        assert_eq!(file_name_from_url("https://x.org/a/"), "downloaded.pdf");
        assert_eq!(file_name_from_url("https://x.org"), "downloaded.pdf");
    }

    #[test]
    fn magic_check() {
        assert!(check_pdf_magic("a", b"%PDF-1.5 ...").is_ok());
        match check_pdf_magic("a", b"PK") {
            Err(PostcraftError::NotAPdf { magic, .. }) => assert_eq!(magic, *b"PK\0\0"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_file() {
        let err = resolve_input("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, PostcraftError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn local_non_pdf_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello world").unwrap();
        let err = resolve_input(f.path().to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, PostcraftError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn local_pdf_read() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.5\n%%EOF").unwrap();
        let r = resolve_input(f.path().to_str().unwrap(), 5).await.unwrap();
        assert!(r.bytes.starts_with(b"%PDF"));
    }
}
