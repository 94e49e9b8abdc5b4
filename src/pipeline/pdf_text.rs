//! PDF text extraction for resume review.
//!
//! lopdf parsing is CPU-bound and synchronous, so the async entry point
//! moves it onto the blocking pool.

use crate::error::PostcraftError;
use lopdf::Document;
use tracing::{debug, info, warn};

/// Text of every page, joined with newlines, in page order.
pub async fn extract_text(bytes: Vec<u8>) -> Result<String, PostcraftError> {
    tokio::task::spawn_blocking(move || extract_text_blocking(&bytes))
        .await
        .map_err(|e| PostcraftError::Internal(format!("Text extraction task panicked: {}", e)))?
}

/// Blocking implementation of [`extract_text`].
pub fn extract_text_blocking(bytes: &[u8]) -> Result<String, PostcraftError> {
    let document = Document::load_mem(bytes).map_err(|e| PostcraftError::PdfReadFailed {
        detail: e.to_string(),
    })?;

    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    info!("PDF loaded: {} pages", pages.len());

    let mut text = String::new();
    for page in pages {
        match document.extract_text(&[page]) {
            Ok(t) => {
                debug!("Page {}: {} chars", page, t.len());
                text.push_str(t.trim_end());
                text.push('\n');
            }
            Err(e) => warn!("Skipping page {}: {}", page, e),
        }
    }

    Ok(text.trim().to_string())
}
