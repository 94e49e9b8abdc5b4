//! Resume review: PDF text plus a target role in, written feedback out.

use crate::config::AssistantConfig;
use crate::error::PostcraftError;
use crate::model::{ModelClient, ModelRequest};
use crate::pipeline::input::{check_pdf_magic, resolve_input};
use crate::pipeline::normalize::{redact_names, validate_required, LexiconRecognizer};
use crate::pipeline::pdf_text;
use crate::progress::{notify, Stage};
use crate::prompts::resume_review_prompt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeReviewRequest {
    /// The position the resume targets, e.g. "Data Scientist".
    pub role: String,
    /// Replace person names in the resume text before it is sent.
    pub mask_names: bool,
}

impl ResumeReviewRequest {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            mask_names: false,
        }
    }

    pub fn mask_names(mut self, v: bool) -> Self {
        self.mask_names = v;
        self
    }
}

/// Review the resume in `pdf_bytes` for `request.role`.
///
/// The role is validated before the PDF is touched.
///
/// # Errors
/// - `Validation` when the role is blank
/// - `NotAPdf` / `PdfReadFailed` when the bytes cannot be read
/// - `RateLimitExceeded` / `UpstreamFailure` when the model call fails
/// - `EmptyResponse` when the reply is blank
pub async fn review_resume(
    client: &dyn ModelClient,
    pdf_bytes: Vec<u8>,
    request: &ResumeReviewRequest,
    config: &AssistantConfig,
) -> Result<String, PostcraftError> {
    let role = validate_required("Role", &request.role)?;
    check_pdf_magic("resume", &pdf_bytes)?;

    let mut text = pdf_text::extract_text(pdf_bytes).await?;
    debug!("Resume text: {} chars", text.len());
    if text.is_empty() {
        warn!("No text could be extracted from the resume; the review will say so");
    }
    if request.mask_names {
        text = redact_names(&text, &LexiconRecognizer::default());
    }

    let cb = &config.progress_callback;
    info!("Reviewing resume for role '{}'", role);
    notify(cb, |c| c.on_stage_start(Stage::ResumeReview));
    let prompt = resume_review_prompt(&role, &text);
    let reply = match client.invoke(&ModelRequest::Prompt(prompt)).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Resume review failed: {}", e);
            let msg = e.to_string();
            notify(cb, |c| c.on_stage_error(Stage::ResumeReview, &msg));
            return Err(PostcraftError::from_model(e));
        }
    };

    let feedback = reply.content.trim().to_string();
    if feedback.is_empty() {
        notify(cb, |c| c.on_stage_error(Stage::ResumeReview, "empty response"));
        return Err(PostcraftError::EmptyResponse {
            stage: "resume review",
        });
    }
    notify(cb, |c| c.on_stage_complete(Stage::ResumeReview, feedback.len()));
    Ok(feedback)
}

/// [`review_resume`] for a local path or an HTTP(S) URL.
pub async fn review_resume_from(
    client: &dyn ModelClient,
    input: &str,
    request: &ResumeReviewRequest,
    config: &AssistantConfig,
) -> Result<String, PostcraftError> {
    validate_required("Role", &request.role)?;
    let resolved = resolve_input(input, config.download_timeout_secs).await?;
    debug!("Resolved {} ({} bytes)", resolved.source_name, resolved.bytes.len());
    review_resume(client, resolved.bytes, request, config).await
}
