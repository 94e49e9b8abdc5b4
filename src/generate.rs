//! The "Generate" action: raw fields in, candidate posts out.
//!
//! Two model calls, strictly in order: structured-field extraction, then
//! generation. Validation problems that can be recovered from (an
//! out-of-range variation count) become warnings; everything else aborts
//! the action before or at the failing call. There are no retries.

use crate::config::AssistantConfig;
use crate::error::PostcraftError;
use crate::model::{ModelClient, ModelRequest};
use crate::output::{CandidateSet, Generation, TokenUsage};
use crate::pipeline::normalize::{
    clamp_variation_value, redact_names, validate_required, LexiconRecognizer, PersonRecognizer,
};
use crate::pipeline::{compose, extract, parse};
use crate::progress::{notify, Stage};
use crate::request::PostRequestFields;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Generate candidate posts for `fields`.
///
/// Name masking, when requested, uses the built-in [`LexiconRecognizer`];
/// see [`generate_posts_with`] to supply another recogniser.
///
/// # Errors
/// - `Validation` when the topic is blank (no request is sent)
/// - `Extraction` when the structured-field step fails
/// - `RateLimitExceeded` / `UpstreamFailure` when the generation call fails
/// - `EmptyResponse` when the model's reply holds no candidates
pub async fn generate_posts(
    client: &dyn ModelClient,
    fields: &PostRequestFields,
    config: &AssistantConfig,
) -> Result<Generation, PostcraftError> {
    generate_posts_with(client, fields, config, &LexiconRecognizer::default()).await
}

/// [`generate_posts`] with an explicit person-name recogniser.
pub async fn generate_posts_with(
    client: &dyn ModelClient,
    fields: &PostRequestFields,
    config: &AssistantConfig,
    recognizer: &dyn PersonRecognizer,
) -> Result<Generation, PostcraftError> {
    let start = Instant::now();
    let cb = &config.progress_callback;

    // ── Step 1: Normalise input ──────────────────────────────────────────
    let topic = validate_required("Topic", &fields.topic)?;

    let mut warnings = Vec::new();
    let count = clamp_variation_value(fields.variation_count);
    if let Some(w) = count.warning {
        let msg = w.to_string();
        warn!("{}", msg);
        notify(cb, |c| c.on_warning(&msg));
        warnings.push(msg);
    }

    let mut working = fields.clone();
    working.topic = topic;
    working.variation_count = count.value;
    if working.mask_names {
        working.topic = redact_names(&working.topic, recognizer);
        working.post_type = redact_names(&working.post_type, recognizer);
        working.tone = redact_names(&working.tone, recognizer);
        working.audience = redact_names(&working.audience, recognizer);
        debug!("Masked person names in request fields");
    }

    info!("Generating {} post variation(s)", working.variation_count);
    let mut usage = TokenUsage::default();

    // ── Step 2: Extract structured fields ────────────────────────────────
    notify(cb, |c| c.on_stage_start(Stage::Extracting));
    let structured = match extract::extract_with_reply(client, &working).await {
        Ok((structured, reply)) => {
            usage.add(reply.input_tokens, reply.output_tokens);
            notify(cb, |c| c.on_stage_complete(Stage::Extracting, reply.content.len()));
            structured
        }
        Err(e) => {
            warn!("Extraction failed: {}", e);
            let msg = e.to_string();
            notify(cb, |c| c.on_stage_error(Stage::Extracting, &msg));
            return Err(PostcraftError::Extraction(e));
        }
    };

    // ── Step 3: Compose the generation prompt ────────────────────────────
    let prompt = compose::compose(&structured, &working.options());
    debug!("Generation prompt: {} chars", prompt.instruction.len());

    // ── Step 4: Generate ─────────────────────────────────────────────────
    notify(cb, |c| c.on_stage_start(Stage::Generating));
    let reply = match client.invoke(&ModelRequest::Prompt(prompt.instruction.clone())).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Generation failed: {}", e);
            let msg = e.to_string();
            notify(cb, |c| c.on_stage_error(Stage::Generating, &msg));
            return Err(PostcraftError::from_model(e));
        }
    };
    usage.add(reply.input_tokens, reply.output_tokens);

    // ── Step 5: Parse candidates ─────────────────────────────────────────
    let mut posts = parse::parse_candidates(&reply.content);
    if posts.is_empty() {
        notify(cb, |c| c.on_stage_error(Stage::Generating, "empty response"));
        return Err(PostcraftError::EmptyResponse {
            stage: "post generation",
        });
    }
    let requested = usize::from(prompt.variation_count);
    if posts.len() > requested {
        warn!(
            "Model returned {} posts, {} requested; dropping the surplus",
            posts.len(),
            requested
        );
        posts.truncate(requested);
    }
    notify(cb, |c| c.on_stage_complete(Stage::Generating, reply.content.len()));

    info!(
        "Generated {} candidate(s) in {}ms ({} input / {} output tokens)",
        posts.len(),
        start.elapsed().as_millis(),
        usage.input_tokens,
        usage.output_tokens
    );

    Ok(Generation {
        structured,
        prompt,
        candidates: CandidateSet::new(posts),
        warnings,
        usage,
    })
}
