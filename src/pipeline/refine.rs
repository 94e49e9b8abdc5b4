//! Refinement: revise one post using the context it was generated from.

use crate::error::RefinementError;
use crate::model::{Message, ModelClient, ModelReply, ModelRequest};
use crate::output::GenerationPrompt;
use crate::prompts::{refinement_context, REFINE_USER_PREFIX};
use tracing::{debug, warn};

/// The two-turn request for refining `current_text`.
///
/// A blank `instruction` is treated as absent.
pub fn build_request(
    context: &GenerationPrompt,
    current_text: &str,
    instruction: Option<&str>,
) -> ModelRequest {
    let s = &context.structured;
    let instruction = instruction.map(str::trim).filter(|i| !i.is_empty());
    let system = refinement_context(
        &s.tone,
        &s.post_type,
        &s.audience,
        &s.topic,
        &context.hashtag_directive,
        &context.emoji_directive,
        instruction,
    );
    ModelRequest::Messages(vec![
        Message::system(system),
        Message::user(format!("{REFINE_USER_PREFIX}{current_text}")),
    ])
}

/// Refine `current_text` and return the single revised version, trimmed.
pub async fn refine(
    client: &dyn ModelClient,
    context: &GenerationPrompt,
    current_text: &str,
    instruction: Option<&str>,
) -> Result<String, RefinementError> {
    refine_with_reply(client, context, current_text, instruction)
        .await
        .map(|(text, _)| text)
}

/// As [`refine`], also returning the raw reply for token accounting.
pub(crate) async fn refine_with_reply(
    client: &dyn ModelClient,
    context: &GenerationPrompt,
    current_text: &str,
    instruction: Option<&str>,
) -> Result<(String, ModelReply), RefinementError> {
    let request = build_request(context, current_text, instruction);
    match client.invoke(&request).await {
        Ok(reply) => {
            let refined = reply.content.trim().to_string();
            if refined.is_empty() {
                warn!("Refinement reply was empty");
                return Err(RefinementError::EmptyResponse);
            }
            debug!("Refined post: {} → {} chars", current_text.len(), refined.len());
            Ok((refined, reply))
        }
        Err(e) => {
            warn!("Refinement failed: {}", e);
            Err(RefinementError::from(e))
        }
    }
}
