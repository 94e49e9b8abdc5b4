//! Structured-field extraction.
//!
//! The four loose inputs are sent to the model with a request for a strict
//! JSON object. This is the only place where model output is trusted to be
//! structured, so the reply is validated strictly: every required key must
//! be present, or the whole extraction fails.

use crate::error::ExtractionError;
use crate::model::{ModelClient, ModelReply, ModelRequest};
use crate::pipeline::parse::strip_code_fence;
use crate::prompts::{combine_fields, extraction_prompt};
use crate::request::{PostRequestFields, StructuredPost, STRUCTURED_KEYS};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// The request sent for `fields`.
pub fn build_request(fields: &PostRequestFields) -> ModelRequest {
    let combined = combine_fields(&fields.topic, &fields.post_type, &fields.tone, &fields.audience);
    ModelRequest::Prompt(extraction_prompt(&combined))
}

/// Ask the model to normalise `fields` into a [`StructuredPost`].
///
/// One request, no retry.
pub async fn extract(
    client: &dyn ModelClient,
    fields: &PostRequestFields,
) -> Result<StructuredPost, ExtractionError> {
    extract_with_reply(client, fields).await.map(|(s, _)| s)
}

/// As [`extract`], also returning the raw reply for token accounting.
pub(crate) async fn extract_with_reply(
    client: &dyn ModelClient,
    fields: &PostRequestFields,
) -> Result<(StructuredPost, ModelReply), ExtractionError> {
    let reply = client.invoke(&build_request(fields)).await?;
    debug!("Extraction reply: {} chars", reply.content.len());
    let structured = parse_structured(&reply.content)?;
    Ok((structured, reply))
}

/// Validate an extraction reply.
///
/// Values are copied verbatim; strings stay as-is, other JSON scalars are
/// rendered as their JSON text.
pub fn parse_structured(raw: &str) -> Result<StructuredPost, ExtractionError> {
    let stripped = strip_code_fence(raw);
    let value: Value = serde_json::from_str(&stripped).map_err(|e| {
        warn!("Extraction reply is not JSON: {}", e);
        ExtractionError::MalformedResponse {
            detail: e.to_string(),
        }
    })?;

    let Value::Object(map) = value else {
        return Err(ExtractionError::IncompleteFields {
            missing: STRUCTURED_KEYS.iter().map(|k| k.to_string()).collect(),
        });
    };

    let missing: Vec<String> = STRUCTURED_KEYS
        .iter()
        .filter(|k| matches!(map.get(**k), None | Some(Value::Null)))
        .map(|k| k.to_string())
        .collect();
    if !missing.is_empty() {
        warn!("Extraction reply is missing: {}", missing.join(", "));
        return Err(ExtractionError::IncompleteFields { missing });
    }

    Ok(StructuredPost {
        topic: field(&map, "topic"),
        post_type: field(&map, "post_type"),
        tone: field(&map, "tone"),
        audience: field(&map, "audience"),
    })
}

fn field(map: &Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
