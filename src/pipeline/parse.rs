//! Response parsing: turn raw model text into candidate posts.
//!
//! Models are asked for a bare JSON array but routinely wrap it in a
//! ```` ```json ```` fence, and sometimes ignore the format entirely. The
//! parser strips fences, tries strict JSON, and otherwise falls back to the
//! whole reply as one candidate. It never fails: a user with a non-empty
//! reply always has something to pick.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

// A language tag is only consumed when it ends the opening line, so a
// one-line fence such as "```Post A```" keeps its first word.
static RE_CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(?:[\w+-]*[ \t]*\r?\n|json\b)?\s*([\s\S]*?)\s*```").unwrap()
});

/// Replace every fenced block with its inner text, then trim.
///
/// Text without fences is only trimmed.
pub fn strip_code_fence(raw: &str) -> String {
    RE_CODE_FENCE.replace_all(raw, "${1}").trim().to_string()
}

/// Parse a generation reply into candidate posts.
///
/// * JSON array → its elements in order (strings verbatim, other values as
///   their JSON text);
/// * anything else → the stripped reply as the only candidate;
/// * empty reply → no candidates.
pub fn parse_candidates(raw: &str) -> Vec<String> {
    let stripped = strip_code_fence(raw);
    if stripped.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(&stripped) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Ok(_) => {
            debug!("Reply is JSON but not an array; using it as a single candidate");
            vec![stripped]
        }
        Err(e) => {
            debug!("Reply is not JSON ({}); using it as a single candidate", e);
            vec![stripped]
        }
    }
}
