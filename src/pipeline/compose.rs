//! Prompt composition: structured record + modifiers → generation instruction.
//!
//! Pure and infallible; every input has been validated upstream.

use crate::output::GenerationPrompt;
use crate::prompts::{
    exact_hashtags, generation_instruction, INCLUDE_EMOJIS, NO_EMOJIS, NO_HASHTAGS,
    RELEVANT_HASHTAGS,
};
use crate::request::{PostOptions, StructuredPost};

/// Pick the hashtag directive. First match wins:
/// hashtags off → none; explicit list → those plus suggestions; else relevant.
pub fn hashtag_directive(include_hashtags: bool, hashtag_list: Option<&str>) -> String {
    if !include_hashtags {
        return NO_HASHTAGS.to_string();
    }
    match hashtag_list.map(str::trim) {
        Some(list) if !list.is_empty() => exact_hashtags(list),
        _ => RELEVANT_HASHTAGS.to_string(),
    }
}

pub fn emoji_directive(include_emojis: bool) -> &'static str {
    if include_emojis {
        INCLUDE_EMOJIS
    } else {
        NO_EMOJIS
    }
}

/// Build the generation instruction for `structured`.
pub fn compose(structured: &StructuredPost, options: &PostOptions) -> GenerationPrompt {
    let hashtags = hashtag_directive(options.include_hashtags, options.hashtag_list.as_deref());
    let emojis = emoji_directive(options.include_emojis);
    let instruction = generation_instruction(
        options.variation_count,
        &structured.tone,
        &structured.post_type,
        &structured.audience,
        &structured.topic,
        &hashtags,
        emojis,
    );

    GenerationPrompt {
        instruction,
        structured: structured.clone(),
        hashtag_directive: hashtags,
        emoji_directive: emojis.to_string(),
        variation_count: options.variation_count,
    }
}
