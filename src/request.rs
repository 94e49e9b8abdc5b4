//! Request-side data: what the user typed and what extraction made of it.

use crate::config::DEFAULT_VARIATIONS;
use crate::error::ValidationError;
use crate::pipeline::normalize::clamp_variation_count;
use serde::{Deserialize, Serialize};

/// Raw user input for one "Generate" action.
///
/// Only `topic` is required; the other free-form fields may be empty and
/// are left to the extraction step to interpret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRequestFields {
    pub topic: String,
    pub post_type: String,
    pub tone: String,
    pub audience: String,
    pub include_hashtags: bool,
    /// Tags the user wants verbatim, e.g. `#AI #CareerGrowth`.
    pub hashtag_list: Option<String>,
    pub include_emojis: bool,
    /// Number of candidates to request, 1–10.
    pub variation_count: u8,
    /// Replace person names with `[PERSON]` before anything is sent.
    pub mask_names: bool,
}

impl Default for PostRequestFields {
    fn default() -> Self {
        Self {
            topic: String::new(),
            post_type: String::new(),
            tone: String::new(),
            audience: String::new(),
            include_hashtags: false,
            hashtag_list: None,
            include_emojis: false,
            variation_count: DEFAULT_VARIATIONS,
            mask_names: false,
        }
    }
}

impl PostRequestFields {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }

    pub fn post_type(mut self, v: impl Into<String>) -> Self {
        self.post_type = v.into();
        self
    }

    pub fn tone(mut self, v: impl Into<String>) -> Self {
        self.tone = v.into();
        self
    }

    pub fn audience(mut self, v: impl Into<String>) -> Self {
        self.audience = v.into();
        self
    }

    pub fn hashtags(mut self, v: bool) -> Self {
        self.include_hashtags = v;
        self
    }

    /// Tags to include verbatim. Only used when hashtags are enabled.
    pub fn hashtag_list(mut self, list: impl Into<String>) -> Self {
        self.hashtag_list = Some(list.into());
        self
    }

    pub fn emojis(mut self, v: bool) -> Self {
        self.include_emojis = v;
        self
    }

    pub fn variations(mut self, n: u8) -> Self {
        self.variation_count = n;
        self
    }

    /// Set the count from raw user text, clamping as needed.
    ///
    /// The returned warning is `Some` when the default was substituted.
    pub fn variations_from_str(mut self, raw: &str) -> (Self, Option<ValidationError>) {
        let count = clamp_variation_count(raw);
        self.variation_count = count.value;
        (self, count.warning)
    }

    pub fn mask_names(mut self, v: bool) -> Self {
        self.mask_names = v;
        self
    }

    /// The generation modifiers carried alongside the structured record.
    pub fn options(&self) -> PostOptions {
        PostOptions {
            include_hashtags: self.include_hashtags,
            hashtag_list: self.hashtag_list.clone(),
            include_emojis: self.include_emojis,
            variation_count: self.variation_count,
        }
    }
}

/// Boolean/optional modifiers for the prompt composer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostOptions {
    pub include_hashtags: bool,
    pub hashtag_list: Option<String>,
    pub include_emojis: bool,
    pub variation_count: u8,
}

/// The canonical record produced by structured-field extraction.
///
/// Either all four fields came back from the model or extraction failed;
/// there are no partial records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredPost {
    pub topic: String,
    pub post_type: String,
    pub tone: String,
    pub audience: String,
}

/// JSON keys the extraction reply must carry.
pub const STRUCTURED_KEYS: [&str; 4] = ["topic", "post_type", "tone", "audience"];
