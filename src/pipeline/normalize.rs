//! Input normalisation: required fields, the variation count, name masking.
//!
//! Nothing here talks to the model. Name masking delegates the actual
//! recognition to a [`PersonRecognizer`], so a heavier NER backend can be
//! dropped in without touching the substitution logic.

use crate::config::{DEFAULT_VARIATIONS, MAX_VARIATIONS, MIN_VARIATIONS};
use crate::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Literal substituted for every recognised person name.
pub const PERSON_PLACEHOLDER: &str = "[PERSON]";

// ── Required fields ──────────────────────────────────────────────────────

/// Trim `value`; fail if nothing is left.
pub fn validate_required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingRequiredField { field });
    }
    Ok(trimmed.to_string())
}

// ── Variation count ──────────────────────────────────────────────────────

/// A variation count that is always within bounds, plus the warning to show
/// when the user's value had to be replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariationCount {
    pub value: u8,
    pub warning: Option<ValidationError>,
}

fn out_of_range(value: String) -> VariationCount {
    VariationCount {
        value: DEFAULT_VARIATIONS,
        warning: Some(ValidationError::OutOfRange {
            field: "number of variations",
            value,
            min: MIN_VARIATIONS,
            max: MAX_VARIATIONS,
            default: DEFAULT_VARIATIONS,
        }),
    }
}

/// Parse a user-typed variation count.
///
/// Only plain base-10 digits are accepted (`"+5"` and `"5.0"` are not).
/// Anything unparseable or outside 1–10 yields the default of 3 with an
/// `OutOfRange` warning; the request still goes ahead.
pub fn clamp_variation_count(raw: &str) -> VariationCount {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return out_of_range(trimmed.to_string());
    }
    match trimmed.parse::<u32>() {
        Ok(n) if (MIN_VARIATIONS as u32..=MAX_VARIATIONS as u32).contains(&n) => VariationCount {
            value: n as u8,
            warning: None,
        },
        _ => out_of_range(trimmed.to_string()),
    }
}

/// Same policy for a count that is already numeric.
pub fn clamp_variation_value(n: u8) -> VariationCount {
    if (MIN_VARIATIONS..=MAX_VARIATIONS).contains(&n) {
        VariationCount {
            value: n,
            warning: None,
        }
    } else {
        out_of_range(n.to_string())
    }
}

// ── Name redaction ───────────────────────────────────────────────────────

/// A byte range `[start, end)` of `text` naming a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PersonSpan {
    pub start: usize,
    pub end: usize,
}

/// Named-entity recogniser restricted to person names.
pub trait PersonRecognizer: Send + Sync {
    fn find_person_spans(&self, text: &str) -> Vec<PersonSpan>;
}

/// Replace every person span reported by `recognizer` with
/// [`PERSON_PLACEHOLDER`].
///
/// Spans are sorted, merged when they overlap, and substituted from the last
/// to the first so earlier offsets stay valid. Spans that fall outside the
/// text or split a UTF-8 character are ignored.
pub fn redact_names(text: &str, recognizer: &dyn PersonRecognizer) -> String {
    let mut spans: Vec<PersonSpan> = recognizer
        .find_person_spans(text)
        .into_iter()
        .filter(|s| {
            s.start < s.end
                && s.end <= text.len()
                && text.is_char_boundary(s.start)
                && text.is_char_boundary(s.end)
        })
        .collect();
    if spans.is_empty() {
        return text.to_string();
    }

    spans.sort_unstable();
    let merged = merge_spans(spans);
    debug!("Redacting {} person span(s)", merged.len());

    let mut out = text.to_string();
    for span in merged.iter().rev() {
        out.replace_range(span.start..span.end, PERSON_PLACEHOLDER);
    }
    out
}

fn merge_spans(sorted: Vec<PersonSpan>) -> Vec<PersonSpan> {
    let mut merged: Vec<PersonSpan> = Vec::with_capacity(sorted.len());
    for span in sorted {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}

static RE_CAPITALISED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\p{Lu}[\p{Ll}'’-]*\p{Ll}\b").unwrap());

static RE_HONORIFIC_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:Mr|Mrs|Ms|Miss|Dr|Prof)\.?\s+\p{Lu}\p{Ll}+(?:\s+\p{Lu}\p{Ll}+)?").unwrap()
});

const COMMON_GIVEN_NAMES: &[&str] = &[
    "Aaron", "Adam", "Ahmed", "Aisha", "Alex", "Alice", "Amanda", "Amir", "Amy", "Ana", "Andrew",
    "Anna", "Anthony", "Arjun", "Ben", "Brian", "Carlos", "Charles", "Chen", "Chris", "Daniel",
    "David", "Elena", "Elizabeth", "Emily", "Emma", "Eric", "Fatima", "Grace", "Hannah", "Henry",
    "Isabella", "Jack", "James", "Jane", "Jason", "Jennifer", "Jessica", "John", "Jose", "Joseph",
    "Juan", "Julia", "Karen", "Kevin", "Laura", "Linda", "Lisa", "Luis", "Maria", "Mark", "Mary",
    "Matthew", "Michael", "Mohammed", "Nancy", "Olivia", "Omar", "Patricia", "Paul", "Peter",
    "Priya", "Rahul", "Richard", "Robert", "Sam", "Sarah", "Sophia", "Steven", "Susan", "Thomas",
    "Wei", "William", "Yuki",
];

/// Capitalised words that follow a name in ordinary prose but are never a
/// surname ("Thanks Sam For the help", "Sam And I").
const NOT_SURNAMES: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "are", "as", "at", "because", "before",
    "but", "by", "can", "did", "do", "for", "from", "had", "has", "have", "he", "her", "here",
    "his", "how", "i", "if", "in", "is", "it", "just", "me", "my", "no", "not", "now", "of", "on",
    "or", "our", "she", "so", "thank", "thanks", "that", "the", "their", "then", "there", "they",
    "this", "to", "today", "was", "we", "were", "what", "when", "who", "why", "will", "with",
    "you", "your",
];

/// Lexicon-backed [`PersonRecognizer`].
///
/// A capitalised word found in the lexicon starts a span; an immediately
/// following capitalised word (single space apart) is taken as the surname
/// unless it is a common function word.
/// Honorific forms such as `Dr. Smith` are recognised without the lexicon.
#[derive(Debug, Clone)]
pub struct LexiconRecognizer {
    names: HashSet<String>,
}

impl Default for LexiconRecognizer {
    fn default() -> Self {
        Self::new(COMMON_GIVEN_NAMES.iter().copied())
    }
}

impl LexiconRecognizer {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Add extra names (e.g. colleagues the user mentions often).
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
        self
    }
}

impl PersonRecognizer for LexiconRecognizer {
    fn find_person_spans(&self, text: &str) -> Vec<PersonSpan> {
        let words: Vec<_> = RE_CAPITALISED_WORD.find_iter(text).collect();
        let mut spans = Vec::new();

        let mut i = 0;
        while i < words.len() {
            let w = words[i];
            if !self.names.contains(w.as_str()) {
                i += 1;
                continue;
            }
            let mut end = w.end();
            if let Some(next) = words.get(i + 1) {
                let is_stop = NOT_SURNAMES.contains(&next.as_str().to_lowercase().as_str());
                if &text[end..next.start()] == " " && !is_stop {
                    end = next.end();
                    i += 1;
                }
            }
            spans.push(PersonSpan {
                start: w.start(),
                end,
            });
            i += 1;
        }

        spans.extend(RE_HONORIFIC_NAME.find_iter(text).map(|m| PersonSpan {
            start: m.start(),
            end: m.end(),
        }));
        spans
    }
}
