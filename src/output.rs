//! Result types produced by the workflows.

use crate::error::PostcraftError;
use crate::request::StructuredPost;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A fully specified generation instruction plus the context needed to
/// refine its output later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationPrompt {
    /// The text sent to the model.
    pub instruction: String,
    /// The record the instruction was built from.
    pub structured: StructuredPost,
    pub hashtag_directive: String,
    pub emoji_directive: String,
    pub variation_count: u8,
}

/// Candidate posts in the order the model returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateSet(Vec<String>);

impl CandidateSet {
    pub fn new(posts: Vec<String>) -> Self {
        Self(posts)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Token counts summed over the model calls of one action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn add(&mut self, input: u64, output: u64) {
        self.input_tokens += input;
        self.output_tokens += output;
    }
}

/// Everything one "Generate" action produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub structured: StructuredPost,
    pub prompt: GenerationPrompt,
    pub candidates: CandidateSet,
    /// Non-fatal input adjustments, already phrased for the user.
    pub warnings: Vec<String>,
    pub usage: TokenUsage,
}

/// Write `bytes` to `path` through a sibling temp file and a rename, so a
/// reader never sees a half-written file.
pub async fn write_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> Result<(), PostcraftError> {
    let path = path.as_ref();
    let write_err = |source| PostcraftError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}
