//! Error types for the postcraft library.
//!
//! The errors are split by the stage that raises them so each caller can
//! react to exactly the failures its stage can produce:
//!
//! * [`ValidationError`] — user input rejected before any request is sent.
//!   `OutOfRange` is also used as a non-fatal warning when a value is
//!   clamped to its default.
//! * [`ExtractionError`] — the model's structured-field answer could not be
//!   trusted. Generation is aborted; the user retries.
//! * [`RefinementError`] — a refine call failed. The session keeps its
//!   working text.
//! * [`SessionError`] — an operation was attempted in the wrong selection
//!   phase.
//! * [`PostcraftError`] — what the top-level workflow functions return.
//!   Every stage error converts into it with `?`.
//!
//! Response *parsing* never produces an error: unparseable model output
//! degrades to a single candidate instead.

use crate::model::{ModelError, ModelErrorKind};
use crate::session::SelectionPhase;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the top-level postcraft workflows.
#[derive(Debug, Error)]
pub enum PostcraftError {
    // ── Stage errors ──────────────────────────────────────────────────────
    /// Required input missing or malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The structured-field extraction step failed.
    #[error("Couldn't parse inputs, please simplify and try again.\n{0}")]
    Extraction(#[from] ExtractionError),

    /// A refinement request failed.
    #[error(transparent)]
    Refinement(#[from] RefinementError),

    /// Invalid session transition.
    #[error(transparent)]
    Session(#[from] SessionError),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Model API returned HTTP 429 or an equivalent throttling signal.
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimitExceeded { detail: String },

    /// Any other failure of the model call.
    #[error("An error occurred while calling the model. Please try again later.\n{detail}")]
    UpstreamFailure { detail: String },

    /// The model answered, but with nothing usable.
    #[error("The model returned an empty response for the {stage}")]
    EmptyResponse { stage: &'static str },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes were read, but they are not a PDF.
    #[error("Input is not a valid PDF: '{source_name}'\nFirst bytes: {magic:?}")]
    NotAPdf { source_name: String, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The PDF could not be parsed or its text could not be read.
    #[error("Could not read text from PDF: {detail}")]
    PdfReadFailed { detail: String },

    /// The document layout engine failed to produce bytes.
    #[error("Failed to lay out document: {detail}")]
    LayoutFailed { detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PostcraftError {
    /// Map a failed generation-style call to the user-facing variant.
    ///
    /// Throttling gets its own message; everything else is reported as a
    /// generic upstream failure.
    pub fn from_model(err: ModelError) -> Self {
        match err.kind {
            ModelErrorKind::RateLimited => PostcraftError::RateLimitExceeded { detail: err.detail },
            _ => PostcraftError::UpstreamFailure {
                detail: err.to_string(),
            },
        }
    }
}

/// User input rejected (or adjusted) before a request is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The field is empty after trimming whitespace.
    #[error("{field} is required.")]
    MissingRequiredField { field: &'static str },

    /// The value could not be used; `default` was substituted.
    #[error("Please enter a valid {field} ({min}-{max}). Defaulting to {default}.")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: u8,
        max: u8,
        default: u8,
    },
}

/// Failure of the structured-field extraction step.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The reply was not valid JSON.
    #[error("model reply is not valid JSON: {detail}")]
    MalformedResponse { detail: String },

    /// The reply parsed, but is not an object carrying all required keys.
    #[error("model reply is missing required fields: {}", missing.join(", "))]
    IncompleteFields { missing: Vec<String> },

    /// The model call itself failed.
    #[error("extraction request failed: {0}")]
    Upstream(#[from] ModelError),
}

/// Failure of a refine request. Never fatal to the session.
#[derive(Debug, Error)]
pub enum RefinementError {
    /// The provider signalled throttling.
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited { detail: String },

    /// Any other provider failure.
    #[error("An error occurred while refining the post. Please try again later.\n{detail}")]
    Upstream { detail: String },

    /// The model answered with nothing but whitespace.
    #[error("The model returned an empty revision. Your post was kept; please try again.")]
    EmptyResponse,

    /// There is no selected post to refine.
    #[error("No post selected. Generate posts and pick one first.")]
    NothingSelected,
}

impl From<ModelError> for RefinementError {
    fn from(err: ModelError) -> Self {
        match err.kind {
            ModelErrorKind::RateLimited => RefinementError::RateLimited { detail: err.detail },
            _ => RefinementError::Upstream {
                detail: err.to_string(),
            },
        }
    }
}

/// An operation attempted in a selection phase that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// `select` was given an index outside the candidate set.
    #[error("Candidate {index} is out of range ({len} candidates available)")]
    IndexOutOfRange { index: usize, len: usize },

    /// The action is not allowed in the current phase.
    #[error("Cannot {action} while in the {phase:?} phase")]
    InvalidTransition {
        action: &'static str,
        phase: SelectionPhase,
    },

    /// No generation has been run in this session yet.
    #[error("No posts have been generated yet")]
    NoCandidates,
}
