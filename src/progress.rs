//! Progress-callback trait for workflow stage events.
//!
//! Inject an [`Arc<dyn WorkflowProgressCallback>`] via
//! [`crate::config::AssistantConfigBuilder::progress_callback`] to be told
//! when each model-backed stage starts and finishes. The CLI uses it to
//! drive a spinner; a UI could forward the events anywhere else.
//!
//! # Example
//!
//! ```rust
//! use postcraft::{AssistantConfig, Stage, WorkflowProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl WorkflowProgressCallback for CountingCallback {
//!     fn on_stage_complete(&self, stage: Stage, output_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage} done ({output_len} chars)");
//!     }
//! }
//!
//! let config = AssistantConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { completed: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// A model-backed step of one of the workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Structured-field extraction.
    Extracting,
    /// Post candidate generation.
    Generating,
    /// Refining the selected post.
    Refining,
    /// Cheatsheet generation.
    Cheatsheet,
    /// Resume feedback.
    ResumeReview,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Extracting => "Extracting inputs",
            Stage::Generating => "Generating posts",
            Stage::Refining => "Refining post",
            Stage::Cheatsheet => "Generating cheatsheet",
            Stage::ResumeReview => "Generating feedback",
        };
        f.write_str(s)
    }
}

/// Called by the workflows as each stage runs.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait WorkflowProgressCallback: Send + Sync {
    /// Called just before the model request for `stage` is sent.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when `stage` produced a result.
    ///
    /// `output_len` is the byte length of the model's reply.
    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let _ = (stage, output_len);
    }

    /// Called when `stage` failed.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }

    /// Called for non-fatal input adjustments (e.g. a clamped count).
    fn on_warning(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl WorkflowProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AssistantConfig`].
pub type ProgressCallback = Arc<dyn WorkflowProgressCallback>;

/// Fire `f` on the configured callback, if any.
pub(crate) fn notify(cb: &Option<ProgressCallback>, f: impl FnOnce(&dyn WorkflowProgressCallback)) {
    if let Some(ref cb) = cb {
        f(cb.as_ref());
    }
}
