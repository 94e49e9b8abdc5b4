//! # postcraft
//!
//! Draft LinkedIn posts, review resumes and build study cheatsheets with a
//! hosted LLM.
//!
//! The model does the writing. This crate owns everything around it:
//! validating what the user typed, turning it into a precise prompt, making
//! sense of whatever the model sends back, and keeping track of which draft
//! the user picked and how they changed it.
//!
//! ## Post pipeline
//!
//! ```text
//! fields
//!  │
//!  ├─ 1. Normalise  required topic, clamp variation count, mask names
//!  ├─ 2. Extract    model → {topic, post_type, tone, audience} (strict)
//!  ├─ 3. Compose    hashtag / emoji directives + JSON-array instruction
//!  ├─ 4. Generate   model → raw text
//!  ├─ 5. Parse      fence strip + JSON array, fall back to one candidate
//!  └─ 6. Session    select → edit / refine (0..n) → save
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use postcraft::{resolve_client, AssistantConfig, PostRequestFields, PostSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = AssistantConfig::default();
//!     let client = resolve_client(&config)?;
//!
//!     let mut session = PostSession::new();
//!     let fields = PostRequestFields::new("Shipped our first AI agent")
//!         .post_type("announcement")
//!         .tone("excited")
//!         .audience("recruiters")
//!         .variations(2);
//!     session.generate(client.as_ref(), fields, &config).await?;
//!
//!     session.select(0)?;
//!     session.refine(client.as_ref(), Some("make it shorter"), &config).await?;
//!     println!("{}", session.save()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `postcraft` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! postcraft = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cheatsheet;
pub mod config;
pub mod error;
pub mod generate;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod request;
pub mod resume;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cheatsheet::{
    cheatsheet_file_name, generate_cheatsheet, render_cheatsheet_pdf, write_cheatsheet_pdf,
    CheatsheetKind, CheatsheetLength, CheatsheetRequest, Difficulty,
};
pub use config::{AssistantConfig, AssistantConfigBuilder};
pub use error::{ExtractionError, PostcraftError, RefinementError, SessionError, ValidationError};
pub use generate::{generate_posts, generate_posts_with};
pub use model::{
    resolve_client, LlmClient, Message, ModelClient, ModelError, ModelErrorKind, ModelReply,
    ModelRequest, Role,
};
pub use output::{write_atomic, CandidateSet, Generation, GenerationPrompt, TokenUsage};
pub use progress::{NoopProgressCallback, ProgressCallback, Stage, WorkflowProgressCallback};
pub use request::{PostOptions, PostRequestFields, StructuredPost};
pub use resume::{review_resume, review_resume_from, ResumeReviewRequest};
pub use session::{PostSession, SelectionPhase, SelectionState};
