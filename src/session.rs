//! Per-session state: the latest generation and the post being worked on.
//!
//! ```text
//!                select            edit / refine          save
//! NoSelection ─────────▶ Selected ──────────────▶ Editing ─────▶ Saved
//!      ▲                    │                        ▲             │
//!      └──── reset/back ────┴────────────────────────┴── edit ─────┘
//! ```
//!
//! A session is owned by exactly one caller and mutated in place; model
//! calls happen one at a time, so every transition is applied in order.

use crate::config::AssistantConfig;
use crate::error::{PostcraftError, RefinementError, SessionError};
use crate::generate::generate_posts;
use crate::model::ModelClient;
use crate::output::{CandidateSet, Generation, TokenUsage};
use crate::pipeline::refine;
use crate::progress::{notify, Stage};
use crate::request::PostRequestFields;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Where the user is in the select → edit → save flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionPhase {
    #[default]
    NoSelection,
    Selected,
    Editing,
    Saved,
}

/// The selected post and its working copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    phase: SelectionPhase,
    selected_post: Option<String>,
    working_text: String,
    saved_final_text: Option<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SelectionPhase {
        self.phase
    }

    /// The candidate as it was when selected.
    pub fn selected_post(&self) -> Option<&str> {
        self.selected_post.as_deref()
    }

    pub fn working_text(&self) -> &str {
        &self.working_text
    }

    pub fn saved_final_text(&self) -> Option<&str> {
        self.saved_final_text.as_deref()
    }

    /// Copy candidate `index` into the selection, replacing any previous one.
    pub fn select(&mut self, candidates: &CandidateSet, index: usize) -> Result<(), SessionError> {
        let post = candidates.get(index).ok_or(SessionError::IndexOutOfRange {
            index,
            len: candidates.len(),
        })?;
        self.selected_post = Some(post.to_string());
        self.working_text = post.to_string();
        self.saved_final_text = None;
        self.phase = SelectionPhase::Selected;
        Ok(())
    }

    /// Replace the working text.
    pub fn edit(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.require_selection("edit")?;
        self.working_text = text.into();
        self.phase = SelectionPhase::Editing;
        Ok(())
    }

    /// Record the working text as final.
    ///
    /// Saving twice without an edit in between is rejected.
    pub fn save(&mut self) -> Result<&str, SessionError> {
        match self.phase {
            SelectionPhase::Selected | SelectionPhase::Editing => {
                self.saved_final_text = Some(self.working_text.clone());
                self.phase = SelectionPhase::Saved;
                Ok(&self.working_text)
            }
            phase => Err(SessionError::InvalidTransition {
                action: "save",
                phase,
            }),
        }
    }

    /// Back to `NoSelection` with every field cleared.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn require_selection(&self, action: &'static str) -> Result<(), SessionError> {
        if self.phase == SelectionPhase::NoSelection {
            return Err(SessionError::InvalidTransition {
                action,
                phase: self.phase,
            });
        }
        Ok(())
    }
}

/// One user's post-writing session.
///
/// Holds the fields of the last successful generation, the generation
/// itself and the selection. A failed generate leaves everything as it was.
#[derive(Debug, Clone, Default)]
pub struct PostSession {
    fields: Option<PostRequestFields>,
    generation: Option<Generation>,
    selection: SelectionState,
    refine_usage: TokenUsage,
}

impl PostSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> Option<&PostRequestFields> {
        self.fields.as_ref()
    }

    pub fn generation(&self) -> Option<&Generation> {
        self.generation.as_ref()
    }

    pub fn candidates(&self) -> Option<&CandidateSet> {
        self.generation.as_ref().map(|g| &g.candidates)
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn phase(&self) -> SelectionPhase {
        self.selection.phase
    }

    /// Tokens spent on generation and every refinement since.
    pub fn usage(&self) -> TokenUsage {
        let mut total = self.refine_usage;
        if let Some(g) = &self.generation {
            total.add(g.usage.input_tokens, g.usage.output_tokens);
        }
        total
    }

    /// Run a generation and make it current.
    ///
    /// On success the previous candidates are replaced and the selection is
    /// reset.
    pub async fn generate(
        &mut self,
        client: &dyn ModelClient,
        fields: PostRequestFields,
        config: &AssistantConfig,
    ) -> Result<&Generation, PostcraftError> {
        let generation = generate_posts(client, &fields, config).await?;
        self.fields = Some(fields);
        self.selection.reset();
        self.refine_usage = TokenUsage::default();
        Ok(self.generation.insert(generation))
    }

    /// Select candidate `index` (0-based).
    pub fn select(&mut self, index: usize) -> Result<&str, SessionError> {
        let candidates = self
            .generation
            .as_ref()
            .map(|g| &g.candidates)
            .ok_or(SessionError::NoCandidates)?;
        self.selection.select(candidates, index)?;
        debug!("Selected candidate {}", index + 1);
        Ok(self.selection.working_text())
    }

    pub fn edit(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.selection.edit(text)
    }

    pub fn save(&mut self) -> Result<&str, SessionError> {
        let saved = self.selection.save()?;
        info!("Saved final post ({} chars)", saved.len());
        Ok(saved)
    }

    /// Refine the working text with the original generation context.
    ///
    /// Success replaces the working text and moves to `Editing`; failure
    /// leaves the selection untouched.
    pub async fn refine(
        &mut self,
        client: &dyn ModelClient,
        instruction: Option<&str>,
        config: &AssistantConfig,
    ) -> Result<&str, RefinementError> {
        let Some(generation) = self.generation.as_ref() else {
            return Err(RefinementError::NothingSelected);
        };
        if self.selection.phase == SelectionPhase::NoSelection {
            return Err(RefinementError::NothingSelected);
        }

        let cb = &config.progress_callback;
        notify(cb, |c| c.on_stage_start(Stage::Refining));
        let result = refine::refine_with_reply(
            client,
            &generation.prompt,
            &self.selection.working_text,
            instruction,
        )
        .await;

        match result {
            Ok((refined, reply)) => {
                notify(cb, |c| c.on_stage_complete(Stage::Refining, reply.content.len()));
                self.refine_usage.add(reply.input_tokens, reply.output_tokens);
                self.selection.working_text = refined;
                self.selection.phase = SelectionPhase::Editing;
                Ok(&self.selection.working_text)
            }
            Err(e) => {
                warn!("Refinement failed, keeping working text: {}", e);
                let msg = e.to_string();
                notify(cb, |c| c.on_stage_error(Stage::Refining, &msg));
                Err(e)
            }
        }
    }

    /// Leave the session: fields, generation and selection are cleared.
    pub fn back(&mut self) {
        *self = Self::default();
    }
}
