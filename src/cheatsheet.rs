//! Study cheatsheets: one model call for markdown, then a PDF.

use crate::config::AssistantConfig;
use crate::error::PostcraftError;
use crate::model::{ModelClient, ModelRequest};
use crate::output::write_atomic;
use crate::pipeline::normalize::validate_required;
use crate::pipeline::render::{render_document, PdfLayout};
use crate::progress::{notify, Stage};
use crate::prompts::cheatsheet_prompt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Lower-case, with `-` and `_` read as spaces, for lenient parsing.
fn normalise_label(s: &str) -> String {
    s.trim().to_lowercase().replace(['-', '_'], " ")
}

macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal, $short:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The label shown to users.
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = String;

            /// Accepts the label or its short form, in any case.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalise_label(s);
                $(
                    if wanted == normalise_label($label) || wanted == $short {
                        return Ok($name::$variant);
                    }
                )+
                let choices: Vec<&str> = vec![$($short),+];
                Err(format!("unknown value '{}', expected one of: {}", s, choices.join(", ")))
            }
        }
    };
}

labelled_enum!(
    /// How much prior knowledge the cheatsheet assumes.
    Difficulty {
        Beginner => "Beginner", "beginner",
        Intermediate => "Intermediate", "intermediate",
        Advanced => "Advanced", "advanced",
    }
);

labelled_enum!(
    /// The shape of the cheatsheet.
    CheatsheetKind {
        QuickReference => "Quick Reference", "quick reference",
        FormulaSheet => "Formula Sheet", "formula sheet",
        ConceptOverview => "Concept Overview", "concept overview",
        StepByStepGuide => "Step-by-Step Guide", "step by step guide",
        ComprehensiveReview => "Comprehensive Review", "comprehensive review",
    }
);

labelled_enum!(
    /// Target length in pages.
    CheatsheetLength {
        Short => "Short (1-2 pages)", "short",
        Medium => "Medium (2-4 pages)", "medium",
        Long => "Long (4-6 pages)", "long",
    }
);

/// Input for one cheatsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheatsheetRequest {
    pub topic: String,
    pub difficulty: Difficulty,
    pub kind: CheatsheetKind,
    pub length: CheatsheetLength,
    /// Free-text focus, e.g. "interview questions".
    pub custom_requirements: Option<String>,
}

impl CheatsheetRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }

    pub fn difficulty(mut self, d: Difficulty) -> Self {
        self.difficulty = d;
        self
    }

    pub fn kind(mut self, k: CheatsheetKind) -> Self {
        self.kind = k;
        self
    }

    pub fn length(mut self, l: CheatsheetLength) -> Self {
        self.length = l;
        self
    }

    pub fn custom_requirements(mut self, text: impl Into<String>) -> Self {
        self.custom_requirements = Some(text.into());
        self
    }

    /// The prompt for this request, with the topic already trimmed.
    pub fn prompt(&self, topic: &str) -> String {
        let custom = self
            .custom_requirements
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        cheatsheet_prompt(
            topic,
            &self.difficulty.label().to_lowercase(),
            &self.kind.label().to_lowercase(),
            &self.length.label().to_lowercase(),
            custom,
        )
    }
}

/// Generate cheatsheet markdown for `request`.
///
/// # Errors
/// - `Validation` when the topic is blank
/// - `RateLimitExceeded` / `UpstreamFailure` when the model call fails
/// - `EmptyResponse` when the reply is blank
pub async fn generate_cheatsheet(
    client: &dyn ModelClient,
    request: &CheatsheetRequest,
    config: &AssistantConfig,
) -> Result<String, PostcraftError> {
    let topic = validate_required("Topic", &request.topic)?;
    let cb = &config.progress_callback;
    info!(
        "Generating {} {} cheatsheet for '{}'",
        request.difficulty, request.kind, topic
    );

    notify(cb, |c| c.on_stage_start(Stage::Cheatsheet));
    let reply = match client.invoke(&ModelRequest::Prompt(request.prompt(&topic))).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Cheatsheet generation failed: {}", e);
            let msg = e.to_string();
            notify(cb, |c| c.on_stage_error(Stage::Cheatsheet, &msg));
            return Err(PostcraftError::from_model(e));
        }
    };

    let markdown = reply.content.trim().to_string();
    if markdown.is_empty() {
        notify(cb, |c| c.on_stage_error(Stage::Cheatsheet, "empty response"));
        return Err(PostcraftError::EmptyResponse { stage: "cheatsheet" });
    }
    notify(cb, |c| c.on_stage_complete(Stage::Cheatsheet, markdown.len()));
    Ok(markdown)
}

/// Download name for a cheatsheet on `topic`: spaces become underscores.
pub fn cheatsheet_file_name(topic: &str) -> String {
    format!("{}.pdf", topic.trim().replace(' ', "_"))
}

/// Typeset `markdown` as an A4 PDF off the async runtime.
pub async fn render_cheatsheet_pdf(markdown: &str) -> Result<Vec<u8>, PostcraftError> {
    let markdown = markdown.to_string();
    tokio::task::spawn_blocking(move || render_document(&markdown, &PdfLayout::default()))
        .await
        .map_err(|e| PostcraftError::Internal(format!("Layout task panicked: {}", e)))?
}

/// Render `markdown` and write it to `path`.
pub async fn write_cheatsheet_pdf(markdown: &str, path: impl AsRef<Path>) -> Result<usize, PostcraftError> {
    let bytes = render_cheatsheet_pdf(markdown).await?;
    write_atomic(path.as_ref(), &bytes).await?;
    info!("Wrote {} ({} bytes)", path.as_ref().display(), bytes.len());
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_choices() {
        let r = CheatsheetRequest::new("x");
        assert_eq!(r.difficulty, Difficulty::Beginner);
        assert_eq!(r.kind, CheatsheetKind::QuickReference);
        assert_eq!(r.length, CheatsheetLength::Short);
    }

    #[test]
    fn parses_labels_leniently() {
        assert_eq!("Advanced".parse::<Difficulty>().unwrap(), Difficulty::Advanced);
        assert_eq!(
            "step-by-step-guide".parse::<CheatsheetKind>().unwrap(),
            CheatsheetKind::StepByStepGuide
        );
        assert_eq!(
            "Step-by-Step Guide".parse::<CheatsheetKind>().unwrap(),
            CheatsheetKind::StepByStepGuide
        );
        assert_eq!("medium".parse::<CheatsheetLength>().unwrap(), CheatsheetLength::Medium);
        assert_eq!(
            "Long (4-6 pages)".parse::<CheatsheetLength>().unwrap(),
            CheatsheetLength::Long
        );
        assert!("expert".parse::<Difficulty>().is_err());
    }

    #[test]
    fn prompt_lowercases_choices() {
        let r = CheatsheetRequest::new("Linear Algebra")
            .difficulty(Difficulty::Intermediate)
            .kind(CheatsheetKind::FormulaSheet)
            .length(CheatsheetLength::Medium)
            .custom_requirements("  eigenvalues ");
        let p = r.prompt("Linear Algebra");
        assert!(p.contains("Create a intermediate level cheatsheet for 'Linear Algebra'."));
        assert!(p.contains("This should be a formula sheet with medium (2-4 pages) content."));
        assert!(p.contains("- Special focus: eigenvalues"));
        assert!(p.ends_with("Return only the cheatsheet content formatted in clean markdown."));
    }

    #[test]
    fn blank_focus_omitted() {
        let p = CheatsheetRequest::new("x").custom_requirements("   ").prompt("x");
        assert!(!p.contains("Special focus"));
    }

    #[test]
    fn file_name() {
        assert_eq!(cheatsheet_file_name("Python Data Structures"), "Python_Data_Structures.pdf");
    }

    #[tokio::test]
    async fn pdf_bytes() {
        let bytes = render_cheatsheet_pdf("# Rust\n- ownership").await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
