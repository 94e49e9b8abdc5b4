//! Workflow tests against a scripted model client.
//!
//! Every reply is queued up front and every request is recorded, so these
//! tests pin down exactly what is sent, in which order, and how each
//! outcome lands in the session. No network access.

use async_trait::async_trait;
use postcraft::pipeline::render::{render_document, PdfLayout};
use postcraft::{
    cheatsheet_file_name, generate_cheatsheet, generate_posts, render_cheatsheet_pdf,
    review_resume, AssistantConfig, CheatsheetKind, CheatsheetRequest, ExtractionError,
    ModelClient, ModelError, ModelErrorKind, ModelReply, ModelRequest, PostRequestFields,
    PostSession, PostcraftError, RefinementError, ResumeReviewRequest, Role, SelectionPhase,
    SessionError, Stage, ValidationError, WorkflowProgressCallback,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct ScriptedClient {
    replies: Mutex<VecDeque<Result<ModelReply, ModelError>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedClient {
    fn new() -> Self {
        Self::default()
    }

    fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(ModelReply {
            content: text.to_string(),
            input_tokens: 10,
            output_tokens: 5,
        }));
        self
    }

    fn fail(self, kind: ModelErrorKind, detail: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(ModelError::new(kind, detail)));
        self
    }

    fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn prompt(&self, i: usize) -> String {
        match &self.requests()[i] {
            ModelRequest::Prompt(p) => p.clone(),
            other => panic!("request {i} is not a prompt: {other:?}"),
        }
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn invoke(&self, request: &ModelRequest) -> Result<ModelReply, ModelError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::new(ModelErrorKind::Other, "script exhausted")))
    }
}

const STRUCTURED: &str = "```json\n{\"topic\":\"AI agents\",\"post_type\":\"announcement\",\"tone\":\"excited\",\"audience\":\"recruiters\"}\n```";

fn fields() -> PostRequestFields {
    PostRequestFields::new("AI agents")
        .post_type("announcement")
        .tone("excited")
        .audience("recruiters")
        .emojis(true)
        .variations(2)
}

fn config() -> AssistantConfig {
    AssistantConfig::default()
}

// ── Post generation ──────────────────────────────────────────────────────────

#[tokio::test]
async fn end_to_end_generate_select_save() {
    let client = ScriptedClient::new()
        .reply(STRUCTURED)
        .reply(r#"["Post A\nline2","Post B"]"#);
    let mut session = PostSession::new();

    let generation = session.generate(&client, fields(), &config()).await.unwrap();
    assert_eq!(
        generation.candidates.iter().collect::<Vec<_>>(),
        vec!["Post A\nline2", "Post B"]
    );
    assert!(generation.warnings.is_empty());
    assert_eq!(generation.usage.input_tokens, 20);

    let instruction = client.prompt(1);
    assert!(instruction.starts_with("Write 2 different versions of a excited LinkedIn announcement"));
    assert!(instruction.contains("targeted at recruiters about: AI agents."));
    assert!(instruction.contains("Do not add any hashtags."));
    assert!(instruction.contains("Include emojis."));

    assert_eq!(session.select(0).unwrap(), "Post A\nline2");
    assert_eq!(session.save().unwrap(), "Post A\nline2");
    assert_eq!(session.phase(), SelectionPhase::Saved);
    assert_eq!(session.selection().saved_final_text(), Some("Post A\nline2"));
}

#[tokio::test]
async fn extraction_prompt_combines_fields() {
    let client = ScriptedClient::new().reply(STRUCTURED).reply(r#"["x"]"#);
    generate_posts(&client, &fields(), &config()).await.unwrap();
    let prompt = client.prompt(0);
    assert!(prompt.contains("Topic: AI agents. Post type: announcement. Tone: excited. Audience: recruiters."));
    assert_eq!(client.requests().len(), 2);
}

#[tokio::test]
async fn blank_topic_sends_nothing() {
    let client = ScriptedClient::new();
    let err = generate_posts(&client, &PostRequestFields::new("   "), &config())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PostcraftError::Validation(ValidationError::MissingRequiredField { field: "Topic" })
    ));
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn incomplete_extraction_aborts_before_generation() {
    let client = ScriptedClient::new().reply(r#"{"topic":"x","post_type":"y"}"#);
    let mut session = PostSession::new();

    let err = session.generate(&client, fields(), &config()).await.unwrap_err();
    assert!(err.to_string().contains("please simplify and try again"));
    match err {
        PostcraftError::Extraction(ExtractionError::IncompleteFields { missing }) => {
            assert_eq!(missing, vec!["tone", "audience"]);
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(client.requests().len(), 1, "generation must not be attempted");
    assert!(session.generation().is_none());
}

#[tokio::test]
async fn prose_reply_becomes_single_candidate() {
    let client = ScriptedClient::new()
        .reply(STRUCTURED)
        .reply("Here is a post about AI agents!");
    let generation = generate_posts(&client, &fields(), &config()).await.unwrap();
    assert_eq!(
        generation.candidates.iter().collect::<Vec<_>>(),
        vec!["Here is a post about AI agents!"]
    );
}

#[tokio::test]
async fn surplus_candidates_are_dropped() {
    let client = ScriptedClient::new()
        .reply(STRUCTURED)
        .reply(r#"["a","b","c","d"]"#);
    let generation = generate_posts(&client, &fields(), &config()).await.unwrap();
    assert_eq!(generation.candidates.len(), 2);
    assert_eq!(generation.candidates.get(1), Some("b"));
}

#[tokio::test]
async fn empty_generation_reply_is_an_error() {
    let client = ScriptedClient::new().reply(STRUCTURED).reply("  ");
    let err = generate_posts(&client, &fields(), &config()).await.unwrap_err();
    assert!(matches!(err, PostcraftError::EmptyResponse { .. }));
}

#[tokio::test]
async fn generation_rate_limit_is_distinct() {
    let client = ScriptedClient::new()
        .reply(STRUCTURED)
        .fail(ModelErrorKind::RateLimited, "429 Too Many Requests");
    let err = generate_posts(&client, &fields(), &config()).await.unwrap_err();
    assert!(matches!(err, PostcraftError::RateLimitExceeded { .. }));
    assert_eq!(err.to_string(), "Rate limit exceeded. Please try again later.");
}

#[tokio::test]
async fn out_of_range_count_warns_and_defaults() {
    let client = ScriptedClient::new().reply(STRUCTURED).reply(r#"["a"]"#);
    let generation = generate_posts(&client, &fields().variations(15), &config())
        .await
        .unwrap();
    assert_eq!(generation.prompt.variation_count, 3);
    assert_eq!(generation.warnings.len(), 1);
    assert!(generation.warnings[0].contains("Defaulting to 3"));
    assert!(client.prompt(1).starts_with("Write 3 different versions"));
}

#[tokio::test]
async fn names_masked_before_sending() {
    let client = ScriptedClient::new().reply(STRUCTURED).reply(r#"["a"]"#);
    let f = PostRequestFields::new("Promoted thanks to John Smith")
        .audience("Mary and the team")
        .mask_names(true);
    generate_posts(&client, &f, &config()).await.unwrap();
    let sent = client.prompt(0);
    assert!(!sent.contains("John"), "{sent}");
    assert!(!sent.contains("Mary"), "{sent}");
    assert!(sent.contains("[PERSON]"));
}

#[tokio::test]
async fn hashtag_list_reaches_instruction() {
    let client = ScriptedClient::new().reply(STRUCTURED).reply(r#"["a"]"#);
    let f = fields().hashtags(true).hashtag_list("#AI #Agents");
    generate_posts(&client, &f, &config()).await.unwrap();
    assert!(client
        .prompt(1)
        .contains("Include these hashtags at the end of the post: #AI #Agents."));
}

// ── Session & refinement ─────────────────────────────────────────────────────

#[tokio::test]
async fn refine_replaces_working_text() {
    let client = ScriptedClient::new()
        .reply(STRUCTURED)
        .reply(r#"["Post A","Post B"]"#)
        .reply("  Post B, but shorter.  ");
    let mut session = PostSession::new();
    session.generate(&client, fields(), &config()).await.unwrap();
    session.select(1).unwrap();

    let refined = session
        .refine(&client, Some("make it shorter"), &config())
        .await
        .unwrap();
    assert_eq!(refined, "Post B, but shorter.");
    assert_eq!(session.phase(), SelectionPhase::Editing);
    assert_eq!(session.selection().selected_post(), Some("Post B"));

    let requests = client.requests();
    let ModelRequest::Messages(msgs) = &requests[2] else {
        panic!("refinement must be a message sequence");
    };
    assert_eq!(msgs[0].role, Role::System);
    assert!(msgs[0].content.contains("Include emojis."));
    assert!(msgs[0].content.ends_with("make it shorter"));
    assert_eq!(msgs[1].role, Role::User);
    assert!(msgs[1].content.ends_with("Post B"));
}

#[tokio::test]
async fn rate_limited_refinement_keeps_working_text() {
    let client = ScriptedClient::new()
        .reply(STRUCTURED)
        .reply(r#"["Post A"]"#)
        .fail(ModelErrorKind::RateLimited, "quota exhausted");
    let mut session = PostSession::new();
    session.generate(&client, fields(), &config()).await.unwrap();
    session.select(0).unwrap();
    session.edit("My edit").unwrap();

    let err = session.refine(&client, None, &config()).await.unwrap_err();
    assert!(matches!(err, RefinementError::RateLimited { .. }));
    assert_eq!(session.selection().working_text(), "My edit");
    assert_eq!(session.phase(), SelectionPhase::Editing);
}

#[tokio::test]
async fn blank_refinement_keeps_working_text() {
    let client = ScriptedClient::new()
        .reply(STRUCTURED)
        .reply(r#"["Post A"]"#)
        .reply("   \n");
    let mut session = PostSession::new();
    session.generate(&client, fields(), &config()).await.unwrap();
    session.select(0).unwrap();
    session.edit("My careful edit").unwrap();

    let err = session.refine(&client, None, &config()).await.unwrap_err();
    assert!(matches!(err, RefinementError::EmptyResponse));
    assert_eq!(session.selection().working_text(), "My careful edit");
    assert_eq!(session.save().unwrap(), "My careful edit");
}

#[tokio::test]
async fn refine_without_selection() {
    let client = ScriptedClient::new().reply(STRUCTURED).reply(r#"["Post A"]"#);
    let mut session = PostSession::new();
    assert!(matches!(
        session.refine(&client, None, &config()).await,
        Err(RefinementError::NothingSelected)
    ));
    session.generate(&client, fields(), &config()).await.unwrap();
    assert!(matches!(
        session.refine(&client, None, &config()).await,
        Err(RefinementError::NothingSelected)
    ));
    assert_eq!(client.requests().len(), 2);
}

#[tokio::test]
async fn generate_again_replaces_candidates_and_resets_selection() {
    let client = ScriptedClient::new()
        .reply(STRUCTURED)
        .reply(r#"["Old A","Old B"]"#)
        .reply(STRUCTURED)
        .reply(r#"["New A"]"#);
    let mut session = PostSession::new();
    session.generate(&client, fields(), &config()).await.unwrap();
    session.select(1).unwrap();
    session.save().unwrap();

    session.generate(&client, fields(), &config()).await.unwrap();
    assert_eq!(session.phase(), SelectionPhase::NoSelection);
    assert_eq!(session.candidates().unwrap().iter().collect::<Vec<_>>(), vec!["New A"]);
    assert_eq!(
        session.select(1),
        Err(SessionError::IndexOutOfRange { index: 1, len: 1 })
    );
}

#[tokio::test]
async fn back_clears_everything() {
    let client = ScriptedClient::new().reply(STRUCTURED).reply(r#"["Post A"]"#);
    let mut session = PostSession::new();
    session.generate(&client, fields(), &config()).await.unwrap();
    session.select(0).unwrap();
    session.back();
    assert!(session.fields().is_none());
    assert!(session.generation().is_none());
    assert_eq!(session.phase(), SelectionPhase::NoSelection);
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl WorkflowProgressCallback for Recorder {
    fn on_stage_start(&self, stage: Stage) {
        self.events.lock().unwrap().push(format!("start {stage:?}"));
    }
    fn on_stage_complete(&self, stage: Stage, _output_len: usize) {
        self.events.lock().unwrap().push(format!("done {stage:?}"));
    }
    fn on_stage_error(&self, stage: Stage, _error: &str) {
        self.events.lock().unwrap().push(format!("error {stage:?}"));
    }
}

#[tokio::test]
async fn progress_events_follow_the_pipeline() {
    let recorder = Arc::new(Recorder::default());
    let config = AssistantConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let client = ScriptedClient::new()
        .reply(STRUCTURED)
        .reply(r#"["a"]"#)
        .fail(ModelErrorKind::Other, "boom");
    let mut session = PostSession::new();
    session.generate(&client, fields(), &config).await.unwrap();
    session.select(0).unwrap();
    let _ = session.refine(&client, None, &config).await;

    assert_eq!(
        *recorder.events.lock().unwrap(),
        vec![
            "start Extracting",
            "done Extracting",
            "start Generating",
            "done Generating",
            "start Refining",
            "error Refining",
        ]
    );
}

// ── Cheatsheet ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn cheatsheet_markdown_to_pdf() {
    let client = ScriptedClient::new().reply("\n# Rust Ownership\n\n## Moves\n- a value has one owner\n```\nlet s = String::new();\n```\n");
    let request = CheatsheetRequest::new(" Rust Ownership ").kind(CheatsheetKind::ConceptOverview);
    let markdown = generate_cheatsheet(&client, &request, &config()).await.unwrap();
    assert!(markdown.starts_with("# Rust Ownership"));
    assert!(client
        .prompt(0)
        .contains("Create a beginner level cheatsheet for 'Rust Ownership'."));
    assert!(client
        .prompt(0)
        .contains("This should be a concept overview with short (1-2 pages) content."));

    let pdf = render_cheatsheet_pdf(&markdown).await.unwrap();
    assert!(pdf.starts_with(b"%PDF"));
    assert_eq!(cheatsheet_file_name("Rust Ownership"), "Rust_Ownership.pdf");
}

#[tokio::test]
async fn cheatsheet_errors() {
    let client = ScriptedClient::new();
    let err = generate_cheatsheet(&client, &CheatsheetRequest::new(""), &config())
        .await
        .unwrap_err();
    assert!(matches!(err, PostcraftError::Validation(_)));

    let client = ScriptedClient::new().fail(ModelErrorKind::RateLimited, "429");
    let err = generate_cheatsheet(&client, &CheatsheetRequest::new("x"), &config())
        .await
        .unwrap_err();
    assert!(matches!(err, PostcraftError::RateLimitExceeded { .. }));
}

// ── Resume ───────────────────────────────────────────────────────────────────

fn resume_pdf() -> Vec<u8> {
    render_document(
        "# John Smith\n## Experience\n- Built Python data pipelines\n- Rust services",
        &PdfLayout::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn resume_text_reaches_prompt() {
    let client = ScriptedClient::new().reply("  - Add metrics to each bullet  ");
    let feedback = review_resume(
        &client,
        resume_pdf(),
        &ResumeReviewRequest::new("Data Engineer"),
        &config(),
    )
    .await
    .unwrap();
    assert_eq!(feedback, "- Add metrics to each bullet");

    let prompt = client.prompt(0);
    assert!(prompt.contains("position of 'Data Engineer'"));
    assert!(prompt.contains("<resume>"));
    assert!(prompt.contains("Python"), "{prompt}");
}

#[tokio::test]
async fn resume_names_masked() {
    let client = ScriptedClient::new().reply("ok");
    review_resume(
        &client,
        resume_pdf(),
        &ResumeReviewRequest::new("Data Engineer").mask_names(true),
        &config(),
    )
    .await
    .unwrap();
    let prompt = client.prompt(0);
    assert!(!prompt.contains("John"), "{prompt}");
}

#[tokio::test]
async fn resume_requires_role_and_pdf() {
    let client = ScriptedClient::new();
    let err = review_resume(&client, resume_pdf(), &ResumeReviewRequest::new(" "), &config())
        .await
        .unwrap_err();
    assert!(matches!(err, PostcraftError::Validation(_)));

    let err = review_resume(
        &client,
        b"PK\x03\x04".to_vec(),
        &ResumeReviewRequest::new("Engineer"),
        &config(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PostcraftError::NotAPdf { .. }));
    assert!(client.requests().is_empty());
}
