//! CLI binary for postcraft.
//!
//! A thin shim over the library crate: flags become an `AssistantConfig`
//! and request types, results go to stdout, progress and logs to stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use postcraft::{
    cheatsheet_file_name, generate_cheatsheet, resolve_client, review_resume_from, write_atomic,
    write_cheatsheet_pdf, AssistantConfig, CheatsheetKind, CheatsheetLength, CheatsheetRequest,
    Difficulty, ModelClient, PostRequestFields, PostSession, ProgressCallback, ResumeReviewRequest,
    SelectionPhase, Stage, WorkflowProgressCallback,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One spinner per model call, replaced by a ✓/✗ line when the call ends.
struct CliProgressCallback {
    current: Mutex<Option<(ProgressBar, Instant)>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new(None),
        })
    }

    fn finish(&self) -> f64 {
        match self.current.lock().unwrap().take() {
            Some((bar, started)) => {
                bar.finish_and_clear();
                started.elapsed().as_secs_f64()
            }
            None => 0.0,
        }
    }
}

impl WorkflowProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(format!("{stage}…"));
        bar.enable_steady_tick(Duration::from_millis(80));
        *self.current.lock().unwrap() = Some((bar, Instant::now()));
    }

    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let secs = self.finish();
        eprintln!(
            "  {} {:<24} {}  {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{output_len:>5} chars")),
            dim(&format!("{secs:.1}s")),
        );
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let secs = self.finish();
        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(80) {
            Some((i, _)) => format!("{}\u{2026}", &error[..i]),
            None => error.to_string(),
        };
        eprintln!(
            "  {} {:<24} {}  {}",
            red("✗"),
            stage.to_string(),
            red(&msg),
            dim(&format!("{secs:.1}s")),
        );
    }

    fn on_warning(&self, message: &str) {
        eprintln!("  {} {}", yellow("⚠"), message);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Three post drafts
  postcraft post "Shipped our first AI agent" --type announcement --tone excited --audience recruiters

  # Pick the second draft, refine it and save it
  postcraft post "Shipped our first AI agent" --select 2 --refine "make it shorter" -o post.txt

  # Work through the drafts interactively
  postcraft post "Lessons from my first year as a manager" --interactive

  # Cheatsheet as PDF (written to Linear_Algebra.pdf)
  postcraft cheatsheet "Linear Algebra" --difficulty intermediate --kind formula-sheet

  # Resume feedback
  postcraft resume cv.pdf --role "Data Scientist"

INTERACTIVE COMMANDS:
  list              Show the generated drafts
  select N          Pick draft N
  show              Show the working text
  edit              Replace the working text (finish with a line containing only ".")
  refine [TEXT]     Ask the model to improve the working text, optionally with an instruction
  save [PATH]       Save the working text as final, optionally writing it to PATH
  back              Clear the session and leave
  quit              Leave

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
"#;

/// Draft LinkedIn posts, review resumes and build study cheatsheets with LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "postcraft",
    version,
    about = "Draft LinkedIn posts, review resumes and build study cheatsheets with LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// LLM model ID (e.g. gpt-4.1-nano, gemini-2.5-flash).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "POSTCRAFT_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, global = true, env = "POSTCRAFT_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Per-call LLM timeout in seconds.
    #[arg(long, global = true, env = "POSTCRAFT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds (resume URLs).
    #[arg(long, global = true, env = "POSTCRAFT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable spinners.
    #[arg(long, global = true, env = "POSTCRAFT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "POSTCRAFT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, global = true, env = "POSTCRAFT_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate LinkedIn post drafts.
    Post(PostArgs),
    /// Generate a study cheatsheet and typeset it as a PDF.
    Cheatsheet(CheatsheetArgs),
    /// Review a PDF resume for a target role.
    Resume(ResumeArgs),
}

#[derive(Args, Debug)]
struct PostArgs {
    /// What the post is about.
    topic: String,

    /// Post type (e.g. announcement, story, tip).
    #[arg(long = "type", default_value = "")]
    post_type: String,

    /// Desired tone (e.g. excited, humble).
    #[arg(long, default_value = "")]
    tone: String,

    /// Target audience (e.g. recruiters, students).
    #[arg(long, default_value = "")]
    audience: String,

    /// Add hashtags to the posts.
    #[arg(long)]
    hashtags: bool,

    /// Hashtags to include verbatim (implies --hashtags).
    #[arg(long)]
    hashtag_list: Option<String>,

    /// Add emojis to the posts.
    #[arg(long)]
    emojis: bool,

    /// Number of drafts (1–10; anything else falls back to 3).
    #[arg(short = 'n', long, default_value = "3")]
    variations: String,

    /// Replace person names with [PERSON] before anything is sent.
    #[arg(long)]
    mask_names: bool,

    /// Pick, edit, refine and save drafts from a prompt.
    #[arg(short, long, conflicts_with_all = ["select", "json"])]
    interactive: bool,

    /// Select draft N (1-based) and print it as the final post.
    #[arg(long, value_parser = parse_draft_number)]
    select: Option<usize>,

    /// Refine the selected draft; repeat for several rounds.
    #[arg(long, requires = "select", num_args = 0..=1, default_missing_value = "")]
    refine: Vec<String>,

    /// Write the final post (with --select) or all drafts to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output the generation as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct CheatsheetArgs {
    /// Subject of the cheatsheet.
    topic: String,

    /// beginner, intermediate or advanced.
    #[arg(long, default_value = "beginner")]
    difficulty: Difficulty,

    /// quick-reference, formula-sheet, concept-overview, step-by-step-guide or comprehensive-review.
    #[arg(long, default_value = "quick-reference")]
    kind: CheatsheetKind,

    /// short, medium or long.
    #[arg(long, default_value = "short")]
    length: CheatsheetLength,

    /// Extra focus, e.g. "interview questions".
    #[arg(long)]
    focus: Option<String>,

    /// PDF path. Default: the topic with spaces replaced by underscores.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the markdown to stdout as well.
    #[arg(long)]
    markdown: bool,
}

#[derive(Args, Debug)]
struct ResumeArgs {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// The role the resume targets.
    #[arg(long)]
    role: String,

    /// Replace person names in the resume before it is sent.
    #[arg(long)]
    mask_names: bool,
}

/// Drafts are numbered from 1 on the command line.
fn parse_draft_number(raw: &str) -> std::result::Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        Ok(_) => Err("drafts are numbered from 1".to_string()),
        Err(_) => Err(format!("'{raw}' is not a draft number")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Spinners carry the user-facing feedback, so library INFO logs are
    // only shown when they are off.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn WorkflowProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let client = resolve_client(&config).context("Failed to set up the LLM provider")?;

    match &cli.command {
        Command::Post(args) => run_post(&cli, args, client.as_ref(), &config).await,
        Command::Cheatsheet(args) => run_cheatsheet(&cli, args, client.as_ref(), &config).await,
        Command::Resume(args) => run_resume(&cli, args, client.as_ref(), &config).await,
    }
}

/// Map global CLI args to `AssistantConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AssistantConfig> {
    let mut builder = AssistantConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn post_fields(args: &PostArgs) -> (PostRequestFields, Option<String>) {
    let mut fields = PostRequestFields::new(&args.topic)
        .post_type(&args.post_type)
        .tone(&args.tone)
        .audience(&args.audience)
        .hashtags(args.hashtags || args.hashtag_list.is_some())
        .emojis(args.emojis)
        .mask_names(args.mask_names);
    if let Some(ref list) = args.hashtag_list {
        fields = fields.hashtag_list(list);
    }
    let (fields, warning) = fields.variations_from_str(&args.variations);
    (fields, warning.map(|w| w.to_string()))
}

// ── post ─────────────────────────────────────────────────────────────────

async fn run_post(
    cli: &Cli,
    args: &PostArgs,
    client: &dyn ModelClient,
    config: &AssistantConfig,
) -> Result<()> {
    let (fields, warning) = post_fields(args);
    if let (Some(w), false) = (&warning, cli.quiet) {
        eprintln!("{} {}", yellow("⚠"), w);
    }

    let mut session = PostSession::new();
    session
        .generate(client, fields, config)
        .await
        .context("Generation failed")?;

    if args.interactive {
        return interactive(cli, &mut session, client, config).await;
    }

    let Some(index) = args.select else {
        let generation = session.generation().context("No generation")?;
        if args.json {
            println!(
                "{}",
                serde_json::to_string_pretty(generation).context("Failed to serialise output")?
            );
        } else {
            print_candidates(&session);
        }
        if let Some(ref path) = args.output {
            let text = generation
                .candidates
                .iter()
                .collect::<Vec<_>>()
                .join("\n\n---\n\n");
            write_atomic(path, text.as_bytes()).await.context("Failed to write drafts")?;
        }
        print_usage(cli, &session);
        return Ok(());
    };

    session
        .select(index - 1)
        .with_context(|| format!("Cannot select draft {index}"))?;
    for instruction in &args.refine {
        let instruction = Some(instruction.as_str()).filter(|i| !i.trim().is_empty());
        session
            .refine(client, instruction, config)
            .await
            .context("Refinement failed")?;
    }
    let final_text = session.save().context("Failed to save")?.to_string();

    if args.json {
        let out = serde_json::json!({
            "generation": session.generation(),
            "selected": index,
            "final": final_text,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("Failed to serialise output")?
        );
    } else {
        println!("{final_text}");
    }
    if let Some(ref path) = args.output {
        write_atomic(path, final_text.as_bytes())
            .await
            .context("Failed to write post")?;
        if !cli.quiet {
            eprintln!("{} saved to {}", green("✔"), bold(&path.display().to_string()));
        }
    }
    print_usage(cli, &session);
    Ok(())
}

fn print_candidates(session: &PostSession) {
    let Some(candidates) = session.candidates() else {
        return;
    };
    for (i, post) in candidates.iter().enumerate() {
        println!("{}", bold(&format!("── Post {} ──", i + 1)));
        println!("{post}\n");
    }
}

fn print_usage(cli: &Cli, session: &PostSession) {
    if cli.quiet {
        return;
    }
    let usage = session.usage();
    eprintln!(
        "   {} tokens in  /  {} tokens out",
        dim(&usage.input_tokens.to_string()),
        dim(&usage.output_tokens.to_string()),
    );
}

async fn interactive(
    cli: &Cli,
    session: &mut PostSession,
    client: &dyn ModelClient,
    config: &AssistantConfig,
) -> Result<()> {
    print_candidates(session);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let phase = match session.phase() {
            SelectionPhase::NoSelection => "no selection",
            SelectionPhase::Selected => "selected",
            SelectionPhase::Editing => "editing",
            SelectionPhase::Saved => "saved",
        };
        eprint!("{} ", cyan(&format!("[{phase}]>")));
        io::stderr().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let line = line.trim();
        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match cmd {
            "" => {}
            "list" => print_candidates(session),
            "show" => match session.phase() {
                SelectionPhase::NoSelection => eprintln!("{}", dim("Nothing selected.")),
                _ => println!("{}", session.selection().working_text()),
            },
            "select" => match rest.parse::<usize>() {
                Ok(n) if n >= 1 => match session.select(n - 1) {
                    Ok(text) => println!("{text}"),
                    Err(e) => eprintln!("{} {e}", red("✗")),
                },
                _ => eprintln!("{} usage: select N", red("✗")),
            },
            "edit" => {
                eprintln!("{}", dim("Enter the new text; finish with a line containing only \".\""));
                let mut text = Vec::new();
                while let Some(l) = lines.next_line().await.context("Failed to read stdin")? {
                    if l.trim() == "." {
                        break;
                    }
                    text.push(l);
                }
                match session.edit(text.join("\n")) {
                    Ok(()) => eprintln!("{} updated", green("✓")),
                    Err(e) => eprintln!("{} {e}", red("✗")),
                }
            }
            "refine" => {
                let instruction = Some(rest).filter(|r| !r.is_empty());
                match session.refine(client, instruction, config).await {
                    Ok(text) => println!("{text}"),
                    Err(e) => eprintln!("{} {e}", red("✗")),
                }
            }
            "save" => match session.save() {
                Ok(text) => {
                    let text = text.to_string();
                    println!("{}\n{text}", bold("Final post:"));
                    if !rest.is_empty() {
                        match write_atomic(rest, text.as_bytes()).await {
                            Ok(()) => eprintln!("{} saved to {}", green("✔"), bold(rest)),
                            Err(e) => eprintln!("{} {e}", red("✗")),
                        }
                    }
                }
                Err(e) => eprintln!("{} {e}", red("✗")),
            },
            "back" => {
                session.back();
                eprintln!("{}", dim("Session cleared."));
                break;
            }
            "quit" | "exit" => break,
            "help" => eprintln!("{}", AFTER_HELP.split("INTERACTIVE COMMANDS:").nth(1).unwrap_or("")),
            other => eprintln!("{} unknown command '{other}' (try help)", red("✗")),
        }
    }

    print_usage(cli, session);
    Ok(())
}

// ── cheatsheet ───────────────────────────────────────────────────────────

async fn run_cheatsheet(
    cli: &Cli,
    args: &CheatsheetArgs,
    client: &dyn ModelClient,
    config: &AssistantConfig,
) -> Result<()> {
    let mut request = CheatsheetRequest::new(&args.topic)
        .difficulty(args.difficulty)
        .kind(args.kind)
        .length(args.length);
    if let Some(ref focus) = args.focus {
        request = request.custom_requirements(focus);
    }

    let markdown = generate_cheatsheet(client, &request, config)
        .await
        .context("Cheatsheet generation failed")?;
    if args.markdown {
        println!("{markdown}");
    }

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(cheatsheet_file_name(&args.topic)));
    let bytes = write_cheatsheet_pdf(&markdown, &path)
        .await
        .context("Failed to create PDF")?;

    if !cli.quiet {
        eprintln!(
            "{}  {}  →  {}",
            green("✔"),
            dim(&format!("{bytes} bytes")),
            bold(&path.display().to_string()),
        );
    }
    Ok(())
}

// ── resume ───────────────────────────────────────────────────────────────

async fn run_resume(
    cli: &Cli,
    args: &ResumeArgs,
    client: &dyn ModelClient,
    config: &AssistantConfig,
) -> Result<()> {
    let request = ResumeReviewRequest::new(&args.role).mask_names(args.mask_names);
    let feedback = review_resume_from(client, &args.input, &request, config)
        .await
        .context("Resume review failed")?;

    if !cli.quiet {
        eprintln!(
            "{}",
            bold(&format!(
                "Suggestions for improving your resume for the '{}' role:",
                args.role.trim()
            ))
        );
    }
    println!("{feedback}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_zero_is_rejected() {
        assert!(parse_draft_number("0").is_err());
        assert!(parse_draft_number("two").is_err());
        assert_eq!(parse_draft_number("2"), Ok(2));

        let err = Cli::try_parse_from(["postcraft", "post", "AI agents", "--select", "0"]);
        assert!(err.is_err());
        assert!(Cli::try_parse_from(["postcraft", "post", "AI agents", "--select", "1"]).is_ok());
    }
}
