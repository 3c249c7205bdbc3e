//! CLI binary for mcqgen.
//!
//! A thin shim over the library crate that maps CLI flags to `QuizConfig`
//! and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use mcqgen::{generate_from_path, QuizConfig, RunCounters, SchemaHint};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # 10 Biology questions from a PDF, CSV to stdout
  mcqgen notes.pdf --subject Biology

  # Write CSV to a file, harder questions
  mcqgen chapter3.pdf --subject Physics --count 20 --tone Expert -o quiz.csv

  # Plain-text input, skip the review pass
  mcqgen lecture.txt --subject History --no-review

  # Use a specific model
  mcqgen notes.pdf --subject Chemistry --model gpt-4.1 --provider openai

  # Structured JSON output (quiz + review + usage stats)
  mcqgen notes.pdf --subject Biology --json > quiz.json

  # Custom response-schema hint (equivalent of Response.json)
  mcqgen notes.pdf --subject Biology --schema-hint Response.json

SUPPORTED PROVIDERS & MODELS:
  Provider     Model                      Input $/1M  Output $/1M
  ─────────    ─────────────────────────  ──────────  ───────────
  openai       gpt-4.1-nano (default)     $0.10       $0.40
  openai       gpt-4.1-mini               $0.40       $1.60
  openai       gpt-4.1                    $2.00       $8.00
  anthropic    claude-sonnet-4-20250514   $3.00       $15.00
  anthropic    claude-haiku-4-20250514    $0.80       $4.00
  gemini       gemini-2.0-flash           $0.10       $0.40
  ollama       llama3.2, mistral, …       free        free

COST ESTIMATE (10 questions from a 5-page document):
  ~3,000 prompt tokens + ~1,200 completion tokens per run
  gpt-4.1-nano: well under $0.01 per quiz

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY       OpenAI API key
  ANTHROPIC_API_KEY    Anthropic API key
  GEMINI_API_KEY       Google Gemini API key
  MCQGEN_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  MCQGEN_MODEL         Override model ID

SETUP:
  1. Set API key:   export OPENAI_API_KEY=sk-...
  2. Generate:      mcqgen notes.pdf --subject Biology -o quiz.csv
"#;

/// Generate multiple-choice quizzes from PDF and text documents using LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "mcqgen",
    version,
    about = "Generate multiple-choice quizzes from PDF and text documents using LLMs",
    long_about = "Generate a multiple-choice quiz from a PDF or plain-text document. A first \
LLM pass creates the questions, a second pass reviews them for level-appropriateness. \
Supports OpenAI, Anthropic, Google Gemini, Azure OpenAI, and any OpenAI-compatible endpoint \
(Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input document: a .pdf or plain-text file.
    input: PathBuf,

    /// Subject area the questions are for (e.g. Biology, History).
    #[arg(short, long)]
    subject: String,

    /// Number of questions to generate.
    #[arg(short = 'n', long, default_value_t = 10)]
    count: usize,

    /// Difficulty tone: Simple, Medium, Expert, Academic, …
    #[arg(short, long, default_value = "Medium")]
    tone: String,

    /// Write CSV to this file instead of stdout.
    #[arg(short, long, env = "MCQGEN_OUTPUT")]
    output: Option<PathBuf>,

    /// LLM model ID (e.g. gpt-4.1-nano, claude-sonnet-4-20250514).
    #[arg(long, env = "MCQGEN_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "MCQGEN_LLM_PROVIDER")]
    provider: Option<String>,

    /// Path to a JSON file describing the expected reply shape.
    #[arg(long, env = "MCQGEN_SCHEMA_HINT")]
    schema_hint: Option<PathBuf>,

    /// Skip the review pass (stage 2).
    #[arg(long, env = "MCQGEN_NO_REVIEW")]
    no_review: bool,

    /// Word budget for the review critique.
    #[arg(long, default_value_t = 50)]
    review_words: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "MCQGEN_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Max LLM output tokens per call.
    #[arg(long, env = "MCQGEN_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Retries per LLM call on transient failure.
    #[arg(long, env = "MCQGEN_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-LLM-call timeout in seconds.
    #[arg(long, env = "MCQGEN_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Output structured JSON (quiz + review + stats) instead of CSV.
    #[arg(long, env = "MCQGEN_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "MCQGEN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MCQGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the quiz itself.
    #[arg(short, long, env = "MCQGEN_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active; the
    // spinner and summary lines provide the feedback that matters.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Build config ─────────────────────────────────────────────────────
    let counters = RunCounters::new();
    let config = build_config(&cli, &counters)?;

    // ── Run the pipeline ─────────────────────────────────────────────────
    let spinner = if show_progress {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Generating");
        bar.set_message(format!(
            "{} questions on {} ({} tone)…",
            cli.count, cli.subject, cli.tone
        ));
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    let result =
        generate_from_path(&cli.input, cli.count, &cli.subject, &cli.tone, &config).await;

    if let Some(bar) = &spinner {
        bar.finish_and_clear();
    }

    let output = result.context("Quiz generation failed")?;

    // ── Emit the quiz ────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    if let Some(ref output_path) = cli.output {
        output
            .write_csv_to_file(output_path)
            .context("Failed to write CSV")?;
        if !cli.quiet {
            print_table(&output.rows());
            eprintln!(
                "{} {} questions  →  {}",
                green("✔"),
                bold(&output.quiz.len().to_string()),
                bold(&output_path.display().to_string()),
            );
        }
    } else {
        let csv = output.csv_string().context("CSV export failed")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(csv.as_bytes())
            .context("Failed to write to stdout")?;
    }

    // ── Review, warnings, usage summary ──────────────────────────────────
    if !cli.quiet {
        if let Some(review) = &output.review {
            eprintln!("\n{} {}", cyan("◆"), bold("Review"));
            eprintln!("{review}");
        }
        for warning in &output.warnings {
            eprintln!("{} {}", yellow("⚠"), warning);
        }
        eprintln!(
            "\n   {} tokens ({} in / {} out)  —  ~${:.4}",
            dim(&output.stats.total_tokens().to_string()),
            dim(&output.stats.prompt_tokens.to_string()),
            dim(&output.stats.completion_tokens.to_string()),
            output.stats.estimated_cost_usd,
        );
        if cli.verbose {
            eprintln!(
                "   session totals: {} MCQs, {} documents",
                counters.mcqs_generated(),
                counters.documents_processed()
            );
        }
    }

    Ok(())
}

/// Print the quiz as an aligned text table on stderr.
fn print_table(rows: &[mcqgen::TabularRow]) {
    const MCQ_WIDTH: usize = 48;
    const CHOICES_WIDTH: usize = 56;

    let truncate = |s: &str, width: usize| -> String {
        let flat = s.replace('\n', " ");
        if flat.chars().count() <= width {
            flat
        } else {
            let cut: String = flat.chars().take(width.saturating_sub(1)).collect();
            format!("{cut}…")
        }
    };

    eprintln!(
        "{}",
        dim(&format!(
            "{:>3}  {:<MCQ_WIDTH$}  {:<CHOICES_WIDTH$}  {}",
            "#", "MCQ", "Choices", "Correct"
        ))
    );
    for row in rows {
        eprintln!(
            "{:>3}  {:<MCQ_WIDTH$}  {:<CHOICES_WIDTH$}  {}",
            row.index,
            truncate(&row.mcq, MCQ_WIDTH),
            truncate(&row.choices, CHOICES_WIDTH),
            row.correct,
        );
    }
}

/// Map CLI args to `QuizConfig`.
fn build_config(cli: &Cli, counters: &std::sync::Arc<RunCounters>) -> Result<QuizConfig> {
    let mut builder = QuizConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout)
        .review(!cli.no_review)
        .review_word_budget(cli.review_words)
        .counters(counters.clone());

    if let Some(path) = &cli.schema_hint {
        // Load once at startup; a missing or broken hint file degrades to
        // the built-in shape with a warning on stderr.
        let (hint, warning) = SchemaHint::load(path);
        if let Some(w) = warning {
            eprintln!("{} {}", yellow("⚠"), w);
        }
        builder = builder.schema_hint(hint);
    } else {
        builder = builder.schema_hint(SchemaHint::default());
    }

    if let Some(model) = &cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(provider) = &cli.provider {
        builder = builder.provider_name(provider.clone());
    }

    builder.build().context("Invalid configuration")
}
