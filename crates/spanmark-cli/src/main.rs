//! spanmark CLI - Command-line interface
//!
//! Usage:
//!   spanmark markup "text to annotate"
//!   spanmark markup --file input.txt --spans spans.json --json
//!   spanmark entities --file input.txt
//!   spanmark demo

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use spanmark_core::{
    annotate, paragraphed, AnnotatedText, AppConfig, LoggingConfig, OverlapPolicy, SpanProvider,
};
use spanmark_extractor::{load_spans, EntityExtractor, RuleBasedNer};

const DEMO_TEXT: &str = "When Sebastian Thrun started working on self-driving cars at \
    Google in 2007, few people outside of the company took him seriously. \
    “I can tell you very senior CEOs of major American car companies would \
    shake my hand and turn away because I wasn’t worth talking to,” said \
    Thrun, in an interview with Recode earlier this week.";

#[derive(Parser)]
#[command(name = "spanmark")]
#[command(about = "Annotate text with inline entity markup")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the text with <entity> tags around each recognized span
    Markup {
        #[command(flatten)]
        input: InputArgs,

        /// Use spans from a JSON file instead of the built-in recognizer
        #[arg(long)]
        spans: Option<PathBuf>,

        /// How overlapping spans are treated (reject, last-wins)
        #[arg(long)]
        overlap: Option<OverlapPolicy>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print recognized entities as JSON
    Entities {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Annotate a built-in sample paragraph
    Demo {
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Text to process (read from stdin when omitted)
    text: Option<String>,

    /// Read the text from a file
    #[arg(long, short, conflicts_with = "text")]
    file: Option<PathBuf>,
}

#[derive(Args, Clone, Copy)]
struct OutputArgs {
    /// Replace blank lines with <p/> breaks
    #[arg(long)]
    paragraphs: bool,

    /// Print {"input": ..., "output": ...} JSON instead of bare markup
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    init_tracing(&config.logging);

    match cli.command {
        Commands::Markup {
            input,
            spans,
            overlap,
            output,
        } => {
            let text = read_input(&input)?;
            let provider: Box<dyn SpanProvider> = match spans {
                Some(path) => Box::new(load_spans(&path)?),
                None => Box::new(RuleBasedNer::from_config(&config.extractor)?),
            };
            let policy = overlap.unwrap_or(config.markup.overlap_policy);
            let output = OutputArgs {
                paragraphs: output.paragraphs || config.markup.paragraphs,
                ..output
            };

            println!("{}", run_markup(provider.as_ref(), text, policy, output)?);
        }
        Commands::Entities { input } => {
            let text = read_input(&input)?;
            let ner = RuleBasedNer::from_config(&config.extractor)?;
            let entities = ner.extract(&text)?;
            println!("{}", serde_json::to_string_pretty(&entities)?);
        }
        Commands::Demo { output } => {
            let ner = RuleBasedNer::from_config(&config.extractor)?;
            let markup = run_markup(
                &ner,
                DEMO_TEXT.to_string(),
                config.markup.overlap_policy,
                output,
            )?;
            println!("{markup}");
        }
    }

    Ok(())
}

/// Install the global subscriber; logs go to stderr so stdout carries only markup
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_input(input: &InputArgs) -> anyhow::Result<String> {
    if let Some(text) = &input.text {
        return Ok(text.clone());
    }
    if let Some(path) = &input.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }

    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("failed to read stdin")?;
    Ok(text)
}

/// Annotate `text` and format it for printing
fn run_markup(
    provider: &dyn SpanProvider,
    text: String,
    policy: OverlapPolicy,
    output: OutputArgs,
) -> anyhow::Result<String> {
    let mut markup = annotate(provider, &text, policy)?;
    if output.paragraphs {
        markup = paragraphed(&markup);
    }
    tracing::info!(chars = text.chars().count(), "annotated input");

    if output.json {
        let payload = AnnotatedText {
            input: text,
            output: markup,
        };
        Ok(serde_json::to_string_pretty(&payload)?)
    } else {
        Ok(markup)
    }
}
