//! Generate and summarize a research-paper abstract from the command line.
//!
//! Reads the API key from the `GEMINI_API_KEY` environment variable. An
//! unset or empty key is allowed — the `key` query parameter is omitted and
//! ambient authentication is assumed.
//!
//! # Examples
//!
//! ```sh
//! # Technical one-paragraph summary
//! paperbrief --title "Attention Is All You Need"
//!
//! # Beginner-friendly, longer
//! paperbrief --title "Diffusion Models Beat GANs on Image Synthesis" \
//!   --style beginner --length long
//!
//! # Show the canned titles
//! paperbrief --list-titles
//! ```

use clap::Parser;
use paperbrief::pipeline::{Pipeline, PipelineError, SummaryLength, SummaryStyle};
use paperbrief::{GeminiClient, GeminiConfig, SUGGESTED_TITLES};
use std::process;
use tracing_subscriber::EnvFilter;

/// Two-stage research summarizer: generate an abstract for a paper title,
/// then summarize it in a chosen style and length.
#[derive(Parser)]
#[command(name = "paperbrief")]
struct Cli {
    /// Paper title to generate and summarize
    #[arg(long)]
    title: Option<String>,

    /// Explanation style: beginner-friendly, technical, code-oriented,
    /// mathematical, or historical
    #[arg(long, default_value = "technical")]
    style: SummaryStyle,

    /// Summary length: short, medium, or long
    #[arg(long, default_value = "short")]
    length: SummaryLength,

    /// Override the generation endpoint URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Print the suggested paper titles and exit
    #[arg(long)]
    list_titles: bool,
}

async fn run(cli: &Cli) -> Result<(), String> {
    let title = match &cli.title {
        Some(t) if !t.trim().is_empty() => t.trim(),
        _ => return Err("please provide a paper title with --title".to_string()),
    };

    let mut config = GeminiConfig {
        api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
        ..Default::default()
    };
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }

    let client = GeminiClient::new(config)?;
    let model = client.model_label().to_string();
    let pipeline = Pipeline::new(client);

    eprintln!("Stage 1: generating abstract for '{title}' with {model}...");
    eprintln!("Stage 2: summarizing as {} / {}", cli.style, cli.length);

    match pipeline.run(title, cli.style, cli.length).await {
        Ok(output) => {
            println!("{}", output.summary);
            println!("\n---\nAbstract (input for summarization):\n{}", output.abstract_text);
            Ok(())
        }
        Err(PipelineError::SummaryEmpty { abstract_text }) => {
            println!("\n---\nAbstract (input for summarization):\n{abstract_text}");
            Err(format!(
                "Stage 2 produced no content from the {model} API; \
                 the abstract above was still generated"
            ))
        }
        Err(e @ PipelineError::AbstractEmpty) => Err(format!(
            "{e}: the {model} API returned nothing; \
             this usually indicates an API key or connectivity issue"
        )),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list_titles {
        for title in SUGGESTED_TITLES {
            println!("{title}");
        }
        return;
    }

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
