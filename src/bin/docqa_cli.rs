use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use docqa::{
    answer::AnswerGenerator,
    config::Config,
    logging,
    processing::{
        PipelineSettings,
        ingest::{DocumentLabel, build_document_from_bytes},
        sanitize::{fingerprint, has_pdf_extension, secure_filename},
    },
    provider::{GeminiConnector, ModelConnector},
};

#[derive(Parser)]
#[command(
    name = "docqa-cli",
    about = "Ask questions about a PDF from the command line"
)]
struct Cli {
    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: String,
    /// Log pipeline steps to stderr.
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the models visible to the API key.
    Models,
    /// Index a PDF and answer one or more questions about it.
    Ask {
        #[arg(long)]
        file: PathBuf,
        #[arg(long = "question", required = true)]
        questions: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init_cli_tracing(cli.verbose);

    let config = Config::from_env().context("failed to load configuration")?;
    let connector = GeminiConnector::from_config(&config).context("failed to build Gemini client")?;

    match cli.command {
        Command::Models => list_models(&connector, &cli.api_key).await,
        Command::Ask { file, questions } => {
            ask(&connector, &config, &cli.api_key, &file, &questions).await
        }
    }
}

async fn list_models(connector: &GeminiConnector, api_key: &str) -> Result<()> {
    let models = connector
        .list_models(api_key)
        .await
        .context("failed to list models")?;
    for model in models {
        println!("{model}");
    }
    Ok(())
}

async fn ask(
    connector: &GeminiConnector,
    config: &Config,
    api_key: &str,
    file: &Path,
    questions: &[String],
) -> Result<()> {
    let raw_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    if !has_pdf_extension(raw_name) {
        bail!("{} is not a .pdf file", file.display());
    }
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let label = DocumentLabel {
        filename: secure_filename(raw_name).unwrap_or_else(|| "document.pdf".to_string()),
        fingerprint: fingerprint(&bytes),
    };

    let settings = PipelineSettings::from_config(config)?;
    let embedder = connector.embedding_client(api_key);
    let document = build_document_from_bytes(bytes, label, &settings.chunker, embedder.as_ref())
        .await
        .with_context(|| format!("failed to index {}", file.display()))?;
    eprintln!(
        "Indexed {} ({} pages, {} chunks)",
        document.filename, document.page_count, document.chunk_count
    );

    let answerer = AnswerGenerator::new(embedder, connector.generation_client(api_key))
        .with_top_k(settings.top_k)
        .with_retry(settings.retry);
    for question in questions {
        let outcome = answerer
            .answer(&document.index, question)
            .await
            .with_context(|| format!("failed to answer {question:?}"))?;
        println!("Q: {question}");
        println!("A: {}", outcome.answer);
        let pages: Vec<String> = outcome
            .sources
            .iter()
            .map(|source| source.page.to_string())
            .collect();
        println!("   (pages {})", pages.join(", "));
    }
    Ok(())
}
