//! Condensa CLI - text summarisation with follow-up Q&A
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{Parser, Subcommand};
use condensa::web::{self, AppState};
use condensa::{summary, Config, ModelProvider, SummaryLength};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "condensa")]
#[command(author, version, about = "Web app for text summarisation with follow-up Q&A", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server
    Serve {
        /// Address to bind, overriding the configured one
        #[arg(long)]
        bind: Option<String>,
    },
    /// Summarise a file (or stdin) and print the result
    Summarise {
        /// File to read; stdin when omitted
        file: Option<PathBuf>,
        /// Summary length preset
        #[arg(long, default_value = "medium")]
        length: SummaryLength,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Some(Commands::Summarise { file, length }) => {
            let text = read_input(file)?;
            let words = summary::word_count(&text);
            if words < summary::MIN_INPUT_WORDS {
                anyhow::bail!(
                    "input has {} words; at least {} are needed for meaningful summarisation",
                    words,
                    summary::MIN_INPUT_WORDS
                );
            }

            let models = ModelProvider::load(&config)?;
            let result =
                summary::generate_summary(models.summarizer.as_ref(), &text, length).await?;
            println!("{}", result);
        }
        Some(Commands::Serve { bind }) => serve(config, bind).await?,
        None => serve(config, None).await?,
    }

    Ok(())
}

async fn serve(config: Config, bind: Option<String>) -> anyhow::Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());

    // Build both capabilities up front; an acquisition failure aborts
    // startup instead of faulting the first user session.
    let models = ModelProvider::load(&config)?;
    let state = AppState::new(models);

    web::serve(&bind, state).await
}

fn read_input(file: Option<PathBuf>) -> anyhow::Result<String> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => Ok(std::io::read_to_string(std::io::stdin())?),
    }
}
