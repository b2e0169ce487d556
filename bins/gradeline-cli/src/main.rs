mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gradeline-cli")]
#[command(about = "Gradeline CLI - Grade and run local solutions against the remote judge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported languages and their judge ids
    Languages,

    /// Grade a source file and print the aggregate verdict
    Grade {
        /// Language name (e.g., python, cpp, java)
        #[arg(short, long)]
        language: String,

        /// Path to the source file
        #[arg(short, long)]
        source: PathBuf,

        /// Path to a JSON array of {"input", "expected_output"} cases
        #[arg(short, long)]
        cases: PathBuf,
    },

    /// Run a source file and print the raw per-case results
    Run {
        /// Language name (e.g., python, cpp, java)
        #[arg(short, long)]
        language: String,

        /// Path to the source file
        #[arg(short, long)]
        source: PathBuf,

        /// Path to a JSON array of {"input", "expected_output"} cases
        #[arg(short, long)]
        cases: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Languages => {
            commands::list_languages()?;
        }
        Commands::Grade {
            language,
            source,
            cases,
        } => {
            commands::grade(&language, &source, &cases).await?;
        }
        Commands::Run {
            language,
            source,
            cases,
        } => {
            commands::run(&language, &source, &cases).await?;
        }
    }

    Ok(())
}
