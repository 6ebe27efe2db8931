//! Lexis launcher
//!
//! Every command prints a JSON envelope on stdout: `{"data": ...}` on
//! success, `{"error": ..., "code": ...}` on failure. Logs go to stderr and
//! the rotating log file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lexis::{Lexis, LexisConfig};
use lexis_logging::{init_logging, LogConfig};
use std::process::ExitCode;
use tracing::debug;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "lexis", version, about = "Vocabulary packs, vocab images and flashcards")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(flatten)]
    config: LexisConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify the upload directory and the database
    Check,

    /// List supported languages
    Languages,

    /// Create, list and inspect packs
    Packs {
        #[command(subcommand)]
        action: cli::packs::PackAction,
    },

    /// Add vocabs to a pack
    Vocab {
        #[command(subcommand)]
        action: cli::vocab::VocabAction,
    },

    /// Draw random flashcards for a user and language
    Flashcards(cli::flashcards::FlashcardArgs),

    /// Delete every pack and vocab (languages are kept)
    Reset {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

async fn run_command(command: Commands, config: LexisConfig) -> Result<()> {
    let lexis = Lexis::open(&config)
        .await
        .context("Failed to start Lexis")?;
    debug!(command = ?command, "Running command");

    match command {
        Commands::Check => cli::check::run(&lexis, &config).await,
        Commands::Languages => cli::output::print_data(&lexis.list_languages().await),
        Commands::Packs { action } => cli::packs::run(&lexis, action).await,
        Commands::Vocab { action } => cli::vocab::run(&lexis, action).await,
        Commands::Flashcards(args) => cli::flashcards::run(&lexis, args).await,
        Commands::Reset { yes } => {
            if !yes {
                anyhow::bail!("reset deletes every pack and vocab; pass --yes to confirm");
            }
            lexis.reset().await?;
            cli::output::print_data(&serde_json::json!({ "reset": true }))
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        app_name: "lexis",
        verbose: cli.verbose,
        log_dir: None,
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    let result = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")
        .and_then(|rt| rt.block_on(run_command(cli.command, cli.config)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            cli::output::print_error(&err);
            ExitCode::from(1)
        }
    }
}
