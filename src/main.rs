use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Semantic answer reuse for multi-step application forms", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and grow the answer history
    Answers {
        #[command(subcommand)]
        command: AnswersCommands,
    },

    /// Show recorded listing outcomes
    Listings {
        /// Only failed listings
        #[arg(long)]
        failed: bool,

        /// Only failures worth retrying
        #[arg(long, requires = "failed")]
        retryable: bool,
    },

    /// Screen a listing title against profile keywords
    Relevance {
        /// Listing title to classify
        title: String,
    },
}

#[derive(Subcommand)]
enum AnswersCommands {
    /// List stored answers, oldest first
    List,

    /// Store an answer for a question label
    Add {
        /// Question label exactly as the form shows it
        label: String,

        /// Answer value to store
        value: String,

        /// Question kind (text, choice_single, choice_multi, long_text)
        #[arg(long, default_value = "text")]
        kind: String,
    },

    /// Resolve a question against stored answers
    Match {
        /// Question label to resolve
        question: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Answers { command } => match command {
            AnswersCommands::List => {
                commands::answers::list()?;
            }
            AnswersCommands::Add { label, value, kind } => {
                commands::answers::add(&label, &value, &kind)?;
            }
            AnswersCommands::Match { question } => {
                commands::answers::match_question(&question)?;
            }
        },
        Commands::Listings { failed, retryable } => {
            commands::listings::execute(failed, retryable)?;
        }
        Commands::Relevance { title } => {
            commands::relevance::execute(&title)?;
        }
    }

    Ok(())
}
