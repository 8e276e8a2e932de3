//! The drillkit command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "drillkit", version, about = "Quiz practice, mock exams, and an error book")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config and example question bank
    Init,

    /// Validate question bank TOML files
    Validate {
        /// Path to bank file or directory
        #[arg(long)]
        bank: PathBuf,
    },

    /// Generate questions and print them
    Generate {
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        difficulty: Option<String>,

        #[arg(long)]
        count: Option<usize>,

        /// Provider name from the config
        #[arg(long)]
        provider: Option<String>,

        /// Save the questions as a named practice
        #[arg(long)]
        save: Option<String>,

        /// Export the questions as HTML
        #[arg(long)]
        html: Option<PathBuf>,

        /// Include answers in the HTML export
        #[arg(long)]
        answers: bool,
    },

    /// Turn a study file into practice questions
    Upload {
        /// File name of the study material
        #[arg(long)]
        file: String,

        #[arg(long, default_value = "10")]
        count: usize,

        /// Save the result as a practice exam
        #[arg(long)]
        save: bool,
    },

    /// Run an interactive practice session
    Practice {
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        difficulty: Option<String>,

        #[arg(long)]
        count: Option<usize>,

        #[arg(long)]
        provider: Option<String>,

        /// Take a catalog exam instead
        #[arg(long, conflicts_with_all = ["category", "difficulty", "count"])]
        exam: Option<String>,

        /// Countdown in seconds
        #[arg(long, conflicts_with = "exam")]
        time_limit: Option<u64>,

        /// Write a session report (.json or .html)
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List or delete exams
    Exams {
        /// Delete a practice exam
        #[arg(long)]
        delete: Option<String>,
    },

    /// Browse and manage the error book
    Errors {
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        difficulty: Option<String>,

        #[arg(long)]
        reason: Option<String>,

        /// Match prompt text and tags
        #[arg(long)]
        search: Option<String>,

        /// date, difficulty, or category
        #[arg(long, default_value = "date")]
        sort: String,

        /// Only records not yet reviewed
        #[arg(long)]
        unreviewed: bool,

        /// Flip the reviewed flag of a record
        #[arg(long)]
        toggle: Option<String>,

        /// Delete a record
        #[arg(long)]
        delete: Option<String>,

        /// Print summary statistics
        #[arg(long)]
        stats: bool,
    },

    /// Manage the weekly study plan
    Plan {
        #[command(subcommand)]
        action: commands::plan::PlanAction,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("drillkit=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Generate {
            category,
            difficulty,
            count,
            provider,
            save,
            html,
            answers,
        } => {
            commands::generate::execute(
                commands::generate::GenerateArgs {
                    category,
                    difficulty,
                    count,
                    provider,
                    save,
                    html,
                    answers,
                },
                config,
            )
            .await
        }
        Commands::Upload { file, count, save } => {
            commands::upload::execute(file, count, save, config).await
        }
        Commands::Practice {
            category,
            difficulty,
            count,
            provider,
            exam,
            time_limit,
            report,
        } => {
            commands::practice::execute(
                commands::practice::PracticeArgs {
                    category,
                    difficulty,
                    count,
                    provider,
                    exam,
                    time_limit,
                    report,
                },
                config,
            )
            .await
        }
        Commands::Exams { delete } => commands::exams::execute(delete, config),
        Commands::Errors {
            category,
            difficulty,
            reason,
            search,
            sort,
            unreviewed,
            toggle,
            delete,
            stats,
        } => commands::errors::execute(
            commands::errors::ErrorsArgs {
                category,
                difficulty,
                reason,
                search,
                sort,
                unreviewed,
                toggle,
                delete,
                stats,
            },
            config,
        ),
        Commands::Plan { action } => commands::plan::execute(action, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
