//! learnhub CLI: grade submissions, record attempts, and report on quizzes.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "learnhub", version, about = "LearnHub quiz grader")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a submission against a quiz without recording it
    Grade {
        /// Quiz file (.toml or .json)
        #[arg(long)]
        quiz: PathBuf,

        /// Submission JSON: an answer array or an object with "answers"
        #[arg(long)]
        answers: PathBuf,

        /// Theory grading strategy: exact, keywords
        #[arg(long)]
        strategy: Option<String>,

        /// Reject submissions whose answers do not line up with the questions
        #[arg(long)]
        strict: bool,

        /// Keyword coverage needed for a theory answer under the keywords strategy
        #[arg(long)]
        threshold: Option<f64>,

        /// Output format: text, json, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Write output to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Grade a submission and record it as the learner's next attempt
    Submit {
        /// Directory of quiz files
        #[arg(long)]
        quiz_dir: PathBuf,

        /// Quiz id (defaults to the id in the submission file)
        #[arg(long)]
        quiz_id: Option<String>,

        /// Student id (defaults to the id in the submission file)
        #[arg(long)]
        student: Option<String>,

        /// Submission JSON
        #[arg(long)]
        answers: PathBuf,

        /// Attempt storage directory (overrides config)
        #[arg(long)]
        attempts_dir: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate quiz files
    Validate {
        /// Path to a quiz file or directory
        #[arg(long)]
        quiz: PathBuf,
    },

    /// Summarize recorded attempts on a quiz
    Stats {
        /// Directory of quiz files
        #[arg(long)]
        quiz_dir: PathBuf,

        /// Quiz id
        #[arg(long)]
        quiz_id: String,

        /// Output format: text, json, markdown, html
        #[arg(long, default_value = "text")]
        format: String,

        /// Write output to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Attempt storage directory (overrides config)
        #[arg(long)]
        attempts_dir: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example quiz
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "learnhub=info"
                    .parse()
                    .unwrap_or_else(|_| tracing::level_filters::LevelFilter::INFO.into()),
            ),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            quiz,
            answers,
            strategy,
            strict,
            threshold,
            format,
            output,
            config,
        } => commands::grade::execute(commands::grade::GradeArgs {
            quiz,
            answers,
            strategy,
            strict,
            threshold,
            format,
            output,
            config,
        }),
        Commands::Submit {
            quiz_dir,
            quiz_id,
            student,
            answers,
            attempts_dir,
            config,
        } => {
            commands::submit::execute(quiz_dir, quiz_id, student, answers, attempts_dir, config)
                .await
        }
        Commands::Validate { quiz } => commands::validate::execute(quiz),
        Commands::Stats {
            quiz_dir,
            quiz_id,
            format,
            output,
            attempts_dir,
            config,
        } => {
            commands::stats::execute(quiz_dir, quiz_id, format, output, attempts_dir, config)
                .await
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
