//! The `learnhub submit` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use learnhub_core::attempt::AttemptRequest;
use learnhub_core::config::load_config_from;
use learnhub_core::engine::{AttemptService, AttemptServiceConfig};
use learnhub_core::parser;
use learnhub_core::store::DirectoryStore;

pub async fn execute(
    quiz_dir: PathBuf,
    quiz_id: Option<String>,
    student: Option<String>,
    answers: PathBuf,
    attempts_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        quiz_dir.is_dir(),
        "quiz directory not found: {}",
        quiz_dir.display()
    );

    let config = load_config_from(config_path.as_deref())?;
    let attempts_dir = attempts_dir.unwrap_or(config.attempts_dir);

    let submission = parser::parse_submission(&answers)?;
    let request = AttemptRequest::from_submission(submission, quiz_id.as_deref(), student.as_deref())?;

    let store = Arc::new(DirectoryStore::new(quiz_dir, attempts_dir));
    let service = AttemptService::new(
        store,
        AttemptServiceConfig {
            grader: config.grading,
            parallelism: config.parallelism,
        },
    );

    let outcome = service.submit(&request).await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    let remaining = match outcome.attempts_remaining() {
        Some(n) => format!(", {n} attempt(s) remaining"),
        None => String::new(),
    };
    eprintln!(
        "Attempt {} for {} on {}: {:.1}% {}{remaining}",
        outcome.attempt_number,
        request.student_id,
        request.quiz_id,
        outcome.result.score,
        if outcome.passed { "PASS" } else { "FAIL" },
    );

    Ok(())
}
