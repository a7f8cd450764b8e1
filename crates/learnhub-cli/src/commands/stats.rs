//! The `learnhub stats` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use learnhub_core::config::load_config_from;
use learnhub_core::report::QuizReport;
use learnhub_core::store::DirectoryStore;
use learnhub_core::traits::AttemptStore;
use learnhub_report::html::{generate_report_html, write_report_html};

use super::emit;

pub async fn execute(
    quiz_dir: PathBuf,
    quiz_id: String,
    format: String,
    output: Option<PathBuf>,
    attempts_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let attempts_dir = attempts_dir.unwrap_or(config.attempts_dir);
    let store = DirectoryStore::new(quiz_dir, attempts_dir);

    let quiz = store
        .load_quiz(&quiz_id)
        .await?
        .with_context(|| format!("quiz '{quiz_id}' not found"))?;
    let attempts = store.all_attempts(&quiz.id).await?;
    let report = QuizReport::build(&quiz, attempts);

    let rendered = match format.as_str() {
        "json" => serde_json::to_string_pretty(&report)?,
        "markdown" | "md" => report.to_markdown(),
        "html" => match &output {
            Some(path) => {
                write_report_html(&report, path)?;
                eprintln!("HTML report: {}", path.display());
                return Ok(());
            }
            None => generate_report_html(&report),
        },
        "text" => render_text(&report),
        other => anyhow::bail!("unknown format '{other}' (expected text, json, markdown or html)"),
    };
    emit(&rendered, output.as_deref())
}

fn render_text(report: &QuizReport) -> String {
    use comfy_table::{Cell, Table};

    let s = &report.stats;
    let mut out = format!(
        "{}: {} attempts by {} students\n",
        report.quiz.title, s.attempt_count, s.student_count
    );
    if s.attempt_count == 0 {
        out.push_str("No attempts recorded.");
        return out;
    }

    let mut summary = Table::new();
    summary.set_header(vec!["Mean", "Median", "Highest", "Lowest", "Pass rate"]);
    summary.add_row(vec![
        Cell::new(format!("{:.1}%", s.mean_score)),
        Cell::new(format!("{:.1}%", s.median_score)),
        Cell::new(format!("{:.1}%", s.highest_score)),
        Cell::new(format!("{:.1}%", s.lowest_score)),
        Cell::new(format!("{:.1}%", s.pass_rate * 100.0)),
    ]);
    out.push_str(&format!("{summary}\n"));

    let mut questions = Table::new();
    questions.set_header(vec!["Question", "Answered", "Correct", "Rate"]);
    for q in s.per_question.values() {
        questions.add_row(vec![
            Cell::new(format!("Q{}", q.question_index + 1)),
            Cell::new(q.answered),
            Cell::new(q.correct),
            Cell::new(format!("{:.1}%", q.correct_rate * 100.0)),
        ]);
    }
    out.push_str(&questions.to_string());
    out
}
