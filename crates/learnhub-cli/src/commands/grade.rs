//! The `learnhub grade` command.

use std::path::PathBuf;

use anyhow::Result;

use learnhub_core::config::{load_config_from, GraderConfig, LengthPolicy, TheoryStrategy};
use learnhub_core::model::{GradingResult, Quiz};
use learnhub_core::{parser, Grader};
use learnhub_report::html::{generate_attempt_html, write_attempt_html};

use super::emit;

pub struct GradeArgs {
    pub quiz: PathBuf,
    pub answers: PathBuf,
    pub strategy: Option<String>,
    pub strict: bool,
    pub threshold: Option<f64>,
    pub format: String,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

pub fn execute(args: GradeArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let grader_config = apply_flags(config.grading, &args)?;

    let quiz = parser::parse_quiz(&args.quiz)?;
    let submission = parser::parse_submission(&args.answers)?;

    let result = Grader::new(grader_config).grade(&submission.answers, &quiz.questions)?;

    match args.format.as_str() {
        "json" => emit(&serde_json::to_string_pretty(&result)?, args.output.as_deref())?,
        "html" => match &args.output {
            Some(path) => {
                write_attempt_html(&quiz, &result, path)?;
                eprintln!("HTML review: {}", path.display());
            }
            None => println!("{}", generate_attempt_html(&quiz, &result)),
        },
        "text" => emit(&render_text(&quiz, &result), args.output.as_deref())?,
        other => anyhow::bail!("unknown format '{other}' (expected text, json or html)"),
    }

    Ok(())
}

fn apply_flags(mut config: GraderConfig, args: &GradeArgs) -> Result<GraderConfig> {
    if let Some(strategy) = &args.strategy {
        config = config.with_theory_strategy(strategy.parse::<TheoryStrategy>()?);
    }
    if args.strict {
        config = config.with_length_policy(LengthPolicy::Strict);
    }
    if let Some(threshold) = args.threshold {
        config = config.with_keyword_threshold(threshold);
    }
    config.validate()?;
    Ok(config)
}

fn render_text(quiz: &Quiz, result: &GradingResult) -> String {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["#", "Type", "Points", "Result", "Correct answer"]);

    for (i, evaluated) in result.evaluated_answers.iter().enumerate() {
        let (kind, points) = quiz
            .questions
            .get(i)
            .map(|q| (q.kind.to_string(), q.effective_points()))
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(kind),
            Cell::new(points),
            Cell::new(if evaluated.is_correct { "correct" } else { "incorrect" }),
            Cell::new(&evaluated.correct_answer),
        ]);
    }

    let verdict = if quiz.is_passing(result.score) {
        "PASS"
    } else {
        "FAIL"
    };
    format!(
        "{}\n{table}\nScore: {:.1}% ({}/{} correct, {}/{} points) {verdict}",
        quiz.title,
        result.score,
        result.correct_answers,
        result.total_questions,
        result.earned_points,
        result.total_points,
    )
}
