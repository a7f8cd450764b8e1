//! Quiz and submission file parser.
//!
//! Loads quizzes from TOML or JSON files and directories, loads submissions
//! from JSON, and validates quiz definitions.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{default_passing_score, Question, QuestionType, Quiz, Submission, SubmittedAnswer};

/// Intermediate TOML structure for parsing quiz files.
#[derive(Debug, Deserialize)]
struct TomlQuizFile {
    quiz: TomlQuizHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuizHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_passing_score")]
    passing_score: f64,
    #[serde(default)]
    time_limit_minutes: Option<u32>,
    #[serde(default)]
    max_attempts: Option<u32>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    #[serde(default)]
    question: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    correct_answer: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    points: Option<f64>,
    #[serde(default)]
    expected_keywords: Option<Vec<String>>,
    #[serde(default)]
    explanation: String,
}

/// A submission file is either a bare answer list or a full document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SubmissionFile {
    Answers(Vec<SubmittedAnswer>),
    Document(Submission),
}

/// Parse a single quiz file, dispatching on its extension.
pub fn parse_quiz(path: &Path) -> Result<Quiz> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read quiz file: {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => parse_quiz_toml_str(&content, path),
        Some("json") => parse_quiz_json_str(&content, path),
        _ => anyhow::bail!(
            "unsupported quiz file extension (expected .toml or .json): {}",
            path.display()
        ),
    }
}

/// Parse a TOML quiz document (useful for testing).
pub fn parse_quiz_toml_str(content: &str, source_path: &Path) -> Result<Quiz> {
    let parsed: TomlQuizFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| Question {
            question: q.question,
            kind: QuestionType::from(q.kind),
            correct_answer: q.correct_answer,
            options: q.options,
            points: q.points,
            expected_keywords: q.expected_keywords,
            explanation: q.explanation,
        })
        .collect();

    Ok(Quiz {
        id: parsed.quiz.id,
        title: parsed.quiz.title,
        description: parsed.quiz.description,
        questions,
        passing_score: parsed.quiz.passing_score,
        time_limit_minutes: parsed.quiz.time_limit_minutes,
        max_attempts: parsed.quiz.max_attempts,
        tags: parsed.quiz.tags,
    })
}

/// Parse a JSON quiz document in the backend's camelCase shape.
pub fn parse_quiz_json_str(content: &str, source_path: &Path) -> Result<Quiz> {
    serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))
}

/// Recursively load all `.toml` and `.json` quizzes from a directory.
pub fn load_quiz_directory(dir: &Path) -> Result<Vec<Quiz>> {
    let mut quizzes = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            quizzes.extend(load_quiz_directory(&path)?);
        } else if path
            .extension()
            .is_some_and(|ext| ext == "toml" || ext == "json")
        {
            match parse_quiz(&path) {
                Ok(quiz) => quizzes.push(quiz),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(quizzes)
}

/// Find the quiz with `quiz_id` in a directory tree.
pub fn find_quiz(dir: &Path, quiz_id: &str) -> Result<Option<Quiz>> {
    Ok(load_quiz_directory(dir)?
        .into_iter()
        .find(|q| q.id == quiz_id))
}

/// Load quizzes from a single file or a directory.
pub fn load_quizzes(path: &Path) -> Result<Vec<Quiz>> {
    if path.is_dir() {
        load_quiz_directory(path)
    } else {
        Ok(vec![parse_quiz(path)?])
    }
}

/// Parse a submission JSON file.
pub fn parse_submission(path: &Path) -> Result<Submission> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read submission file: {}", path.display()))?;
    parse_submission_str(&content, path)
}

/// Parse a submission from a bare answer array or a `{ "answers": [...] }` document.
pub fn parse_submission_str(content: &str, source_path: &Path) -> Result<Submission> {
    let parsed: SubmissionFile = serde_json::from_str(content).with_context(|| {
        format!(
            "failed to parse submission (expected an answer array or an object with \"answers\"): {}",
            source_path.display()
        )
    })?;

    Ok(match parsed {
        SubmissionFile::Answers(answers) => Submission {
            answers,
            ..Default::default()
        },
        SubmissionFile::Document(submission) => submission,
    })
}

/// A warning from quiz validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question index (if applicable).
    pub question_index: Option<usize>,
    /// Warning message.
    pub message: String,
}

/// Validate a quiz for common authoring mistakes.
pub fn validate_quiz(quiz: &Quiz) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |question_index: Option<usize>, message: String| {
        warnings.push(ValidationWarning {
            question_index,
            message,
        });
    };

    if quiz.questions.is_empty() {
        warn(None, "quiz has no questions".into());
    }

    if !(0.0..=100.0).contains(&quiz.passing_score) {
        warn(
            None,
            format!("passing_score {} is outside 0-100", quiz.passing_score),
        );
    }

    if quiz.max_attempts == Some(0) {
        warn(None, "max_attempts is 0, so no attempt can be recorded".into());
    }

    // Check for duplicate question text
    let mut seen = std::collections::HashSet::new();
    for (i, q) in quiz.questions.iter().enumerate() {
        let text = q.question.trim().to_lowercase();
        if !text.is_empty() && !seen.insert(text) {
            warn(Some(i), format!("duplicate question: {}", q.question.trim()));
        }
    }

    for (i, q) in quiz.questions.iter().enumerate() {
        if q.correct_answer.trim().is_empty() {
            warn(Some(i), "correct answer is empty".into());
        }

        match &q.kind {
            QuestionType::MultipleChoice => {
                if q.options.is_empty() {
                    warn(Some(i), "multiple choice question has no options".into());
                } else {
                    let valid = q
                        .correct_answer
                        .parse::<usize>()
                        .is_ok_and(|idx| idx < q.options.len() && idx.to_string() == q.correct_answer);
                    if !valid && !q.correct_answer.trim().is_empty() {
                        warn(
                            Some(i),
                            format!(
                                "correct answer {:?} is not an option index (0..{})",
                                q.correct_answer,
                                q.options.len()
                            ),
                        );
                    }
                }
            }
            QuestionType::Theory => {}
            QuestionType::Other(kind) => {
                warn(
                    Some(i),
                    format!("unknown question type {kind:?}; it will always be graded incorrect"),
                );
            }
        }

        if q.expected_keywords.is_some() && q.kind != QuestionType::Theory {
            warn(
                Some(i),
                "expected_keywords only apply to theory questions".into(),
            );
        }
    }

    warnings
}
