//! Quiz report types with JSON persistence and a markdown summary.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attempt::AttemptRecord;
use crate::model::Quiz;
use crate::statistics::{compute_quiz_stats, QuizStats};

/// A snapshot of every attempt on a quiz with aggregate statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub quiz: QuizSummary,
    pub attempts: Vec<AttemptRecord>,
    pub stats: QuizStats,
}

/// Summary of a quiz (without the question definitions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
    pub question_count: usize,
    pub total_points: f64,
    pub passing_score: f64,
    /// Question texts by index, for labelling per-question statistics.
    #[serde(default)]
    pub question_texts: Vec<String>,
}

impl QuizSummary {
    pub fn from_quiz(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id.clone(),
            title: quiz.title.clone(),
            question_count: quiz.questions.len(),
            total_points: quiz.total_points(),
            passing_score: quiz.passing_score,
            question_texts: quiz.questions.iter().map(|q| q.question.clone()).collect(),
        }
    }

    fn question_label(&self, index: usize) -> String {
        match self.question_texts.get(index) {
            Some(text) if !text.is_empty() => format!("Q{} {}", index + 1, text),
            _ => format!("Q{}", index + 1),
        }
    }
}

impl QuizReport {
    /// Build a report from a quiz and its recorded attempts.
    pub fn build(quiz: &Quiz, attempts: Vec<AttemptRecord>) -> Self {
        let stats = compute_quiz_stats(quiz, &attempts);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            quiz: QuizSummary::from_quiz(quiz),
            attempts,
            stats,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: QuizReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let s = &self.stats;
        let mut md = String::new();

        md.push_str(&format!("## {}\n\n", self.quiz.title));
        md.push_str(&format!(
            "**Summary:** {} attempts by {} students, mean {:.1}%, median {:.1}%, pass rate {:.1}%\n\n",
            s.attempt_count,
            s.student_count,
            s.mean_score,
            s.median_score,
            s.pass_rate * 100.0
        ));

        if s.attempt_count == 0 {
            md.push_str("No attempts recorded.\n");
            return md;
        }

        md.push_str(&format!(
            "Highest score {:.1}%, lowest {:.1}%, passing score {:.1}%\n\n",
            s.highest_score, s.lowest_score, self.quiz.passing_score
        ));

        let hardest = s.hardest_questions(5);
        if !hardest.is_empty() {
            md.push_str("### Hardest questions\n\n");
            md.push_str("| Question | Answered | Correct | Rate |\n");
            md.push_str("|----------|----------|---------|------|\n");
            for q in hardest {
                md.push_str(&format!(
                    "| {} | {} | {} | {:.1}% |\n",
                    self.quiz.question_label(q.question_index),
                    q.answered,
                    q.correct,
                    q.correct_rate * 100.0
                ));
            }
            md.push('\n');
        }

        md
    }
}
