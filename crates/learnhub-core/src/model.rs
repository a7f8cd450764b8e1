//! Core data model types for the LearnHub grader.
//!
//! These types mirror the JSON documents the LearnHub frontend and backend
//! exchange, so field names serialize in camelCase.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of a quiz question.
///
/// Unrecognized type strings are kept in [`QuestionType::Other`] rather than
/// rejected; such questions are graded as incorrect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    MultipleChoice,
    Theory,
    Other(String),
}

impl QuestionType {
    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Theory => "theory",
            QuestionType::Other(s) => s,
        }
    }

    /// Returns `true` for the types the grader knows how to score.
    pub fn is_known(&self) -> bool {
        !matches!(self, QuestionType::Other(_))
    }
}

impl From<String> for QuestionType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "multiple_choice" => QuestionType::MultipleChoice,
            "theory" => QuestionType::Theory,
            _ => QuestionType::Other(s),
        }
    }
}

impl From<&str> for QuestionType {
    fn from(s: &str) -> Self {
        QuestionType::from(s.to_string())
    }
}

impl From<QuestionType> for String {
    fn from(t: QuestionType) -> Self {
        match t {
            QuestionType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single gradable item in a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// The question text shown to the learner.
    #[serde(default)]
    pub question: String,
    /// Multiple choice or theory.
    #[serde(rename = "type")]
    pub kind: QuestionType,
    /// For multiple choice, the zero-based index of the correct option as a
    /// string (e.g. `"2"`). For theory, the reference answer.
    #[serde(default)]
    pub correct_answer: String,
    /// Answer options (multiple choice only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Weight of this question. Missing or zero means 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<f64>,
    /// Keywords for overlap grading of theory answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_keywords: Option<Vec<String>>,
    /// Shown to the learner after grading.
    #[serde(default)]
    pub explanation: String,
}

impl Question {
    pub fn multiple_choice(question: &str, options: &[&str], correct_index: usize) -> Self {
        Self {
            question: question.to_string(),
            kind: QuestionType::MultipleChoice,
            correct_answer: correct_index.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            points: None,
            expected_keywords: None,
            explanation: String::new(),
        }
    }

    pub fn theory(question: &str, correct_answer: &str) -> Self {
        Self {
            question: question.to_string(),
            kind: QuestionType::Theory,
            correct_answer: correct_answer.to_string(),
            options: Vec::new(),
            points: None,
            expected_keywords: None,
            explanation: String::new(),
        }
    }

    pub fn with_points(mut self, points: f64) -> Self {
        self.points = Some(points);
        self
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.expected_keywords = Some(keywords.iter().map(|k| k.to_string()).collect());
        self
    }

    pub fn with_explanation(mut self, explanation: &str) -> Self {
        self.explanation = explanation.to_string();
        self
    }

    /// Points this question is worth. Absent, zero, or NaN points count as 1.
    pub fn effective_points(&self) -> f64 {
        match self.points {
            Some(p) if p != 0.0 && !p.is_nan() => p,
            _ => 1.0,
        }
    }
}

/// The value a learner picked for a multiple-choice question.
///
/// The frontend sends option indices as strings. Any other JSON value is kept
/// as-is so it can be graded (as incorrect) instead of failing the whole
/// submission at deserialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Other(serde_json::Value),
}

impl AnswerValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(s) => Some(s),
            AnswerValue::Other(_) => None,
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        AnswerValue::Text(s.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(s: String) -> Self {
        AnswerValue::Text(s)
    }
}

/// The question index an answer claims to belong to.
///
/// Only strict pairing reads it. Anything other than a non-negative integer is
/// kept as-is, so lenient grading can ignore it instead of rejecting the
/// submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeclaredIndex {
    Position(usize),
    Other(serde_json::Value),
}

impl DeclaredIndex {
    pub fn position(&self) -> Option<usize> {
        match self {
            DeclaredIndex::Position(i) => Some(*i),
            DeclaredIndex::Other(_) => None,
        }
    }
}

impl From<usize> for DeclaredIndex {
    fn from(i: usize) -> Self {
        DeclaredIndex::Position(i)
    }
}

/// One learner answer.
///
/// Answers are paired with questions by position in the submitted list;
/// `question_index` is informational unless strict pairing is enabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_index: Option<DeclaredIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<AnswerValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_answer: Option<String>,
}

impl SubmittedAnswer {
    /// An answer selecting an option by its string index.
    pub fn choice(selected: impl Into<AnswerValue>) -> Self {
        Self {
            selected_option: Some(selected.into()),
            ..Default::default()
        }
    }

    /// A free-text answer.
    pub fn text(text: &str) -> Self {
        Self {
            text_answer: Some(text.to_string()),
            ..Default::default()
        }
    }

    pub fn at_index(mut self, index: usize) -> Self {
        self.question_index = Some(index.into());
        self
    }
}

/// A submitted answer with its grading outcome, for review display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedAnswer {
    #[serde(flatten)]
    pub answer: SubmittedAnswer,
    pub is_correct: bool,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
}

/// The outcome of grading one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
    /// Same length and order as the submitted answers.
    pub evaluated_answers: Vec<EvaluatedAnswer>,
    /// Percentage of points earned, rounded to one decimal place.
    pub score: f64,
    pub correct_answers: usize,
    /// Number of questions actually graded. Under lenient pairing this is the
    /// answered count, which can be less than the quiz's question count.
    pub total_questions: usize,
    pub earned_points: f64,
    pub total_points: f64,
}

/// An ordered set of questions with attempt settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    /// Minimum score (percent) for an attempt to count as passed.
    #[serde(default = "default_passing_score")]
    pub passing_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub(crate) fn default_passing_score() -> f64 {
    70.0
}

impl Quiz {
    pub fn new(id: &str, title: &str, questions: Vec<Question>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            questions,
            passing_score: default_passing_score(),
            time_limit_minutes: None,
            max_attempts: None,
            tags: Vec::new(),
        }
    }

    /// Sum of effective points over every question in the quiz.
    pub fn total_points(&self) -> f64 {
        self.questions.iter().map(Question::effective_points).sum()
    }

    pub fn is_passing(&self, score: f64) -> bool {
        score >= self.passing_score
    }
}

/// A submission document as uploaded by a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
}
