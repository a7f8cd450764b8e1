//! Error types for grading, attempts, and configuration.
//!
//! Grading and attempt errors are typed so callers (an HTTP handler, the CLI)
//! can map them to responses without string matching.

use thiserror::Error;

/// Errors raised while pairing answers with questions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradingError {
    /// More answers were submitted than the quiz has questions.
    #[error("answer {index} has no matching question (quiz has {question_count} questions)")]
    AnswerWithoutQuestion { index: usize, question_count: usize },

    /// Strict pairing: the answer count differs from the question count.
    #[error("submission has {answers} answers but quiz has {questions} questions")]
    LengthMismatch { answers: usize, questions: usize },

    /// Strict pairing: an answer declares a question index other than its position.
    #[error("answer at position {position} declares question index {declared}")]
    IndexMismatch { position: usize, declared: usize },

    /// Strict pairing: an answer declares a question index that is not a
    /// non-negative integer.
    #[error("answer at position {position} declares an invalid question index {declared}")]
    InvalidIndex { position: usize, declared: String },
}

/// Errors from the attempt lifecycle around grading.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// No quiz with this id exists in the store.
    #[error("quiz not found: {0}")]
    QuizNotFound(String),

    /// The learner has used every allowed attempt.
    #[error("no attempts left for quiz {quiz_id}: {used} of {max} used")]
    AttemptsExhausted { quiz_id: String, used: u32, max: u32 },

    /// The submission arrived after the quiz time limit.
    #[error("time limit of {limit_minutes} minutes exceeded ({elapsed_secs}s elapsed)")]
    TimeLimitExceeded { limit_minutes: u32, elapsed_secs: i64 },

    /// The submission could not be graded.
    #[error(transparent)]
    Grading(#[from] GradingError),

    /// Another writer kept claiming the attempt number this submission needed.
    #[error(transparent)]
    Conflict(#[from] AttemptConflict),

    /// The attempt store failed.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// A store already holds an attempt with this number for the learner.
///
/// Stores return it inside their `anyhow::Error` so the attempt service can
/// renumber and retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("attempt {attempt_number} by {student_id} on quiz {quiz_id} is already recorded")]
pub struct AttemptConflict {
    pub quiz_id: String,
    pub student_id: String,
    pub attempt_number: u32,
}

impl AttemptError {
    /// Returns `true` if the error is a business-rule rejection rather than a
    /// storage failure.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, AttemptError::Storage(_))
    }
}

/// Invalid grader configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("keyword threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("unknown theory strategy: {0} (expected exact_match or keywords)")]
    UnknownStrategy(String),

    #[error("unknown length policy: {0} (expected lenient or strict)")]
    UnknownLengthPolicy(String),

    #[error("parallelism must be at least 1")]
    InvalidParallelism,
}
