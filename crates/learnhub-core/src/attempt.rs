//! Attempt records and the rules applied around grading a submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AttemptError;
use crate::model::{GradingResult, Quiz, Submission, SubmittedAnswer};

/// One learner's graded submission against a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub id: Uuid,
    pub quiz_id: String,
    pub student_id: String,
    /// 1-based attempt counter for this learner and quiz.
    pub attempt_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
    pub result: GradingResult,
    pub passed: bool,
}

/// A request to grade and record one attempt.
#[derive(Debug, Clone)]
pub struct AttemptRequest {
    pub quiz_id: String,
    pub student_id: String,
    pub answers: Vec<SubmittedAnswer>,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
}

impl AttemptRequest {
    pub fn new(quiz_id: &str, student_id: &str, answers: Vec<SubmittedAnswer>) -> Self {
        Self {
            quiz_id: quiz_id.to_string(),
            student_id: student_id.to_string(),
            answers,
            started_at: None,
            submitted_at: Utc::now(),
        }
    }

    /// Build a request from an uploaded submission document. Explicit ids
    /// override the ones in the document.
    pub fn from_submission(
        submission: Submission,
        quiz_id: Option<&str>,
        student_id: Option<&str>,
    ) -> anyhow::Result<Self> {
        let quiz_id = quiz_id
            .map(str::to_string)
            .or(submission.quiz_id)
            .ok_or_else(|| anyhow::anyhow!("submission does not name a quiz id"))?;
        let student_id = student_id
            .map(str::to_string)
            .or(submission.student_id)
            .ok_or_else(|| anyhow::anyhow!("submission does not name a student id"))?;

        Ok(Self {
            quiz_id,
            student_id,
            answers: submission.answers,
            started_at: submission.started_at,
            submitted_at: Utc::now(),
        })
    }

    pub fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    pub fn with_submitted_at(mut self, submitted_at: DateTime<Utc>) -> Self {
        self.submitted_at = submitted_at;
        self
    }
}

/// What the client receives after a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutcome {
    pub attempt_id: Uuid,
    #[serde(flatten)]
    pub result: GradingResult,
    pub passed: bool,
    pub attempt_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

impl AttemptOutcome {
    pub fn from_record(record: &AttemptRecord, max_attempts: Option<u32>) -> Self {
        Self {
            attempt_id: record.id,
            result: record.result.clone(),
            passed: record.passed,
            attempt_number: record.attempt_number,
            max_attempts,
        }
    }

    /// Attempts still available after this one, if the quiz caps attempts.
    pub fn attempts_remaining(&self) -> Option<u32> {
        self.max_attempts
            .map(|max| max.saturating_sub(self.attempt_number))
    }
}

/// Reject submissions that arrive after the quiz time limit.
///
/// Only enforced when both the quiz limit and the request start time are known.
pub fn check_time_limit(quiz: &Quiz, request: &AttemptRequest) -> Result<(), AttemptError> {
    let (Some(limit_minutes), Some(started_at)) = (quiz.time_limit_minutes, request.started_at)
    else {
        return Ok(());
    };

    let elapsed = request.submitted_at - started_at;
    if elapsed > chrono::Duration::minutes(i64::from(limit_minutes)) {
        return Err(AttemptError::TimeLimitExceeded {
            limit_minutes,
            elapsed_secs: elapsed.num_seconds(),
        });
    }
    Ok(())
}

/// Reject a new attempt when the learner has used every allowed one.
pub fn check_attempt_limit(quiz: &Quiz, used: u32) -> Result<(), AttemptError> {
    match quiz.max_attempts {
        Some(max) if used >= max => Err(AttemptError::AttemptsExhausted {
            quiz_id: quiz.id.clone(),
            used,
            max,
        }),
        _ => Ok(()),
    }
}

/// The number the next attempt receives, given the learner's prior attempts.
pub fn next_attempt_number(prior: &[AttemptRecord]) -> u32 {
    prior
        .iter()
        .map(|a| a.attempt_number)
        .max()
        .unwrap_or(0)
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Question;

    fn timed_quiz(limit: Option<u32>) -> Quiz {
        let mut quiz = Quiz::new("timed", "Timed", vec![Question::theory("Q", "A")]);
        quiz.time_limit_minutes = limit;
        quiz
    }

    fn empty_result() -> GradingResult {
        GradingResult {
            evaluated_answers: vec![],
            score: 0.0,
            correct_answers: 0,
            total_questions: 0,
            earned_points: 0.0,
            total_points: 0.0,
        }
    }

    #[test]
    fn time_limit_enforced_only_when_known() {
        let start = Utc::now();
        let late = AttemptRequest::new("timed", "s1", vec![])
            .with_started_at(start)
            .with_submitted_at(start + chrono::Duration::minutes(11));

        assert!(check_time_limit(&timed_quiz(None), &late).is_ok());
        assert!(matches!(
            check_time_limit(&timed_quiz(Some(10)), &late),
            Err(AttemptError::TimeLimitExceeded {
                limit_minutes: 10,
                elapsed_secs: 660
            })
        ));

        let untimed = AttemptRequest::new("timed", "s1", vec![]);
        assert!(check_time_limit(&timed_quiz(Some(10)), &untimed).is_ok());

        let on_time = AttemptRequest::new("timed", "s1", vec![])
            .with_started_at(start)
            .with_submitted_at(start + chrono::Duration::minutes(10));
        assert!(check_time_limit(&timed_quiz(Some(10)), &on_time).is_ok());
    }

    #[test]
    fn attempt_limit() {
        let mut quiz = timed_quiz(None);
        assert!(check_attempt_limit(&quiz, 100).is_ok());
        quiz.max_attempts = Some(2);
        assert!(check_attempt_limit(&quiz, 1).is_ok());
        assert!(matches!(
            check_attempt_limit(&quiz, 2),
            Err(AttemptError::AttemptsExhausted { used: 2, max: 2, .. })
        ));
    }

    #[test]
    fn next_number_follows_highest_prior() {
        assert_eq!(next_attempt_number(&[]), 1);
        let record = |n| AttemptRecord {
            id: Uuid::nil(),
            quiz_id: "q".into(),
            student_id: "s".into(),
            attempt_number: n,
            started_at: None,
            submitted_at: Utc::now(),
            result: empty_result(),
            passed: false,
        };
        assert_eq!(next_attempt_number(&[record(1), record(3)]), 4);
    }

    #[test]
    fn request_from_submission_prefers_explicit_ids() {
        let submission = Submission {
            quiz_id: Some("from-file".into()),
            student_id: None,
            started_at: None,
            answers: vec![SubmittedAnswer::text("x")],
        };
        let request =
            AttemptRequest::from_submission(submission.clone(), None, Some("alice")).unwrap();
        assert_eq!(request.quiz_id, "from-file");
        assert_eq!(request.student_id, "alice");
        assert_eq!(request.answers.len(), 1);

        let err = AttemptRequest::from_submission(submission, None, None).unwrap_err();
        assert!(err.to_string().contains("student id"));
    }

    #[test]
    fn outcome_serializes_like_the_attempt_payload() {
        let outcome = AttemptOutcome {
            attempt_id: Uuid::nil(),
            result: empty_result(),
            passed: true,
            attempt_number: 2,
            max_attempts: Some(3),
        };
        assert_eq!(outcome.attempts_remaining(), Some(1));
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["attemptNumber"], 2);
        assert_eq!(value["maxAttempts"], 3);
        assert_eq!(value["passed"], true);
        assert_eq!(value["score"], 0.0);
        assert!(value["evaluatedAnswers"].is_array());
    }
}
