//! End-to-end attempt flow over the bundled quiz files.
//!
//! These tests drive the attempt service against a directory store the same
//! way the `submit` and `stats` commands do.

use std::sync::Arc;

use chrono::{Duration, Utc};
use learnhub_core::attempt::AttemptRequest;
use learnhub_core::engine::{AttemptService, AttemptServiceConfig, NoopReporter};
use learnhub_core::error::AttemptError;
use learnhub_core::model::SubmittedAnswer;
use learnhub_core::report::QuizReport;
use learnhub_core::store::DirectoryStore;
use learnhub_core::traits::AttemptStore;

fn make_service() -> (tempfile::TempDir, Arc<DirectoryStore>, AttemptService) {
    let attempts = tempfile::tempdir().unwrap();
    let store = Arc::new(DirectoryStore::new("../../quizzes", attempts.path()));
    let service = AttemptService::new(store.clone(), AttemptServiceConfig::default());
    (attempts, store, service)
}

fn capitals_answers(peru: &str) -> Vec<SubmittedAnswer> {
    vec![SubmittedAnswer::choice("1"), SubmittedAnswer::text(peru)]
}

#[tokio::test]
async fn e2e_submit_and_report() {
    let (_attempts, store, service) = make_service();

    let outcome = service
        .submit(&AttemptRequest::new(
            "world-capitals",
            "alice",
            capitals_answers("Lima"),
        ))
        .await
        .unwrap();
    assert_eq!(outcome.result.score, 100.0);
    assert!(outcome.passed);
    assert_eq!(outcome.attempt_number, 1);
    assert_eq!(outcome.attempts_remaining(), None);

    service
        .submit(&AttemptRequest::new(
            "world-capitals",
            "bob",
            capitals_answers("Cusco"),
        ))
        .await
        .unwrap();

    let quiz = store.load_quiz("world-capitals").await.unwrap().unwrap();
    let report = QuizReport::build(&quiz, store.all_attempts("world-capitals").await.unwrap());
    assert_eq!(report.stats.attempt_count, 2);
    assert_eq!(report.stats.student_count, 2);
    // alice 100, bob 33.3; passing score is 50
    assert_eq!(report.stats.pass_rate, 0.5);
    assert_eq!(report.stats.per_question[&1].correct, 1);
}

#[tokio::test]
async fn e2e_time_limit_rejects_late_submission() {
    let (_attempts, store, service) = make_service();
    let now = Utc::now();

    let late = AttemptRequest::new("world-capitals", "carol", capitals_answers("Lima"))
        .with_started_at(now - Duration::minutes(11))
        .with_submitted_at(now);
    let err = service.submit(&late).await.unwrap_err();
    assert!(matches!(
        err,
        AttemptError::TimeLimitExceeded {
            limit_minutes: 10,
            ..
        }
    ));
    assert!(store
        .list_attempts("world-capitals", "carol")
        .await
        .unwrap()
        .is_empty());

    let on_time = AttemptRequest::new("world-capitals", "carol", capitals_answers("Lima"))
        .with_started_at(now - Duration::minutes(9))
        .with_submitted_at(now);
    assert!(service.submit(&on_time).await.is_ok());
}

#[tokio::test]
async fn e2e_batch_respects_attempt_limit() {
    let (_attempts, store, service) = make_service();

    let answers = vec![
        SubmittedAnswer::choice("1"),
        SubmittedAnswer::text("Tokyo"),
        SubmittedAnswer::text("The Amazon"),
    ];
    let requests: Vec<AttemptRequest> = (0..5)
        .map(|_| AttemptRequest::new("geography", "dave", answers.clone()))
        .collect();

    let summary = service.submit_batch(&requests, &NoopReporter).await;
    assert_eq!(summary.graded.len(), 2);
    assert_eq!(summary.rejected.len(), 3);
    assert!(summary
        .rejected
        .iter()
        .all(|r| matches!(r.error, AttemptError::AttemptsExhausted { max: 2, .. })));

    let mut numbers: Vec<u32> = store
        .list_attempts("geography", "dave")
        .await
        .unwrap()
        .iter()
        .map(|a| a.attempt_number)
        .collect();
    numbers.sort();
    assert_eq!(numbers, vec![1, 2]);
}

#[tokio::test]
async fn e2e_grading_errors_are_not_recorded() {
    let (_attempts, store, service) = make_service();

    let too_many = vec![
        SubmittedAnswer::choice("1"),
        SubmittedAnswer::text("Lima"),
        SubmittedAnswer::text("extra"),
    ];
    let err = service
        .submit(&AttemptRequest::new("world-capitals", "erin", too_many))
        .await
        .unwrap_err();
    assert!(matches!(err, AttemptError::Grading(_)));
    assert!(err.is_rejection());
    assert!(store
        .all_attempts("world-capitals")
        .await
        .unwrap()
        .is_empty());
}
