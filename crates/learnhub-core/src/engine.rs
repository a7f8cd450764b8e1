//! Attempt service orchestrator.
//!
//! Does what the attempt route handler does around the pure grader: loads the
//! quiz, enforces time and attempt limits, grades, and persists the attempt.
//! Batches of submissions are graded concurrently.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{Mutex, Semaphore};
use uuid::Uuid;

use crate::attempt::{
    check_attempt_limit, check_time_limit, next_attempt_number, AttemptOutcome, AttemptRecord,
    AttemptRequest,
};
use crate::config::GraderConfig;
use crate::error::{AttemptConflict, AttemptError};
use crate::grader::Grader;
use crate::traits::AttemptStore;

/// How many times one submission renumbers after losing a race for an
/// attempt number.
const MAX_SAVE_CONFLICTS: u32 = 8;

/// Configuration for the attempt service.
#[derive(Debug, Clone)]
pub struct AttemptServiceConfig {
    /// How submissions are graded.
    pub grader: GraderConfig,
    /// Maximum concurrent submissions in a batch.
    pub parallelism: usize,
}

impl Default for AttemptServiceConfig {
    fn default() -> Self {
        Self {
            grader: GraderConfig::default(),
            parallelism: 4,
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_submission_start(&self, quiz_id: &str, student_id: &str);
    fn on_submission_graded(&self, student_id: &str, outcome: &AttemptOutcome);
    fn on_submission_rejected(&self, quiz_id: &str, student_id: &str, error: &AttemptError);
    fn on_batch_complete(&self, total: usize, graded: usize, rejected: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_submission_start(&self, _: &str, _: &str) {}
    fn on_submission_graded(&self, _: &str, _: &AttemptOutcome) {}
    fn on_submission_rejected(&self, _: &str, _: &str, _: &AttemptError) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// A submission in a batch that was not recorded.
#[derive(Debug)]
pub struct BatchRejection {
    pub quiz_id: String,
    pub student_id: String,
    pub error: AttemptError,
}

/// Result of a batch submission.
#[derive(Debug)]
pub struct BatchSummary {
    /// (student id, outcome) for every recorded attempt.
    pub graded: Vec<(String, AttemptOutcome)>,
    pub rejected: Vec<BatchRejection>,
    pub duration_ms: u64,
}

/// Grades submissions and records them as attempts.
pub struct AttemptService {
    store: Arc<dyn AttemptStore>,
    grader: Grader,
    parallelism: usize,
    /// Serializes attempt numbering and limit checks.
    record_lock: Mutex<()>,
}

impl AttemptService {
    pub fn new(store: Arc<dyn AttemptStore>, config: AttemptServiceConfig) -> Self {
        Self {
            store,
            grader: Grader::new(config.grader),
            parallelism: config.parallelism.max(1),
            record_lock: Mutex::new(()),
        }
    }

    /// Grade one submission and record it as the learner's next attempt.
    pub async fn submit(&self, request: &AttemptRequest) -> Result<AttemptOutcome, AttemptError> {
        let quiz = self
            .store
            .load_quiz(&request.quiz_id)
            .await?
            .ok_or_else(|| AttemptError::QuizNotFound(request.quiz_id.clone()))?;

        check_time_limit(&quiz, request)?;

        let result = self.grader.grade(&request.answers, &quiz.questions)?;
        let passed = quiz.is_passing(result.score);

        let _guard = self.record_lock.lock().await;

        // Other processes may share the store, so a taken number is retried
        // against a fresh listing.
        let mut conflicts = 0;
        let record = loop {
            let prior = self
                .store
                .list_attempts(&quiz.id, &request.student_id)
                .await?;
            check_attempt_limit(&quiz, prior.len() as u32)?;

            let record = AttemptRecord {
                id: Uuid::new_v4(),
                quiz_id: quiz.id.clone(),
                student_id: request.student_id.clone(),
                attempt_number: next_attempt_number(&prior),
                started_at: request.started_at,
                submitted_at: request.submitted_at,
                result: result.clone(),
                passed,
            };

            match self.store.save_attempt(&record).await {
                Ok(()) => break record,
                Err(e) => match e.downcast::<AttemptConflict>() {
                    Ok(conflict) if conflicts < MAX_SAVE_CONFLICTS => {
                        conflicts += 1;
                        tracing::debug!("{conflict}; renumbering");
                    }
                    Ok(conflict) => return Err(conflict.into()),
                    Err(e) => return Err(e.into()),
                },
            }
        };

        tracing::info!(
            quiz_id = %record.quiz_id,
            student_id = %record.student_id,
            attempt = record.attempt_number,
            score = record.result.score,
            passed,
            "recorded attempt"
        );

        Ok(AttemptOutcome::from_record(&record, quiz.max_attempts))
    }

    /// Grade many submissions concurrently. Individual rejections do not stop
    /// the batch.
    pub async fn submit_batch(
        &self,
        requests: &[AttemptRequest],
        progress: &dyn ProgressReporter,
    ) -> BatchSummary {
        let start = Instant::now();
        let semaphore = Semaphore::new(self.parallelism);

        let mut futures = FuturesUnordered::new();
        for request in requests {
            let semaphore = &semaphore;
            futures.push(async move {
                let outcome = match semaphore.acquire().await {
                    Ok(_permit) => {
                        progress.on_submission_start(&request.quiz_id, &request.student_id);
                        self.submit(request).await
                    }
                    Err(_) => Err(AttemptError::Storage(anyhow::anyhow!("semaphore closed"))),
                };
                (request, outcome)
            });
        }

        let mut graded = Vec::new();
        let mut rejected = Vec::new();
        while let Some((request, outcome)) = futures.next().await {
            match outcome {
                Ok(outcome) => {
                    progress.on_submission_graded(&request.student_id, &outcome);
                    graded.push((request.student_id.clone(), outcome));
                }
                Err(error) => {
                    if error.is_rejection() {
                        tracing::warn!(
                            "submission rejected for {}/{}: {error}",
                            request.quiz_id,
                            request.student_id
                        );
                    } else {
                        tracing::error!(
                            "submission failed for {}/{}: {error:#}",
                            request.quiz_id,
                            request.student_id
                        );
                    }
                    progress.on_submission_rejected(&request.quiz_id, &request.student_id, &error);
                    rejected.push(BatchRejection {
                        quiz_id: request.quiz_id.clone(),
                        student_id: request.student_id.clone(),
                        error,
                    });
                }
            }
        }

        let elapsed = start.elapsed();
        progress.on_batch_complete(requests.len(), graded.len(), rejected.len(), elapsed);

        BatchSummary {
            graded,
            rejected,
            duration_ms: elapsed.as_millis() as u64,
        }
    }
}
