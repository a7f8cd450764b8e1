//! Storage seam between the attempt service and the backend that owns
//! quiz and attempt documents.

use async_trait::async_trait;

use crate::attempt::AttemptRecord;
use crate::model::Quiz;

/// Loads quizzes and persists graded attempts.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Human-readable store name (e.g. "memory").
    fn name(&self) -> &str;

    /// Fetch a quiz by id. `Ok(None)` means it does not exist.
    async fn load_quiz(&self, quiz_id: &str) -> anyhow::Result<Option<Quiz>>;

    /// Prior attempts by one learner on one quiz, oldest first.
    async fn list_attempts(
        &self,
        quiz_id: &str,
        student_id: &str,
    ) -> anyhow::Result<Vec<AttemptRecord>>;

    /// Every recorded attempt on a quiz.
    async fn all_attempts(&self, quiz_id: &str) -> anyhow::Result<Vec<AttemptRecord>>;

    /// Persist a graded attempt. Never overwrites: if the learner already has
    /// an attempt with this number, fails with a
    /// [`crate::error::AttemptConflict`].
    async fn save_attempt(&self, record: &AttemptRecord) -> anyhow::Result<()>;
}
