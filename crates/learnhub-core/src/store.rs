//! [`AttemptStore`] implementations: in-memory and on-disk JSON.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::attempt::AttemptRecord;
use crate::error::AttemptConflict;
use crate::model::Quiz;
use crate::parser;
use crate::traits::AttemptStore;

/// An in-memory store, for tests and embedding.
#[derive(Default)]
pub struct InMemoryStore {
    quizzes: RwLock<HashMap<String, Quiz>>,
    attempts: RwLock<Vec<AttemptRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the given quizzes.
    pub fn with_quizzes(quizzes: impl IntoIterator<Item = Quiz>) -> Self {
        let quizzes = quizzes.into_iter().map(|q| (q.id.clone(), q)).collect();
        Self {
            quizzes: RwLock::new(quizzes),
            attempts: RwLock::new(Vec::new()),
        }
    }

    pub async fn insert_quiz(&self, quiz: Quiz) {
        self.quizzes.write().await.insert(quiz.id.clone(), quiz);
    }

    /// Total number of stored attempts across all quizzes.
    pub async fn attempt_count(&self) -> usize {
        self.attempts.read().await.len()
    }
}

#[async_trait]
impl AttemptStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load_quiz(&self, quiz_id: &str) -> Result<Option<Quiz>> {
        Ok(self.quizzes.read().await.get(quiz_id).cloned())
    }

    async fn list_attempts(&self, quiz_id: &str, student_id: &str) -> Result<Vec<AttemptRecord>> {
        Ok(self
            .attempts
            .read()
            .await
            .iter()
            .filter(|a| a.quiz_id == quiz_id && a.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn all_attempts(&self, quiz_id: &str) -> Result<Vec<AttemptRecord>> {
        Ok(self
            .attempts
            .read()
            .await
            .iter()
            .filter(|a| a.quiz_id == quiz_id)
            .cloned()
            .collect())
    }

    async fn save_attempt(&self, record: &AttemptRecord) -> Result<()> {
        let mut attempts = self.attempts.write().await;
        let taken = attempts.iter().any(|a| {
            a.quiz_id == record.quiz_id
                && a.student_id == record.student_id
                && a.attempt_number == record.attempt_number
        });
        if taken {
            return Err(conflict(record).into());
        }
        attempts.push(record.clone());
        Ok(())
    }
}

/// A store backed by a quiz directory and a tree of attempt JSON files.
///
/// Attempts live at `<attempts_dir>/<quiz_id>/<student_id>/attempt-<n>.json`.
pub struct DirectoryStore {
    quiz_dir: PathBuf,
    attempts_dir: PathBuf,
}

impl DirectoryStore {
    pub fn new(quiz_dir: impl Into<PathBuf>, attempts_dir: impl Into<PathBuf>) -> Self {
        Self {
            quiz_dir: quiz_dir.into(),
            attempts_dir: attempts_dir.into(),
        }
    }

    fn student_dir(&self, quiz_id: &str, student_id: &str) -> Result<PathBuf> {
        Ok(self
            .attempts_dir
            .join(path_segment(quiz_id)?)
            .join(path_segment(student_id)?))
    }
}

fn conflict(record: &AttemptRecord) -> AttemptConflict {
    AttemptConflict {
        quiz_id: record.quiz_id.clone(),
        student_id: record.student_id.clone(),
        attempt_number: record.attempt_number,
    }
}

/// Reject ids that would escape the attempts directory.
fn path_segment(id: &str) -> Result<&str> {
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
        anyhow::bail!("invalid id for a storage path: {id:?}");
    }
    Ok(id)
}

async fn read_attempts_in(dir: &Path) -> Result<Vec<AttemptRecord>> {
    let mut records = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(records),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read directory: {}", dir.display()))
        }
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read attempt: {}", path.display()))?;
            let record: AttemptRecord = serde_json::from_str(&content)
                .with_context(|| format!("failed to parse attempt: {}", path.display()))?;
            records.push(record);
        }
    }

    records.sort_by_key(|r| r.attempt_number);
    Ok(records)
}

#[async_trait]
impl AttemptStore for DirectoryStore {
    fn name(&self) -> &str {
        "directory"
    }

    async fn load_quiz(&self, quiz_id: &str) -> Result<Option<Quiz>> {
        let quiz_dir = self.quiz_dir.clone();
        let quiz_id = quiz_id.to_string();
        tokio::task::spawn_blocking(move || parser::find_quiz(&quiz_dir, &quiz_id))
            .await
            .context("quiz lookup task failed")?
    }

    async fn list_attempts(&self, quiz_id: &str, student_id: &str) -> Result<Vec<AttemptRecord>> {
        read_attempts_in(&self.student_dir(quiz_id, student_id)?).await
    }

    async fn all_attempts(&self, quiz_id: &str) -> Result<Vec<AttemptRecord>> {
        let quiz_dir = self.attempts_dir.join(path_segment(quiz_id)?);
        let mut entries = match tokio::fs::read_dir(&quiz_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read directory: {}", quiz_dir.display()))
            }
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                records.extend(read_attempts_in(&entry.path()).await?);
            }
        }
        records.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(records)
    }

    /// Writes the record to a temporary file, then hard-links it into place.
    /// The link fails if the attempt number is taken, so an existing record is
    /// never overwritten and readers never see a partial file.
    async fn save_attempt(&self, record: &AttemptRecord) -> Result<()> {
        let dir = self.student_dir(&record.quiz_id, &record.student_id)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let path = dir.join(format!("attempt-{}.json", record.attempt_number));
        let staging = dir.join(format!(".attempt-{}.{}.tmp", record.attempt_number, record.id));
        let json = serde_json::to_string_pretty(record).context("failed to serialize attempt")?;
        tokio::fs::write(&staging, json)
            .await
            .with_context(|| format!("failed to write attempt to {}", staging.display()))?;

        let linked = tokio::fs::hard_link(&staging, &path).await;
        if let Err(e) = tokio::fs::remove_file(&staging).await {
            tracing::warn!("failed to remove {}: {e}", staging.display());
        }

        match linked {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(conflict(record).into())
            }
            Err(e) => Err(e).with_context(|| format!("failed to record {}", path.display())),
        }
    }
}
