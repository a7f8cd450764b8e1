//! Aggregate statistics over graded attempts.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::attempt::AttemptRecord;
use crate::model::Quiz;

/// Statistics for one quiz across all recorded attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizStats {
    pub quiz_id: String,
    pub attempt_count: usize,
    pub student_count: usize,
    pub mean_score: f64,
    pub median_score: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
    /// Fraction of attempts that passed, 0.0 to 1.0.
    pub pass_rate: f64,
    /// Best score per student.
    pub best_score_per_student: HashMap<String, f64>,
    /// Per-question statistics keyed by question index.
    pub per_question: BTreeMap<usize, QuestionStats>,
}

/// How learners did on a single question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionStats {
    pub question_index: usize,
    /// Number of attempts that answered this question.
    pub answered: usize,
    pub correct: usize,
    pub correct_rate: f64,
}

impl QuizStats {
    /// Questions ordered from lowest to highest correct rate.
    pub fn hardest_questions(&self, limit: usize) -> Vec<&QuestionStats> {
        let mut questions: Vec<&QuestionStats> = self
            .per_question
            .values()
            .filter(|q| q.answered > 0)
            .collect();
        questions.sort_by(|a, b| {
            a.correct_rate
                .total_cmp(&b.correct_rate)
                .then(a.question_index.cmp(&b.question_index))
        });
        questions.truncate(limit);
        questions
    }
}

/// Median of a list of scores; 0.0 for an empty list.
pub fn median(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Compute statistics for `quiz` from attempts. Attempts for other quizzes
/// are ignored.
pub fn compute_quiz_stats(quiz: &Quiz, attempts: &[AttemptRecord]) -> QuizStats {
    let attempts: Vec<&AttemptRecord> = attempts.iter().filter(|a| a.quiz_id == quiz.id).collect();

    let mut per_question: BTreeMap<usize, QuestionStats> = (0..quiz.questions.len())
        .map(|i| {
            (
                i,
                QuestionStats {
                    question_index: i,
                    answered: 0,
                    correct: 0,
                    correct_rate: 0.0,
                },
            )
        })
        .collect();

    if attempts.is_empty() {
        return QuizStats {
            quiz_id: quiz.id.clone(),
            attempt_count: 0,
            student_count: 0,
            mean_score: 0.0,
            median_score: 0.0,
            highest_score: 0.0,
            lowest_score: 0.0,
            pass_rate: 0.0,
            best_score_per_student: HashMap::new(),
            per_question,
        };
    }

    let scores: Vec<f64> = attempts.iter().map(|a| a.result.score).collect();
    let n = scores.len() as f64;

    let mut best_score_per_student: HashMap<String, f64> = HashMap::new();
    for a in &attempts {
        let best = best_score_per_student
            .entry(a.student_id.clone())
            .or_insert(a.result.score);
        if a.result.score > *best {
            *best = a.result.score;
        }
    }

    for a in &attempts {
        for (i, evaluated) in a.result.evaluated_answers.iter().enumerate() {
            let stats = per_question.entry(i).or_insert_with(|| QuestionStats {
                question_index: i,
                answered: 0,
                correct: 0,
                correct_rate: 0.0,
            });
            stats.answered += 1;
            if evaluated.is_correct {
                stats.correct += 1;
            }
        }
    }
    for stats in per_question.values_mut() {
        if stats.answered > 0 {
            stats.correct_rate = stats.correct as f64 / stats.answered as f64;
        }
    }

    let students: HashSet<&str> = attempts.iter().map(|a| a.student_id.as_str()).collect();

    QuizStats {
        quiz_id: quiz.id.clone(),
        attempt_count: attempts.len(),
        student_count: students.len(),
        mean_score: scores.iter().sum::<f64>() / n,
        median_score: median(&scores),
        highest_score: scores.iter().copied().fold(f64::MIN, f64::max),
        lowest_score: scores.iter().copied().fold(f64::MAX, f64::min),
        pass_rate: attempts.iter().filter(|a| a.passed).count() as f64 / n,
        best_score_per_student,
        per_question,
    }
}
