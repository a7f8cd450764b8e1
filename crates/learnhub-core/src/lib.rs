//! learnhub-core: quiz grading engine, attempt lifecycle, and statistics.
//!
//! The grader in [`grader`] is a pure function over a quiz's questions and a
//! learner's answers. Everything else in this crate is the plumbing a LearnHub
//! backend wraps around it: loading quizzes, enforcing attempt rules,
//! persisting attempts, and summarizing results.

pub mod attempt;
pub mod config;
pub mod engine;
pub mod error;
pub mod grader;
pub mod model;
pub mod parser;
pub mod report;
pub mod statistics;
pub mod store;
pub mod traits;

pub use grader::{evaluate_multiple_choice, evaluate_quiz, evaluate_theory, Grader};
