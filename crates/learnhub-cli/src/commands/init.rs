//! The `learnhub init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("learnhub.toml").exists() {
        println!("learnhub.toml already exists, skipping.");
    } else {
        std::fs::write("learnhub.toml", SAMPLE_CONFIG)?;
        println!("Created learnhub.toml");
    }

    std::fs::create_dir_all("quizzes")?;
    let example_path = std::path::Path::new("quizzes/example.toml");
    if example_path.exists() {
        println!("quizzes/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_QUIZ)?;
        println!("Created quizzes/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: learnhub validate --quiz quizzes/example.toml");
    println!("  2. Run: learnhub grade --quiz quizzes/example.toml --answers answers.json");
    println!("  3. Run: learnhub submit --quiz-dir quizzes --student <id> --answers answers.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# learnhub configuration

attempts_dir = "./learnhub-attempts"
parallelism = 4

[grading]
# exact_match or keywords
theory_strategy = "exact_match"
keyword_threshold = 0.6
# lenient or strict
length_policy = "lenient"
"#;

const EXAMPLE_QUIZ: &str = r#"[quiz]
id = "example"
title = "Example Quiz"
description = "A short quiz to get started"
passing_score = 70
max_attempts = 3
time_limit_minutes = 15
tags = ["basics"]

[[questions]]
question = "Which of these is a primary color?"
type = "multiple_choice"
options = ["Green", "Red", "Purple"]
correct_answer = "1"
points = 1
explanation = "Red, yellow and blue are the primary colors."

[[questions]]
question = "What is the capital of France?"
type = "theory"
correct_answer = "Paris"
points = 2

[[questions]]
question = "What does a compiler do?"
type = "theory"
correct_answer = "It translates source code into machine code"
expected_keywords = ["translates", "source", "machine"]
points = 2
"#;
