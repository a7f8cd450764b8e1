//! The `learnhub validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(quiz_path: PathBuf) -> Result<()> {
    let quizzes = learnhub_core::parser::load_quizzes(&quiz_path)?;
    anyhow::ensure!(
        !quizzes.is_empty(),
        "no quiz files found in {}",
        quiz_path.display()
    );

    let mut total_warnings = 0;

    for quiz in &quizzes {
        println!(
            "Quiz: {} [{}] ({} questions, {} points)",
            quiz.title,
            quiz.id,
            quiz.questions.len(),
            quiz.total_points()
        );

        let warnings = learnhub_core::parser::validate_quiz(quiz);
        for w in &warnings {
            let prefix = w
                .question_index
                .map(|i| format!("  [Q{}]", i + 1))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All quizzes valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
