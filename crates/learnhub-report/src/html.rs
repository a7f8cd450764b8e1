//! HTML report generator.
//!
//! Produces self-contained HTML files with all CSS/JS inlined: a review page
//! for a single graded attempt, and a quiz report across all attempts.

use anyhow::Result;
use std::path::Path;

use learnhub_core::model::{EvaluatedAnswer, GradingResult, Question, QuestionType, Quiz};
use learnhub_core::report::QuizReport;
use learnhub_core::statistics::QuestionStats;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn push_head(html: &mut String, title: &str) {
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", html_escape(title)));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");
}

fn push_raw_json(html: &mut String, json: &str) {
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&json.replace('<', "&lt;").replace('>', "&gt;"));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");
}

/// Render what the learner answered, resolving option indices to option text.
fn describe_answer(evaluated: &EvaluatedAnswer, question: Option<&Question>) -> String {
    let answer = &evaluated.answer;
    if let Some(selected) = &answer.selected_option {
        return match selected.as_text() {
            Some(index) => describe_option(index, question),
            None => serde_json::to_string(selected).unwrap_or_default(),
        };
    }
    answer.text_answer.clone().unwrap_or_else(|| "-".to_string())
}

fn describe_option(index: &str, question: Option<&Question>) -> String {
    let option = question
        .filter(|q| q.kind == QuestionType::MultipleChoice)
        .and_then(|q| index.parse::<usize>().ok().and_then(|i| q.options.get(i)));
    match option {
        Some(text) => format!("{index}: {text}"),
        None => index.to_string(),
    }
}

/// Generate a review page for one graded attempt.
pub fn generate_attempt_html(quiz: &Quiz, result: &GradingResult) -> String {
    let mut html = String::new();
    push_head(&mut html, &format!("Attempt review: {}", quiz.title));

    let passed = quiz.is_passing(result.score);

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&quiz.title)));
    html.push_str(&format!(
        "<p class=\"meta\">Score: <strong class=\"{}\">{:.1}%</strong> | {} of {} correct | {} of {} points | passing score {:.1}%</p>\n",
        if passed { "pass" } else { "fail" },
        result.score,
        result.correct_answers,
        result.total_questions,
        result.earned_points,
        result.total_points,
        quiz.passing_score,
    ));
    if result.total_questions < quiz.questions.len() {
        html.push_str(&format!(
            "<p class=\"warning\">Only {} of {} questions were answered; unanswered questions are not counted.</p>\n",
            result.total_questions,
            quiz.questions.len()
        ));
    }
    html.push_str("</header>\n");

    // Per-question review
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Answers</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">#</th><th>Question</th><th>Your answer</th><th>Correct answer</th><th onclick=\"sortTable(4)\">Result</th><th>Explanation</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for (i, evaluated) in result.evaluated_answers.iter().enumerate() {
        let question = quiz.questions.get(i);
        let class = if evaluated.is_correct { "pass" } else { "fail" };
        let text = if evaluated.is_correct { "Correct" } else { "Incorrect" };
        let correct = match question {
            Some(q) if q.kind == QuestionType::MultipleChoice => {
                describe_option(&evaluated.correct_answer, Some(q))
            }
            _ => evaluated.correct_answer.clone(),
        };

        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class=\"{}\">{}</td><td>{}</td></tr>\n",
            class,
            i + 1,
            html_escape(question.map(|q| q.question.as_str()).unwrap_or("")),
            html_escape(&describe_answer(evaluated, question)),
            html_escape(&correct),
            class,
            text,
            html_escape(&evaluated.explanation),
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    push_raw_json(
        &mut html,
        &serde_json::to_string_pretty(result).unwrap_or_default(),
    );

    html.push_str(&format!(
        "<footer class=\"meta\">Generated {}</footer>\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");
    html.push_str("</body>\n</html>");
    html
}

/// Generate an HTML report across all attempts on a quiz.
pub fn generate_report_html(report: &QuizReport) -> String {
    let mut html = String::new();
    let stats = &report.stats;
    push_head(&mut html, &format!("Quiz report: {}", report.quiz.title));

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&report.quiz.title)));
    html.push_str(&format!(
        "<p class=\"meta\">{} questions | {} attempts | {} students | {}</p>\n",
        report.quiz.question_count,
        stats.attempt_count,
        stats.student_count,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Mean</th><th>Median</th><th>Highest</th><th>Lowest</th><th>Pass rate</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{:.1}%</td><td>{:.1}%</td><td>{:.1}%</td><td>{:.1}%</td><td>{:.1}%</td></tr></tbody></table>\n",
        stats.mean_score,
        stats.median_score,
        stats.highest_score,
        stats.lowest_score,
        stats.pass_rate * 100.0,
    ));

    if stats.attempt_count > 0 {
        html.push_str("<h2>Correct rate per question</h2>\n");
        html.push_str(&generate_bar_chart(
            stats.per_question.values(),
            &report.quiz.question_texts,
        ));
    }
    html.push_str("</section>\n");

    // Attempts
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Attempts</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Student</th><th onclick=\"sortTable(1)\">Attempt</th><th onclick=\"sortTable(2)\">Score</th><th onclick=\"sortTable(3)\">Result</th><th onclick=\"sortTable(4)\">Submitted</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for a in &report.attempts {
        let class = if a.passed { "pass" } else { "fail" };
        let text = if a.passed { "PASS" } else { "FAIL" };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{:.1}%</td><td class=\"{}\">{}</td><td>{}</td></tr>\n",
            class,
            html_escape(&a.student_id),
            a.attempt_number,
            a.result.score,
            class,
            text,
            a.submitted_at.format("%Y-%m-%d %H:%M"),
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    push_raw_json(
        &mut html,
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    );

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");
    html.push_str("</body>\n</html>");
    html
}

/// Write an attempt review page to a file.
pub fn write_attempt_html(quiz: &Quiz, result: &GradingResult, path: &Path) -> Result<()> {
    write_file(path, &generate_attempt_html(quiz, result))
}

/// Write a quiz report page to a file.
pub fn write_report_html(report: &QuizReport, path: &Path) -> Result<()> {
    write_file(path, &generate_report_html(report))
}

fn write_file(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn generate_bar_chart<'a>(
    questions: impl Iterator<Item = &'a QuestionStats>,
    question_texts: &[String],
) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let rows: Vec<(String, f64)> = questions
        .map(|q| {
            let label = match question_texts.get(q.question_index) {
                Some(text) if !text.is_empty() => {
                    let short: String = text.chars().take(24).collect();
                    format!("Q{} {}", q.question_index + 1, short)
                }
                _ => format!("Q{}", q.question_index + 1),
            };
            (label, q.correct_rate)
        })
        .collect();

    let total_height = rows.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, (label, rate)) in rows.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (*rate * max_width as f64) as usize;

        let color = if *rate >= 0.8 {
            "#22c55e"
        } else if *rate >= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(label)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            rate * 100.0
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.warning { color: #b45309; font-weight: bold; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, {numeric: true}) : vb.localeCompare(va, undefined, {numeric: true});
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use learnhub_core::attempt::AttemptRecord;
    use learnhub_core::grader::evaluate_quiz;
    use learnhub_core::model::SubmittedAnswer;

    fn make_quiz() -> Quiz {
        Quiz::new(
            "geo",
            "Geo <Basics>",
            vec![
                Question::multiple_choice("Which is a continent?", &["Asia", "Paris"], 0)
                    .with_points(2.0)
                    .with_explanation("Paris is a city"),
                Question::theory("Capital of France?", "Paris"),
            ],
        )
    }

    fn make_result(quiz: &Quiz) -> GradingResult {
        evaluate_quiz(
            &[SubmittedAnswer::choice("1"), SubmittedAnswer::text("paris")],
            &quiz.questions,
        )
        .unwrap()
    }

    #[test]
    fn attempt_page_shows_review_fields() {
        let quiz = make_quiz();
        let html = generate_attempt_html(&quiz, &make_result(&quiz));

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Geo &lt;Basics&gt;"));
        assert!(html.contains("33.3%"));
        assert!(html.contains("1: Paris"));
        assert!(html.contains("0: Asia"));
        assert!(html.contains("Paris is a city"));
        assert!(html.contains("Incorrect"));
    }

    #[test]
    fn attempt_page_flags_short_submissions() {
        let quiz = make_quiz();
        let result = evaluate_quiz(&[SubmittedAnswer::choice("0")], &quiz.questions).unwrap();
        let html = generate_attempt_html(&quiz, &result);
        assert!(html.contains("Only 1 of 2 questions were answered"));
    }

    #[test]
    fn report_page_lists_attempts() {
        let quiz = make_quiz();
        let result = make_result(&quiz);
        let attempt = AttemptRecord {
            id: uuid::Uuid::nil(),
            quiz_id: quiz.id.clone(),
            student_id: "alice".into(),
            attempt_number: 1,
            started_at: None,
            submitted_at: chrono::Utc::now(),
            passed: quiz.is_passing(result.score),
            result,
        };
        let report = QuizReport::build(&quiz, vec![attempt]);
        let html = generate_report_html(&report);

        assert!(html.contains("alice"));
        assert!(html.contains("FAIL"));
        assert!(html.contains("<svg"));
        assert!(html.contains("Q2 Capital of France?"));
    }

    #[test]
    fn html_report_write_to_file() {
        let quiz = make_quiz();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review/attempt.html");

        write_attempt_html(&quiz, &make_result(&quiz), &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
