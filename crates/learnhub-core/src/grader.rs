//! Quiz grading.
//!
//! Answers are paired with questions by position: answer `i` is graded
//! against question `i`. Callers must submit answers in question order.
//! Under [`LengthPolicy::Lenient`] a submission shorter than the quiz is
//! graded over the answered prefix only, so the unanswered questions are left
//! out of `total_points` and the score is computed over fewer questions.

use crate::config::{GraderConfig, LengthPolicy, TheoryStrategy, DEFAULT_KEYWORD_THRESHOLD};
use crate::error::GradingError;
use crate::model::{
    DeclaredIndex, EvaluatedAnswer, GradingResult, Question, QuestionType, SubmittedAnswer,
};

/// Grade a submission with the default configuration: exact-match theory
/// grading and lenient length handling.
pub fn evaluate_quiz(
    submitted_answers: &[SubmittedAnswer],
    quiz_questions: &[Question],
) -> Result<GradingResult, GradingError> {
    Grader::default().grade(submitted_answers, quiz_questions)
}

/// Strict string comparison of the selected option index.
///
/// Non-string selections and missing selections are never correct, and no
/// numeric normalization happens (`"01"` does not match `"1"`).
pub fn evaluate_multiple_choice(answer: &SubmittedAnswer, correct_answer: &str) -> bool {
    answer
        .selected_option
        .as_ref()
        .and_then(|v| v.as_text())
        .is_some_and(|selected| selected == correct_answer)
}

/// Keyword-overlap theory grading with the default 0.6 threshold.
///
/// Falls back to [`exact_text_match`] when the question has no keywords.
pub fn evaluate_theory(answer: &SubmittedAnswer, correct_answer: &str, question: &Question) -> bool {
    evaluate_theory_with_threshold(answer, correct_answer, question, DEFAULT_KEYWORD_THRESHOLD)
}

pub fn evaluate_theory_with_threshold(
    answer: &SubmittedAnswer,
    correct_answer: &str,
    question: &Question,
    threshold: f64,
) -> bool {
    let Some(text) = answer.text_answer.as_deref() else {
        return false;
    };
    match question.expected_keywords.as_deref() {
        Some(keywords) if !keywords.is_empty() => keyword_coverage(text, keywords) >= threshold,
        _ => exact_text_match(text, correct_answer),
    }
}

/// Fraction of `keywords` found as case-insensitive substrings of `text`.
pub fn keyword_coverage(text: &str, keywords: &[String]) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let normalized = text.trim().to_lowercase();
    let matched = keywords
        .iter()
        .filter(|k| normalized.contains(&k.to_lowercase()))
        .count();
    matched as f64 / keywords.len() as f64
}

/// Case-insensitive comparison ignoring leading and trailing whitespace.
pub fn exact_text_match(text: &str, reference: &str) -> bool {
    text.trim().to_lowercase() == reference.trim().to_lowercase()
}

/// Round to one decimal place, half away from zero.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// A quiz grader bound to a [`GraderConfig`].
#[derive(Debug, Clone, Default)]
pub struct Grader {
    config: GraderConfig,
}

impl Grader {
    pub fn new(config: GraderConfig) -> Self {
        Self { config }
    }

    /// Grade `submitted_answers` against `quiz_questions` by position.
    pub fn grade(
        &self,
        submitted_answers: &[SubmittedAnswer],
        quiz_questions: &[Question],
    ) -> Result<GradingResult, GradingError> {
        self.check_pairing(submitted_answers, quiz_questions)?;

        let mut evaluated_answers = Vec::with_capacity(submitted_answers.len());
        let mut correct_answers = 0usize;
        let mut earned_points = 0.0f64;
        let mut total_points = 0.0f64;

        for (index, answer) in submitted_answers.iter().enumerate() {
            let question =
                quiz_questions
                    .get(index)
                    .ok_or(GradingError::AnswerWithoutQuestion {
                        index,
                        question_count: quiz_questions.len(),
                    })?;

            let points = question.effective_points();
            total_points += points;

            let is_correct = self.is_correct(answer, question);
            if is_correct {
                correct_answers += 1;
                earned_points += points;
            }

            evaluated_answers.push(EvaluatedAnswer {
                answer: answer.clone(),
                is_correct,
                correct_answer: question.correct_answer.clone(),
                explanation: question.explanation.clone(),
            });
        }

        if submitted_answers.len() < quiz_questions.len() {
            tracing::warn!(
                answered = submitted_answers.len(),
                questions = quiz_questions.len(),
                "submission is shorter than the quiz; unanswered questions are excluded from the score"
            );
        }

        let score = if total_points > 0.0 {
            round_one_decimal(earned_points / total_points * 100.0)
        } else {
            0.0
        };

        tracing::debug!(
            score,
            correct_answers,
            total_questions = evaluated_answers.len(),
            "graded submission"
        );

        Ok(GradingResult {
            total_questions: evaluated_answers.len(),
            evaluated_answers,
            score,
            correct_answers,
            earned_points,
            total_points,
        })
    }

    /// Whether a single answer is correct for its question under this config.
    pub fn is_correct(&self, answer: &SubmittedAnswer, question: &Question) -> bool {
        match &question.kind {
            QuestionType::MultipleChoice => {
                evaluate_multiple_choice(answer, &question.correct_answer)
            }
            QuestionType::Theory => match self.config.theory_strategy {
                TheoryStrategy::ExactMatch => answer
                    .text_answer
                    .as_deref()
                    .is_some_and(|text| exact_text_match(text, &question.correct_answer)),
                TheoryStrategy::Keywords => evaluate_theory_with_threshold(
                    answer,
                    &question.correct_answer,
                    question,
                    self.config.keyword_threshold,
                ),
            },
            QuestionType::Other(_) => false,
        }
    }

    fn check_pairing(
        &self,
        submitted_answers: &[SubmittedAnswer],
        quiz_questions: &[Question],
    ) -> Result<(), GradingError> {
        if self.config.length_policy != LengthPolicy::Strict {
            return Ok(());
        }

        if submitted_answers.len() != quiz_questions.len() {
            return Err(GradingError::LengthMismatch {
                answers: submitted_answers.len(),
                questions: quiz_questions.len(),
            });
        }

        for (position, answer) in submitted_answers.iter().enumerate() {
            match &answer.question_index {
                Some(DeclaredIndex::Position(declared)) if *declared != position => {
                    return Err(GradingError::IndexMismatch {
                        position,
                        declared: *declared,
                    });
                }
                Some(DeclaredIndex::Other(value)) => {
                    return Err(GradingError::InvalidIndex {
                        position,
                        declared: value.to_string(),
                    });
                }
                _ => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerValue;

    fn geography_questions() -> Vec<Question> {
        vec![
            Question::multiple_choice("Which is a continent?", &["A", "B"], 0).with_points(2.0),
            Question::theory("Capital of France?", "Paris").with_points(1.0),
        ]
    }

    #[test]
    fn all_correct_mixed_quiz() {
        let answers = vec![SubmittedAnswer::choice("0"), SubmittedAnswer::text("paris")];
        let result = evaluate_quiz(&answers, &geography_questions()).unwrap();
        assert_eq!(result.correct_answers, 2);
        assert_eq!(result.earned_points, 3.0);
        assert_eq!(result.total_points, 3.0);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.total_questions, 2);
    }

    #[test]
    fn all_incorrect_mixed_quiz() {
        let answers = vec![SubmittedAnswer::choice("1"), SubmittedAnswer::text("London")];
        let result = evaluate_quiz(&answers, &geography_questions()).unwrap();
        assert_eq!(result.correct_answers, 0);
        assert_eq!(result.earned_points, 0.0);
        assert_eq!(result.total_points, 3.0);
        assert_eq!(result.score, 0.0);
        assert!(result.evaluated_answers.iter().all(|a| !a.is_correct));
    }

    #[test]
    fn unit_points_fully_correct_scores_hundred() {
        let questions: Vec<Question> = (0..7)
            .map(|i| Question::multiple_choice("Q", &["a", "b", "c"], i % 3))
            .collect();
        let answers: Vec<SubmittedAnswer> = questions
            .iter()
            .map(|q| SubmittedAnswer::choice(q.correct_answer.as_str()))
            .collect();
        let result = evaluate_quiz(&answers, &questions).unwrap();
        assert_eq!(result.score, 100.0);
        assert_eq!(result.correct_answers, 7);
        assert_eq!(result.earned_points, 7.0);
        assert_eq!(result.total_points, 7.0);
    }

    #[test]
    fn score_rounds_to_one_decimal() {
        let questions = vec![
            Question::theory("a", "x"),
            Question::theory("b", "y"),
            Question::theory("c", "z"),
        ];
        let answers = vec![
            SubmittedAnswer::text("x"),
            SubmittedAnswer::text("wrong"),
            SubmittedAnswer::text("wrong"),
        ];
        let result = evaluate_quiz(&answers, &questions).unwrap();
        assert_eq!(result.score, 33.3);

        let answers = vec![
            SubmittedAnswer::text("x"),
            SubmittedAnswer::text("y"),
            SubmittedAnswer::text("wrong"),
        ];
        let result = evaluate_quiz(&answers, &questions).unwrap();
        assert_eq!(result.score, 66.7);
        assert_eq!(round_one_decimal(12.25), 12.3);
    }

    #[test]
    fn empty_submission_scores_zero_without_dividing() {
        let result = evaluate_quiz(&[], &geography_questions()).unwrap();
        assert_eq!(result.total_points, 0.0);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.total_questions, 0);
    }

    #[test]
    fn multiple_choice_is_strict_string_equality() {
        let question = Question::multiple_choice("Q", &["a", "b"], 1);
        let grader = Grader::default();
        assert!(grader.is_correct(&SubmittedAnswer::choice("1"), &question));
        assert!(!grader.is_correct(&SubmittedAnswer::choice("01"), &question));
        assert!(!grader.is_correct(&SubmittedAnswer::choice(" 1"), &question));
        assert!(!grader.is_correct(
            &SubmittedAnswer::choice(AnswerValue::Other(serde_json::json!(1))),
            &question
        ));
        assert!(!grader.is_correct(
            &SubmittedAnswer::choice(AnswerValue::Other(serde_json::json!(true))),
            &question
        ));
        assert!(!grader.is_correct(&SubmittedAnswer::default(), &question));
    }

    #[test]
    fn numeric_selection_from_json_is_incorrect() {
        let answers: Vec<SubmittedAnswer> =
            serde_json::from_str(r#"[{"selectedOption": 0}, {"textAnswer": "Paris"}]"#).unwrap();
        let result = evaluate_quiz(&answers, &geography_questions()).unwrap();
        assert!(!result.evaluated_answers[0].is_correct);
        assert!(result.evaluated_answers[1].is_correct);
        assert_eq!(result.earned_points, 1.0);
    }

    #[test]
    fn theory_exact_match_ignores_case_and_whitespace() {
        let question = Question::theory("Q", "  Photosynthesis ");
        let grader = Grader::default();
        assert!(grader.is_correct(&SubmittedAnswer::text("photosynthesis"), &question));
        assert!(grader.is_correct(&SubmittedAnswer::text("\tPHOTOSYNTHESIS\n"), &question));
        assert!(!grader.is_correct(&SubmittedAnswer::text("photo"), &question));
        assert!(!grader.is_correct(&SubmittedAnswer::default(), &question));
    }

    #[test]
    fn default_aggregator_ignores_keywords() {
        let question = Question::theory("Describe osmosis", "Water moves across a membrane")
            .with_keywords(&["water", "membrane"]);
        let answer = SubmittedAnswer::text("water crosses the membrane");

        // The keyword evaluator accepts it, the aggregator does not.
        assert!(evaluate_theory(&answer, &question.correct_answer, &question));
        let result = evaluate_quiz(&[answer], &[question]).unwrap();
        assert!(!result.evaluated_answers[0].is_correct);
    }

    #[test]
    fn keyword_strategy_uses_overlap() {
        let question = Question::theory("Describe osmosis", "reference")
            .with_keywords(&["water", "membrane", "concentration"]);
        let grader = Grader::new(GraderConfig::default().with_theory_strategy(TheoryStrategy::Keywords));

        let two_of_three = SubmittedAnswer::text("Water crosses a MEMBRANE");
        assert!(grader.is_correct(&two_of_three, &question));

        let one_of_three = SubmittedAnswer::text("water");
        assert!(!grader.is_correct(&one_of_three, &question));
    }

    #[test]
    fn keyword_threshold_boundary() {
        let keywords: Vec<String> = ["a1", "b2", "c3", "d4", "e5"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let question = Question::theory("Q", "unused")
            .with_keywords(&["a1", "b2", "c3", "d4", "e5"]);

        let three = SubmittedAnswer::text("a1 b2 c3");
        assert_eq!(keyword_coverage("a1 b2 c3", &keywords), 0.6);
        assert!(evaluate_theory(&three, "unused", &question));

        let two = SubmittedAnswer::text("a1 b2");
        assert!(!evaluate_theory(&two, "unused", &question));
    }

    #[test]
    fn keyword_evaluator_without_keywords_falls_back_to_exact() {
        let question = Question::theory("Q", "Paris");
        assert!(evaluate_theory(&SubmittedAnswer::text(" PARIS "), "Paris", &question));
        assert!(!evaluate_theory(&SubmittedAnswer::text("Paris, France"), "Paris", &question));

        let empty_keywords = Question::theory("Q", "Paris").with_keywords(&[]);
        assert!(evaluate_theory(&SubmittedAnswer::text("paris"), "Paris", &empty_keywords));
    }

    #[test]
    fn evaluate_multiple_choice_helper() {
        assert!(evaluate_multiple_choice(&SubmittedAnswer::choice("2"), "2"));
        assert!(!evaluate_multiple_choice(&SubmittedAnswer::choice("3"), "2"));
        assert!(!evaluate_multiple_choice(&SubmittedAnswer::text("2"), "2"));
    }

    #[test]
    fn unknown_type_counts_points_but_never_correct() {
        let mut question = Question::theory("Match the pairs", "a-1");
        question.kind = QuestionType::Other("matching".into());
        let question = question.with_points(4.0);

        let questions = vec![question, Question::theory("Q", "yes")];
        let answers = vec![SubmittedAnswer::text("a-1"), SubmittedAnswer::text("yes")];
        let result = evaluate_quiz(&answers, &questions).unwrap();
        assert!(!result.evaluated_answers[0].is_correct);
        assert_eq!(result.total_points, 5.0);
        assert_eq!(result.earned_points, 1.0);
        assert_eq!(result.score, 20.0);
    }

    #[test]
    fn short_submission_skews_score_upward() {
        // The unanswered theory question is excluded from the totals entirely.
        let answers = vec![SubmittedAnswer::choice("0")];
        let result = evaluate_quiz(&answers, &geography_questions()).unwrap();
        assert_eq!(result.total_questions, 1);
        assert_eq!(result.total_points, 2.0);
        assert_eq!(result.earned_points, 2.0);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.evaluated_answers.len(), 1);
    }

    #[test]
    fn long_submission_is_an_error() {
        let answers = vec![
            SubmittedAnswer::choice("0"),
            SubmittedAnswer::text("paris"),
            SubmittedAnswer::text("extra"),
        ];
        let err = evaluate_quiz(&answers, &geography_questions()).unwrap_err();
        assert_eq!(
            err,
            GradingError::AnswerWithoutQuestion {
                index: 2,
                question_count: 2
            }
        );
    }

    #[test]
    fn strict_policy_rejects_length_mismatch() {
        let grader = Grader::new(GraderConfig::default().with_length_policy(LengthPolicy::Strict));
        let err = grader
            .grade(&[SubmittedAnswer::choice("0")], &geography_questions())
            .unwrap_err();
        assert_eq!(
            err,
            GradingError::LengthMismatch {
                answers: 1,
                questions: 2
            }
        );
    }

    #[test]
    fn strict_policy_checks_declared_indices() {
        let grader = Grader::new(GraderConfig::default().with_length_policy(LengthPolicy::Strict));
        let swapped = vec![
            SubmittedAnswer::text("paris").at_index(1),
            SubmittedAnswer::choice("0").at_index(0),
        ];
        let err = grader.grade(&swapped, &geography_questions()).unwrap_err();
        assert_eq!(
            err,
            GradingError::IndexMismatch {
                position: 0,
                declared: 1
            }
        );

        let ordered = vec![
            SubmittedAnswer::choice("0").at_index(0),
            SubmittedAnswer::text("paris").at_index(1),
        ];
        let result = grader.grade(&ordered, &geography_questions()).unwrap();
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn lenient_policy_ignores_declared_indices() {
        let swapped = vec![
            SubmittedAnswer::text("paris").at_index(1),
            SubmittedAnswer::choice("0").at_index(0),
        ];
        let result = evaluate_quiz(&swapped, &geography_questions()).unwrap();
        assert_eq!(result.correct_answers, 0);
    }

    #[test]
    fn malformed_declared_indices_only_matter_under_strict() {
        let answers: Vec<SubmittedAnswer> = serde_json::from_str(
            r#"[
                {"questionIndex": "0", "selectedOption": "0"},
                {"questionIndex": -1, "textAnswer": "Paris"}
            ]"#,
        )
        .unwrap();

        let result = evaluate_quiz(&answers, &geography_questions()).unwrap();
        assert_eq!(result.correct_answers, 2);

        let grader = Grader::new(GraderConfig::default().with_length_policy(LengthPolicy::Strict));
        let err = grader.grade(&answers, &geography_questions()).unwrap_err();
        assert_eq!(
            err,
            GradingError::InvalidIndex {
                position: 0,
                declared: "\"0\"".to_string()
            }
        );
    }

    #[test]
    fn evaluated_answers_carry_review_fields() {
        let questions = vec![Question::theory("Q", "Paris").with_explanation("Capital city")];
        let result = evaluate_quiz(&[SubmittedAnswer::text("Rome")], &questions).unwrap();
        let evaluated = &result.evaluated_answers[0];
        assert_eq!(evaluated.correct_answer, "Paris");
        assert_eq!(evaluated.explanation, "Capital city");
        assert_eq!(evaluated.answer.text_answer.as_deref(), Some("Rome"));
    }

    #[test]
    fn grading_is_deterministic() {
        let answers = vec![SubmittedAnswer::choice("0"), SubmittedAnswer::text("London")];
        let first = evaluate_quiz(&answers, &geography_questions()).unwrap();
        let second = evaluate_quiz(&answers, &geography_questions()).unwrap();
        assert_eq!(first, second);
    }
}
