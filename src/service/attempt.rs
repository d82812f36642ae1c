// src/service/attempt.rs

//! A student's pass through one test.
//!
//! `AwaitingCode` -> `start` -> `InProgress` -> `submit` -> `Submitted`, and
//! `restart` goes back to `AwaitingCode` from anywhere. Nothing is written to
//! the store until `submit` succeeds.

use crate::{
    error::AppError,
    models::{
        question::Question,
        quiz::Test,
        submission::{
            AnswerMap, DetailedAnswer, DetailedAnswers, NewSubmission, Submission, percentage,
        },
    },
    service::quiz::normalize_access_code,
    store::QuizStore,
};

pub const MIN_STUDENT_NAME_CHARS: usize = 3;

#[derive(Debug, Clone, Default)]
pub enum Attempt {
    #[default]
    AwaitingCode,
    InProgress(InProgress),
    Submitted(AttemptResult),
}

#[derive(Debug, Clone)]
pub struct InProgress {
    pub student_name: String,
    pub test: Test,
    pub questions: Vec<Question>,
    /// Question id -> selected option.
    pub answers: AnswerMap,
}

#[derive(Debug, Clone)]
pub struct AttemptResult {
    pub test_title: String,
    pub submission: Submission,
}

impl AttemptResult {
    /// Per-question breakdown in ordinal order.
    pub fn details(&self) -> Vec<&DetailedAnswer> {
        let mut details: Vec<&DetailedAnswer> = self
            .submission
            .detailed_answers
            .as_ref()
            .map(|d| d.values().collect())
            .unwrap_or_default();
        details.sort_by_key(|d| d.order_number);
        details
    }

    pub fn grade(&self) -> &'static str {
        grade_label(self.submission.percentage)
    }
}

/// Outcome of grading a complete answer set.
#[derive(Debug, Clone, PartialEq)]
pub struct Scorecard {
    pub score: i32,
    pub total: i32,
    pub percentage: f64,
    pub details: DetailedAnswers,
}

/// Grades answers against the questions. Unanswered questions count as wrong.
pub fn score(questions: &[Question], answers: &AnswerMap) -> Scorecard {
    let mut details = DetailedAnswers::new();
    let mut correct = 0;

    for q in questions {
        let student_answer = answers.get(&q.id).cloned().unwrap_or_default();
        let is_correct = student_answer == q.correct_answer;
        if is_correct {
            correct += 1;
        }
        details.insert(
            q.id,
            DetailedAnswer {
                question_text: q.question_text.clone(),
                student_answer,
                correct_answer: q.correct_answer.clone(),
                is_correct,
                order_number: q.order_number,
            },
        );
    }

    let total = questions.len() as i32;
    Scorecard {
        score: correct,
        total,
        percentage: percentage(correct, total),
        details,
    }
}

/// Verbal grade shown with the result.
pub fn grade_label(percentage: f64) -> &'static str {
    if percentage >= 90.0 {
        "Excellent"
    } else if percentage >= 75.0 {
        "Good"
    } else if percentage >= 60.0 {
        "Satisfactory"
    } else {
        "Needs improvement"
    }
}

impl InProgress {
    /// Ordinals of questions that have no answer yet.
    pub fn unanswered(&self) -> Vec<i32> {
        self.questions
            .iter()
            .filter(|q| !self.answers.contains_key(&q.id))
            .map(|q| q.order_number)
            .collect()
    }
}

impl Attempt {
    /// Opens the test behind `access_code` for `student_name`.
    pub async fn start(
        &mut self,
        store: &dyn QuizStore,
        student_name: &str,
        access_code: &str,
    ) -> Result<(), AppError> {
        if !matches!(self, Attempt::AwaitingCode) {
            return Err(AppError::Validation(
                "A test is already open. Start over to take another one.".to_string(),
            ));
        }

        let student_name = student_name.trim();
        if student_name.chars().count() < MIN_STUDENT_NAME_CHARS {
            return Err(AppError::Validation(format!(
                "Please enter your name (at least {} characters).",
                MIN_STUDENT_NAME_CHARS
            )));
        }
        let code = normalize_access_code(access_code);
        if code.is_empty() {
            return Err(AppError::Validation(
                "Please enter the test access code.".to_string(),
            ));
        }

        let test = store
            .find_test_by_code(&code)
            .await?
            .ok_or_else(|| AppError::NotFound("Test not found".to_string()))?;
        let questions = store.questions_for(test.id).await?;
        if questions.is_empty() {
            tracing::warn!("Test {} has no questions", test.id);
            return Err(AppError::NotFound("Test not found".to_string()));
        }

        tracing::info!(
            "Student '{}' started test {} ({} questions)",
            student_name,
            test.id,
            questions.len()
        );
        *self = Attempt::InProgress(InProgress {
            student_name: student_name.to_string(),
            test,
            questions,
            answers: AnswerMap::new(),
        });
        Ok(())
    }

    /// Stores the option picked for a question of the open test.
    pub fn record_answer(&mut self, question_id: i64, option: &str) -> Result<(), AppError> {
        let Attempt::InProgress(progress) = self else {
            return Err(AppError::Validation("No test is open.".to_string()));
        };
        let question = progress
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| AppError::Validation("Unknown question.".to_string()))?;
        if !question.has_option(option) {
            return Err(AppError::Validation(format!(
                "Question {} has no such option.",
                question.order_number
            )));
        }
        progress.answers.insert(question_id, option.to_string());
        Ok(())
    }

    /// Grades the open test and records the submission.
    /// Every question must be answered first.
    pub async fn submit(&mut self, store: &dyn QuizStore) -> Result<&AttemptResult, AppError> {
        let Attempt::InProgress(progress) = &*self else {
            return Err(AppError::Validation("No test is open.".to_string()));
        };

        let missing = progress.unanswered();
        if !missing.is_empty() {
            let list = missing
                .iter()
                .map(i32::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(AppError::Validation(format!(
                "Please answer all questions. Unanswered: {}",
                list
            )));
        }

        let card = score(&progress.questions, &progress.answers);
        let test_title = progress.test.title.clone();
        let submission = store
            .insert_submission(&NewSubmission {
                test_id: progress.test.id,
                student_name: progress.student_name.clone(),
                answers: progress.answers.clone(),
                detailed_answers: card.details,
                score: card.score,
                total_questions: card.total,
                percentage: card.percentage,
            })
            .await?;

        tracing::info!(
            "Submission {} saved: {} scored {}/{} on test {}",
            submission.id,
            submission.student_name,
            submission.score,
            submission.total_questions,
            submission.test_id
        );

        *self = Attempt::Submitted(AttemptResult {
            test_title,
            submission,
        });
        match self {
            Attempt::Submitted(result) => Ok(result),
            _ => Err(AppError::InternalServerError(
                "attempt left in an unexpected state".to_string(),
            )),
        }
    }

    pub fn restart(&mut self) {
        *self = Attempt::AwaitingCode;
    }
}
