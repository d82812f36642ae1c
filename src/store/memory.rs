// src/store/memory.rs

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::{
        question::{DraftQuestion, Question, number_questions},
        quiz::{NewTest, Page, Test, TestFilter, TestSummary, TestUpdate},
        submission::{NewSubmission, Submission, percentage},
    },
    store::QuizStore,
};

#[derive(Default)]
struct Tables {
    tests: Vec<Test>,
    questions: Vec<Question>,
    submissions: Vec<Submission>,
    last_test_id: i64,
    last_question_id: i64,
    last_submission_id: i64,
}

impl Tables {
    fn push_questions(&mut self, test_id: i64, questions: &[DraftQuestion]) {
        let now = Utc::now();
        for numbered in number_questions(questions) {
            self.last_question_id += 1;
            self.questions.push(Question {
                id: self.last_question_id,
                test_id,
                question_text: numbered.draft.question.clone(),
                correct_answer: numbered.draft.correct_answer.clone(),
                options: Json(numbered.draft.options.clone()),
                order_number: numbered.order_number,
                created_at: now,
            });
        }
    }

    fn owned_test_ids(&self, teacher_id: &str) -> HashSet<i64> {
        self.tests
            .iter()
            .filter(|t| t.teacher_id == teacher_id)
            .map(|t| t.id)
            .collect()
    }
}

/// In-process `QuizStore` with the same constraints as the SQL schema:
/// unique access codes, ordinals 1..=N, cascading deletes.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn question_count(&self) -> usize {
        self.tables.read().await.questions.len()
    }

    pub async fn submission_count(&self) -> usize {
        self.tables.read().await.submissions.len()
    }
}

fn matches_filter(test: &Test, teacher_id: &str, filter: &TestFilter) -> bool {
    if test.teacher_id != teacher_id {
        return false;
    }
    if let Some(level) = filter.level {
        if test.language_level != level {
            return false;
        }
    }
    match filter.search_term() {
        Some(term) => test.title.to_lowercase().contains(&term.to_lowercase()),
        None => true,
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn access_code_exists(&self, access_code: &str) -> Result<bool, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.tests.iter().any(|t| t.access_code == access_code))
    }

    async fn insert_test(
        &self,
        test: &NewTest,
        access_code: &str,
        questions: &[DraftQuestion],
    ) -> Result<Test, AppError> {
        let mut tables = self.tables.write().await;

        if tables.tests.iter().any(|t| t.access_code == access_code) {
            return Err(AppError::Conflict(format!(
                "access code '{}' is already taken",
                access_code
            )));
        }

        tables.last_test_id += 1;
        let saved = Test {
            id: tables.last_test_id,
            title: test.title.clone(),
            article_url: test.article_url.clone(),
            article_text: test.article_text.clone(),
            language_level: test.language_level,
            teacher_id: test.teacher_id.clone(),
            access_code: access_code.to_string(),
            created_at: Utc::now(),
        };
        tables.tests.push(saved.clone());
        tables.push_questions(saved.id, questions);

        Ok(saved)
    }

    async fn get_test(&self, id: i64) -> Result<Option<Test>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.tests.iter().find(|t| t.id == id).cloned())
    }

    async fn find_test_by_code(&self, access_code: &str) -> Result<Option<Test>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tests
            .iter()
            .find(|t| t.access_code == access_code)
            .cloned())
    }

    async fn questions_for(&self, test_id: i64) -> Result<Vec<Question>, AppError> {
        let tables = self.tables.read().await;
        let mut questions: Vec<Question> = tables
            .questions
            .iter()
            .filter(|q| q.test_id == test_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| q.order_number);
        Ok(questions)
    }

    async fn list_tests(
        &self,
        teacher_id: &str,
        filter: &TestFilter,
        page_size: i64,
    ) -> Result<Page<TestSummary>, AppError> {
        let tables = self.tables.read().await;

        let mut matching: Vec<&Test> = tables
            .tests
            .iter()
            .filter(|t| matches_filter(t, teacher_id, filter))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let page = filter.page();
        let items = matching
            .iter()
            .skip(page.saturating_mul(page_size).max(0) as usize)
            .take(page_size.max(0) as usize)
            .map(|t| TestSummary {
                id: t.id,
                title: t.title.clone(),
                article_url: t.article_url.clone(),
                language_level: t.language_level,
                access_code: t.access_code.clone(),
                created_at: t.created_at,
                question_count: tables.questions.iter().filter(|q| q.test_id == t.id).count()
                    as i64,
            })
            .collect();

        Ok(Page {
            items,
            page,
            total_items: matching.len() as i64,
            page_size,
        })
    }

    async fn update_test(
        &self,
        id: i64,
        teacher_id: &str,
        update: &TestUpdate,
        questions: &[DraftQuestion],
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;

        let Some(test) = tables
            .tests
            .iter_mut()
            .find(|t| t.id == id && t.teacher_id == teacher_id)
        else {
            return Ok(false);
        };
        test.title = update.title.clone();
        test.language_level = update.language_level;

        tables.questions.retain(|q| q.test_id != id);
        tables.push_questions(id, questions);
        Ok(true)
    }

    async fn delete_test(&self, id: i64, teacher_id: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;

        let before = tables.tests.len();
        tables
            .tests
            .retain(|t| !(t.id == id && t.teacher_id == teacher_id));
        if tables.tests.len() == before {
            return Ok(false);
        }

        tables.questions.retain(|q| q.test_id != id);
        tables.submissions.retain(|s| s.test_id != id);
        Ok(true)
    }

    async fn insert_submission(&self, submission: &NewSubmission) -> Result<Submission, AppError> {
        let mut tables = self.tables.write().await;

        if !tables.tests.iter().any(|t| t.id == submission.test_id) {
            return Err(AppError::NotFound("Test not found".to_string()));
        }

        tables.last_submission_id += 1;
        let saved = Submission {
            id: tables.last_submission_id,
            test_id: submission.test_id,
            student_name: submission.student_name.clone(),
            answers: Json(submission.answers.clone()),
            detailed_answers: Some(Json(submission.detailed_answers.clone())),
            score: submission.score,
            total_questions: submission.total_questions,
            // Same rounding the NUMERIC(5,2) column applies.
            percentage: percentage(submission.score, submission.total_questions),
            submitted_at: Utc::now(),
        };
        tables.submissions.push(saved.clone());
        Ok(saved)
    }

    async fn list_submissions(
        &self,
        teacher_id: &str,
        test_id: Option<i64>,
    ) -> Result<Vec<Submission>, AppError> {
        let tables = self.tables.read().await;
        let owned = tables.owned_test_ids(teacher_id);

        let mut submissions: Vec<Submission> = tables
            .submissions
            .iter()
            .filter(|s| owned.contains(&s.test_id))
            .filter(|s| test_id.is_none_or(|id| s.test_id == id))
            .cloned()
            .collect();
        submissions.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then(b.id.cmp(&a.id))
        });
        Ok(submissions)
    }
}
