// src/store/mod.rs

//! Persistence for tests, questions and submissions.
//!
//! `PgStore` talks to the hosted Postgres database; `MemoryStore` keeps the
//! same tables in process for local runs without a database.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        question::{DraftQuestion, Question},
        quiz::{NewTest, Page, Test, TestFilter, TestSummary, TestUpdate},
        submission::{NewSubmission, Submission},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn access_code_exists(&self, access_code: &str) -> Result<bool, AppError>;

    /// Inserts the test and its questions (ordinals 1..=N) atomically.
    /// A taken access code surfaces as `AppError::Conflict`.
    async fn insert_test(
        &self,
        test: &NewTest,
        access_code: &str,
        questions: &[DraftQuestion],
    ) -> Result<Test, AppError>;

    async fn get_test(&self, id: i64) -> Result<Option<Test>, AppError>;

    async fn find_test_by_code(&self, access_code: &str) -> Result<Option<Test>, AppError>;

    /// Questions of a test ordered by ordinal.
    async fn questions_for(&self, test_id: i64) -> Result<Vec<Question>, AppError>;

    /// Newest first, filtered and paginated.
    async fn list_tests(
        &self,
        teacher_id: &str,
        filter: &TestFilter,
        page_size: i64,
    ) -> Result<Page<TestSummary>, AppError>;

    /// Replaces the test's title, level and whole question set.
    /// Returns false when no test with that id belongs to the teacher.
    async fn update_test(
        &self,
        id: i64,
        teacher_id: &str,
        update: &TestUpdate,
        questions: &[DraftQuestion],
    ) -> Result<bool, AppError>;

    /// Deletes the test; its questions and submissions go with it.
    /// Returns false when no test with that id belongs to the teacher.
    async fn delete_test(&self, id: i64, teacher_id: &str) -> Result<bool, AppError>;

    async fn insert_submission(&self, submission: &NewSubmission) -> Result<Submission, AppError>;

    /// Submissions for the teacher's tests, newest first, optionally for one test.
    async fn list_submissions(
        &self,
        teacher_id: &str,
        test_id: Option<i64>,
    ) -> Result<Vec<Submission>, AppError>;
}
