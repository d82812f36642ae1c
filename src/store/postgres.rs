// src/store/postgres.rs

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction, postgres::PgPoolOptions, types::Json};

use crate::{
    error::AppError,
    models::{
        question::{DraftQuestion, Question, number_questions},
        quiz::{NewTest, Page, Test, TestFilter, TestSummary, TestUpdate},
        submission::{NewSubmission, Submission},
    },
    store::QuizStore,
};

const CONNECT_ATTEMPTS: u32 = 5;

const TEST_COLUMNS: &str =
    "id, title, article_url, article_text, language_level, teacher_id, access_code, created_at";

const QUESTION_COLUMNS: &str =
    "id, test_id, question_text, correct_answer, options, order_number, created_at";

// total_questions and percentage are nullable on databases migrated from before 0002.
const SUBMISSION_COLUMNS: &str = r#"
    s.id, s.test_id, s.student_name, s.answers, s.detailed_answers, s.score,
    COALESCE(s.total_questions, 0) AS total_questions,
    COALESCE(s.percentage, 0)::FLOAT8 AS percentage,
    s.submitted_at
"#;

/// `QuizStore` backed by Postgres through sqlx.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects with a short retry loop so the app can start alongside the database.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let mut retry_count = 0;
        let pool = loop {
            match PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(3))
                .connect(database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) => {
                    retry_count += 1;
                    if retry_count >= CONNECT_ATTEMPTS {
                        return Err(AppError::Database(format!(
                            "Failed to connect to database after {} attempts: {}",
                            CONNECT_ATTEMPTS, e
                        )));
                    }
                    tracing::warn!(
                        "Database not ready, retrying in 2s... (Attempt {})",
                        retry_count
                    );
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        };

        tracing::info!("Database connected...");
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), AppError> {
        tracing::info!("Running migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Migrations applied successfully.");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn insert_questions(
    tx: &mut Transaction<'_, Postgres>,
    test_id: i64,
    questions: &[DraftQuestion],
) -> Result<(), AppError> {
    for numbered in number_questions(questions) {
        sqlx::query(
            r#"
            INSERT INTO questions (test_id, question_text, correct_answer, options, order_number)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(test_id)
        .bind(&numbered.draft.question)
        .bind(&numbered.draft.correct_answer)
        .bind(Json(&numbered.draft.options))
        .bind(numbered.order_number)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert question {}: {:?}", numbered.order_number, e);
            AppError::from(e)
        })?;
    }
    Ok(())
}

/// Escapes LIKE wildcards so the search term matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn push_test_filters<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    teacher_id: &'a str,
    filter: &TestFilter,
) {
    builder.push(" WHERE t.teacher_id = ");
    builder.push_bind(teacher_id);

    if let Some(level) = filter.level {
        builder.push(" AND t.language_level = ");
        builder.push_bind(level.as_str());
    }

    if let Some(term) = filter.search_term() {
        builder.push(" AND t.title ILIKE ");
        builder.push_bind(format!("%{}%", escape_like(term)));
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn access_code_exists(&self, access_code: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tests WHERE access_code = $1)")
                .bind(access_code)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert_test(
        &self,
        test: &NewTest,
        access_code: &str,
        questions: &[DraftQuestion],
    ) -> Result<Test, AppError> {
        let mut tx = self.pool.begin().await?;

        let saved = sqlx::query_as::<_, Test>(&format!(
            r#"
            INSERT INTO tests (title, article_url, article_text, language_level, teacher_id, access_code)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            TEST_COLUMNS
        ))
        .bind(&test.title)
        .bind(&test.article_url)
        .bind(&test.article_text)
        .bind(test.language_level.as_str())
        .bind(&test.teacher_id)
        .bind(access_code)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::from)?;

        insert_questions(&mut tx, saved.id, questions).await?;
        tx.commit().await?;

        Ok(saved)
    }

    async fn get_test(&self, id: i64) -> Result<Option<Test>, AppError> {
        let test = sqlx::query_as::<_, Test>(&format!(
            "SELECT {} FROM tests WHERE id = $1",
            TEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(test)
    }

    async fn find_test_by_code(&self, access_code: &str) -> Result<Option<Test>, AppError> {
        let test = sqlx::query_as::<_, Test>(&format!(
            "SELECT {} FROM tests WHERE access_code = $1",
            TEST_COLUMNS
        ))
        .bind(access_code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(test)
    }

    async fn questions_for(&self, test_id: i64) -> Result<Vec<Question>, AppError> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {} FROM questions WHERE test_id = $1 ORDER BY order_number",
            QUESTION_COLUMNS
        ))
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(questions)
    }

    async fn list_tests(
        &self,
        teacher_id: &str,
        filter: &TestFilter,
        page_size: i64,
    ) -> Result<Page<TestSummary>, AppError> {
        let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tests t");
        push_test_filters(&mut count_builder, teacher_id, filter);
        let total_items: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let page = filter.page();
        let mut builder = QueryBuilder::<Postgres>::new(
            r#"
            SELECT
                t.id, t.title, t.article_url, t.language_level, t.access_code, t.created_at,
                (SELECT COUNT(*) FROM questions q WHERE q.test_id = t.id) AS question_count
            FROM tests t
            "#,
        );
        push_test_filters(&mut builder, teacher_id, filter);
        builder.push(" ORDER BY t.created_at DESC, t.id DESC LIMIT ");
        builder.push_bind(page_size);
        builder.push(" OFFSET ");
        builder.push_bind(page.saturating_mul(page_size));

        let items: Vec<TestSummary> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list tests: {:?}", e);
                AppError::from(e)
            })?;

        Ok(Page {
            items,
            page,
            total_items,
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
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE tests SET title = $1, language_level = $2 WHERE id = $3 AND teacher_id = $4",
        )
        .bind(&update.title)
        .bind(update.language_level.as_str())
        .bind(id)
        .bind(teacher_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM questions WHERE test_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_questions(&mut tx, id, questions).await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn delete_test(&self, id: i64, teacher_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tests WHERE id = $1 AND teacher_id = $2")
            .bind(id)
            .bind(teacher_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete test: {:?}", e);
                AppError::from(e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_submission(&self, submission: &NewSubmission) -> Result<Submission, AppError> {
        let saved = sqlx::query_as::<_, Submission>(&format!(
            r#"
            INSERT INTO submissions AS s
                (test_id, student_name, answers, detailed_answers, score, total_questions, percentage)
            VALUES ($1, $2, $3, $4, $5, $6, ROUND($7::NUMERIC, 2))
            RETURNING {}
            "#,
            SUBMISSION_COLUMNS
        ))
        .bind(submission.test_id)
        .bind(&submission.student_name)
        .bind(Json(&submission.answers))
        .bind(Json(&submission.detailed_answers))
        .bind(submission.score)
        .bind(submission.total_questions)
        .bind(submission.percentage)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert submission: {:?}", e);
            AppError::from(e)
        })?;

        Ok(saved)
    }

    async fn list_submissions(
        &self,
        teacher_id: &str,
        test_id: Option<i64>,
    ) -> Result<Vec<Submission>, AppError> {
        let submissions = sqlx::query_as::<_, Submission>(&format!(
            r#"
            SELECT {}
            FROM submissions s
            JOIN tests t ON t.id = s.test_id
            WHERE t.teacher_id = $1
              AND ($2::BIGINT IS NULL OR s.test_id = $2)
            ORDER BY s.submitted_at DESC, s.id DESC
            "#,
            SUBMISSION_COLUMNS
        ))
        .bind(teacher_id)
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(submissions)
    }
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("100%_done"), "100\\%\\_done");
        assert_eq!(escape_like("plain"), "plain");
    }
}
