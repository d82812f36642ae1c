// src/service/quiz.rs

use std::sync::Arc;

use rand::{Rng, thread_rng};

use crate::{
    ai::AiService,
    config::QUIZ_PAGE_SIZE,
    error::AppError,
    ingest::{ArticleFetcher, extract_title},
    models::{
        level::DifficultyLevel,
        question::{DraftQuestion, Question},
        quiz::{Article, MAX_PAGE, NewTest, Page, Test, TestFilter, TestSummary, TestUpdate},
    },
    service::results::{ResultsQuery, ResultsReport},
    store::QuizStore,
};

pub const ACCESS_CODE_LEN: usize = 5;
const ACCESS_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Attempts at finding a free access code before giving up. With 36^5 codes a
/// collision streak this long means something other than bad luck.
const MAX_ACCESS_CODE_ATTEMPTS: usize = 32;

/// Page size used when collecting every test for the results report.
const RESULTS_TEST_BATCH: i64 = 200;

/// Characters of article text used as a title when none is given.
const FALLBACK_TITLE_CHARS: usize = 30;

/// Random code of `ACCESS_CODE_LEN` characters from A-Z and 0-9.
pub fn generate_access_code() -> String {
    let mut rng = thread_rng();
    (0..ACCESS_CODE_LEN)
        .map(|_| ACCESS_CODE_ALPHABET[rng.gen_range(0..ACCESS_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Normalizes what a student typed into the stored code format.
pub fn normalize_access_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Trimmed title, or the start of the article when the title is blank.
pub fn title_or_fallback(title: &str, article_text: &str) -> String {
    let title = title.trim();
    if !title.is_empty() {
        return title.to_string();
    }
    let text = article_text.trim();
    if text.chars().count() > FALLBACK_TITLE_CHARS {
        let head: String = text.chars().take(FALLBACK_TITLE_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// The article and draft questions a regeneration request works from.
#[derive(Debug, Clone, Copy)]
pub struct QuizDraft<'a> {
    pub article_text: &'a str,
    pub level: DifficultyLevel,
    pub questions: &'a [DraftQuestion],
}

/// Orchestrates ingestion, the AI steps and persistence for the teacher app.
#[derive(Clone)]
pub struct QuizService {
    store: Arc<dyn QuizStore>,
    ai: AiService,
    fetcher: ArticleFetcher,
}

impl QuizService {
    pub fn new(store: Arc<dyn QuizStore>, ai: AiService, fetcher: ArticleFetcher) -> Self {
        Self { store, ai, fetcher }
    }

    pub fn store(&self) -> &Arc<dyn QuizStore> {
        &self.store
    }

    /// Fetches the page, strips it, has the AI clean it and adapt it to `level`.
    pub async fn process_article(
        &self,
        url: &str,
        level: DifficultyLevel,
    ) -> Result<Article, AppError> {
        let raw_text = self.fetcher.fetch_text(url).await?;
        let cleaned = self.ai.clean_article(&raw_text).await?;
        let content = self.ai.adapt_text(&cleaned, level).await?;
        let title = extract_title(&content);

        tracing::info!("Article processed: '{}' ({} chars, level {})", title, content.len(), level);
        Ok(Article {
            url: url.trim().to_string(),
            title,
            content,
            level,
        })
    }

    /// Draft questions for the article, not yet persisted.
    pub async fn generate_quiz(
        &self,
        article_text: &str,
        level: DifficultyLevel,
        count: u32,
    ) -> Result<Vec<DraftQuestion>, AppError> {
        if article_text.trim().is_empty() {
            return Err(AppError::Validation(
                "Load an article before generating questions.".to_string(),
            ));
        }
        self.ai.generate_questions(article_text, count, level).await
    }

    /// A replacement for the question at `index` of the draft.
    pub async fn regenerate_question(
        &self,
        index: usize,
        context: QuizDraft<'_>,
    ) -> Result<DraftQuestion, AppError> {
        if index >= context.questions.len() {
            return Err(AppError::Validation(format!(
                "There is no question {} to regenerate.",
                index + 1
            )));
        }
        if context.article_text.trim().is_empty() {
            return Err(AppError::Validation(
                "No text available for regeneration.".to_string(),
            ));
        }
        self.ai
            .regenerate_question(context.article_text, index, context.questions, context.level)
            .await
    }

    /// Persists the test with a fresh access code and its questions numbered 1..=N.
    /// Returns the new test.
    pub async fn save_quiz(
        &self,
        test: NewTest,
        questions: &[DraftQuestion],
    ) -> Result<Test, AppError> {
        self.save_with_codes(test, questions, std::iter::repeat_with(generate_access_code))
            .await
    }

    async fn save_with_codes(
        &self,
        mut test: NewTest,
        questions: &[DraftQuestion],
        codes: impl Iterator<Item = String> + Send,
    ) -> Result<Test, AppError> {
        if questions.is_empty() {
            return Err(AppError::Validation("No quiz to save.".to_string()));
        }
        test.title = title_or_fallback(&test.title, &test.article_text);
        tracing::info!("Saving test: {}", test.title);

        for code in codes.take(MAX_ACCESS_CODE_ATTEMPTS) {
            if self.store.access_code_exists(&code).await? {
                tracing::debug!("Access code {} already taken, drawing another", code);
                continue;
            }
            match self.store.insert_test(&test, &code, questions).await {
                Ok(saved) => {
                    tracing::info!("Test saved with ID: {}, access code: {}", saved.id, code);
                    return Ok(saved);
                }
                // Another save claimed the code between the check and the insert.
                Err(AppError::Conflict(msg)) => {
                    tracing::warn!("Access code {} collided on insert: {}", code, msg);
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Conflict(
            "Could not find a free access code, please try again.".to_string(),
        ))
    }

    /// The teacher's own test with its questions.
    pub async fn load_quiz(
        &self,
        id: i64,
        teacher_id: &str,
    ) -> Result<(Test, Vec<Question>), AppError> {
        let test = self
            .store
            .get_test(id)
            .await?
            .filter(|t| t.teacher_id == teacher_id)
            .ok_or_else(|| AppError::NotFound("Test not found".to_string()))?;
        let questions = self.store.questions_for(test.id).await?;
        Ok((test, questions))
    }

    pub async fn update_quiz(
        &self,
        id: i64,
        teacher_id: &str,
        title: &str,
        level: DifficultyLevel,
        questions: &[DraftQuestion],
    ) -> Result<(), AppError> {
        if questions.is_empty() {
            return Err(AppError::Validation(
                "A quiz needs at least one question.".to_string(),
            ));
        }
        for (i, q) in questions.iter().enumerate() {
            validate_draft(q).map_err(|reason| {
                AppError::Validation(format!("Question {} {}.", i + 1, reason))
            })?;
        }

        let (test, _) = self.load_quiz(id, teacher_id).await?;
        let update = TestUpdate {
            title: title_or_fallback(title, &test.article_text),
            language_level: level,
        };

        if !self.store.update_test(id, teacher_id, &update, questions).await? {
            return Err(AppError::NotFound("Test not found".to_string()));
        }
        tracing::info!("Test {} updated with {} questions", id, questions.len());
        Ok(())
    }

    /// Deletes the test; its questions and submissions are removed with it.
    pub async fn delete_quiz(&self, id: i64, teacher_id: &str) -> Result<(), AppError> {
        if !self.store.delete_test(id, teacher_id).await? {
            return Err(AppError::NotFound("Test not found".to_string()));
        }
        tracing::info!("Test {} deleted", id);
        Ok(())
    }

    pub async fn list_quizzes(
        &self,
        teacher_id: &str,
        filter: &TestFilter,
    ) -> Result<Page<TestSummary>, AppError> {
        self.store.list_tests(teacher_id, filter, QUIZ_PAGE_SIZE).await
    }

    /// Submissions across the teacher's tests with summary statistics.
    pub async fn results(
        &self,
        teacher_id: &str,
        query: &ResultsQuery,
    ) -> Result<ResultsReport, AppError> {
        let tests = all_tests(self.store.as_ref(), teacher_id, RESULTS_TEST_BATCH).await?;
        let submissions = self.store.list_submissions(teacher_id, query.test_id).await?;
        Ok(ResultsReport::build(tests, submissions, query))
    }
}

/// Every test the teacher owns, newest first, fetched one page at a time.
async fn all_tests(
    store: &dyn QuizStore,
    teacher_id: &str,
    batch: i64,
) -> Result<Vec<TestSummary>, AppError> {
    let mut filter = TestFilter::default();
    let mut tests = Vec::new();
    loop {
        let page = store.list_tests(teacher_id, &filter, batch).await?;
        let more = page.has_next();
        tests.extend(page.items);
        if !more {
            return Ok(tests);
        }
        if page.page >= MAX_PAGE {
            tracing::warn!(
                "Results list stopped at {} tests for teacher {}",
                tests.len(),
                teacher_id
            );
            return Ok(tests);
        }
        filter.page = Some(page.page + 1);
    }
}

/// Same shape rules the AI parser applies, for questions edited by hand.
fn validate_draft(q: &DraftQuestion) -> Result<(), &'static str> {
    if q.question.trim().is_empty() {
        return Err("has no question text");
    }
    if q.options.len() < 2 {
        return Err("needs at least two options");
    }
    if q.options.iter().any(|o| o.trim().is_empty()) {
        return Err("has a blank option");
    }
    if !q.options.contains(&q.correct_answer) {
        return Err("must mark one of its options as correct");
    }
    Ok(())
}
