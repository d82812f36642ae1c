// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::models::level::DifficultyLevel;

/// Represents the 'tests' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Test {
    pub id: i64,
    pub title: String,
    pub article_url: String,

    /// Article text the questions were generated from (already adapted to the level).
    pub article_text: String,

    #[sqlx(try_from = "String")]
    pub language_level: DifficultyLevel,

    pub teacher_id: String,

    /// Short code students type to open the test. Unique across all tests.
    pub access_code: String,

    pub created_at: DateTime<Utc>,
}

/// A row of the teacher's quiz list: the test without its article, plus how many questions it has.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TestSummary {
    pub id: i64,
    pub title: String,
    pub article_url: String,
    #[sqlx(try_from = "String")]
    pub language_level: DifficultyLevel,
    pub access_code: String,
    pub created_at: DateTime<Utc>,
    pub question_count: i64,
}

/// Metadata for a test that is about to be saved. The access code is assigned on save.
#[derive(Debug, Clone)]
pub struct NewTest {
    pub title: String,
    pub article_url: String,
    pub article_text: String,
    pub language_level: DifficultyLevel,
    pub teacher_id: String,
}

/// Replacement values for an edited test.
#[derive(Debug, Clone)]
pub struct TestUpdate {
    pub title: String,
    pub language_level: DifficultyLevel,
}

/// An article after ingestion, cleanup and level adaptation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub content: String,
    pub level: DifficultyLevel,
}

/// Highest page index a listing accepts; larger requests are clamped to it.
pub const MAX_PAGE: i64 = 100_000;

/// Query parameters for the teacher's quiz list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestFilter {
    /// `None` (or "all") lists every level.
    #[serde(default, deserialize_with = "deserialize_level_filter")]
    pub level: Option<DifficultyLevel>,

    /// Case-insensitive title search.
    #[serde(default)]
    pub search: Option<String>,

    /// Zero-based page index.
    #[serde(default)]
    pub page: Option<i64>,
}

impl TestFilter {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(0).clamp(0, MAX_PAGE)
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

fn deserialize_level_filter<'de, D: serde::Deserializer<'de>>(
    d: D,
) -> Result<Option<DifficultyLevel>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub total_items: i64,
    pub page_size: i64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        if self.page_size <= 0 {
            return 0;
        }
        (self.total_items + self.page_size - 1) / self.page_size
    }

    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    pub fn has_next(&self) -> bool {
        self.page.saturating_add(1) < self.total_pages()
    }
}

/// Form posted by the teacher to load an article.
#[derive(Debug, Deserialize, Validate)]
pub struct ArticleForm {
    #[validate(url(message = "Please enter a valid article URL."))]
    pub url: String,
    pub level: String,
}

/// Form posted by the teacher to generate questions for the loaded article.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateForm {
    #[validate(range(min = 1, max = 20, message = "Question count must be between 1 and 20."))]
    pub count: u32,
}

/// Form posted when saving the draft quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct SaveQuizForm {
    #[validate(length(max = 200, message = "Title must be at most 200 characters."))]
    #[serde(default)]
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_index_is_clamped() {
        let filter = |page| TestFilter {
            page: Some(page),
            ..Default::default()
        };
        assert_eq!(filter(-3).page(), 0);
        assert_eq!(filter(4).page(), 4);
        assert_eq!(filter(i64::MAX).page(), MAX_PAGE);
        assert_eq!(TestFilter::default().page(), 0);
    }

    #[test]
    fn last_page_has_no_next() {
        let page = Page::<()> {
            items: vec![],
            page: i64::MAX,
            total_items: 3,
            page_size: 10,
        };
        assert!(!page.has_next());
        assert!(page.has_previous());
    }
}
