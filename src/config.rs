// src/config.rs

use std::env;
use std::str::FromStr;

use dotenvy::dotenv;

use crate::{error::AppError, models::level::DifficultyLevel};

/// Upper bound for the number of questions a single quiz may hold.
pub const MAX_QUESTION_COUNT: u32 = 20;

/// Number of quizzes shown per page in the teacher's list.
pub const QUIZ_PAGE_SIZE: i64 = 10;

/// A submission at or above this percentage counts as passed in the results report.
pub const PASSING_PERCENTAGE: f64 = 60.0;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` runs against the in-memory store.
    pub database_url: Option<String>,
    /// Only the teacher app calls the completion API; see `require_ai_key`.
    pub ai_api_key: Option<String>,
    pub ai_api_base: String,
    pub ai_model: String,
    pub default_level: DifficultyLevel,
    pub default_question_count: u32,
    /// Owner recorded on every quiz created through the teacher app.
    pub teacher_id: String,
    pub article_max_chars: usize,
    pub http_timeout_secs: u64,
    pub teacher_port: u16,
    pub student_port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty());

        let ai_api_key = env::var("AI_API_KEY").ok().filter(|v| !v.trim().is_empty());

        let ai_api_base =
            env::var("AI_API_BASE").unwrap_or_else(|_| "https://api.deepseek.com/v1".to_string());

        let ai_model = env::var("AI_API_MODEL").unwrap_or_else(|_| "deepseek-chat".to_string());

        let default_level = parse_var("DEFAULT_LEVEL", DifficultyLevel::Original)?;

        let default_question_count =
            parse_var::<u32>("DEFAULT_QUESTION_COUNT", 5)?.clamp(1, MAX_QUESTION_COUNT);

        let teacher_id = env::var("TEACHER_ID").unwrap_or_else(|_| "default".to_string());

        let article_max_chars = parse_var("ARTICLE_MAX_CHARS", 32_000)?;
        let http_timeout_secs = parse_var("HTTP_TIMEOUT_SECS", 60)?;
        let teacher_port = parse_var("TEACHER_PORT", 8501)?;
        let student_port = parse_var("STUDENT_PORT", 8502)?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            database_url,
            ai_api_key,
            ai_api_base,
            ai_model,
            default_level,
            default_question_count,
            teacher_id,
            article_max_chars,
            http_timeout_secs,
            teacher_port,
            student_port,
            rust_log,
        })
    }

    pub fn require_ai_key(&self) -> Result<&str, AppError> {
        self.ai_api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("AI_API_KEY must be set".to_string()))
    }
}

/// Reads an optional variable, falling back to `default` when it is unset.
fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}
