// src/ai/mod.rs

//! Chat-completion access and the quiz prompts built on top of it.

pub mod client;
pub mod parse;
pub mod prompts;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::MAX_QUESTION_COUNT,
    error::AppError,
    models::{level::DifficultyLevel, question::DraftQuestion},
};

pub use client::OpenAiClient;

/// Replies shorter than this are treated as a failed cleanup or adaptation.
pub const MIN_TEXT_REPLY_CHARS: usize = 50;

const TEXT_TEMPERATURE: f32 = 0.3;
const QUIZ_TEMPERATURE: f32 = 0.7;

/// One system + user exchange.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f32,
}

/// A hosted chat-completion endpoint. Returns the text of the first choice.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: ChatRequest<'_>) -> Result<String, AppError>;
}

/// Prompt templates and response handling for every AI-backed step.
#[derive(Clone)]
pub struct AiService {
    completion: Arc<dyn ChatCompletion>,
}

impl AiService {
    pub fn new(completion: Arc<dyn ChatCompletion>) -> Self {
        Self { completion }
    }

    /// Turns raw page text into the article alone, formatted as Markdown.
    pub async fn clean_article(&self, raw_text: &str) -> Result<String, AppError> {
        tracing::info!("Sending request to AI for cleaning ({} chars)", raw_text.len());
        let user = prompts::clean_user(raw_text);
        let cleaned = self
            .completion
            .complete(ChatRequest {
                system: prompts::CLEAN_SYSTEM,
                user: &user,
                temperature: TEXT_TEMPERATURE,
            })
            .await?;

        require_text(cleaned, "cleaned article")
    }

    /// Rewrites the article for the level. `Original` returns it untouched without a request.
    pub async fn adapt_text(&self, text: &str, level: DifficultyLevel) -> Result<String, AppError> {
        if !level.needs_adaptation() {
            tracing::info!("No adaptation needed, returning original text");
            return Ok(text.to_string());
        }

        tracing::info!("Starting text adaptation to level {}", level);
        let system = prompts::adapt_system(level);
        let user = prompts::adapt_user(text, level);
        let adapted = self
            .completion
            .complete(ChatRequest {
                system: &system,
                user: &user,
                temperature: TEXT_TEMPERATURE,
            })
            .await?;

        require_text(adapted, "adapted text")
    }

    pub async fn generate_questions(
        &self,
        text: &str,
        count: u32,
        level: DifficultyLevel,
    ) -> Result<Vec<DraftQuestion>, AppError> {
        if !(1..=MAX_QUESTION_COUNT).contains(&count) {
            return Err(AppError::Validation(format!(
                "Question count must be between 1 and {}.",
                MAX_QUESTION_COUNT
            )));
        }

        tracing::info!("Starting quiz generation, questions: {}, level: {}", count, level);
        let system = prompts::generate_system(count, level);
        let user = prompts::generate_user(text, count);
        let reply = self
            .completion
            .complete(ChatRequest {
                system: &system,
                user: &user,
                temperature: QUIZ_TEMPERATURE,
            })
            .await?;
        tracing::debug!("Raw quiz response: {}", reply);

        let questions = parse::parse_question_list(&reply, count as usize)?;
        tracing::info!("Generated and validated {} questions", questions.len());
        Ok(questions)
    }

    /// A replacement for `existing[index]` that differs from the other questions.
    pub async fn regenerate_question(
        &self,
        text: &str,
        index: usize,
        existing: &[DraftQuestion],
        level: DifficultyLevel,
    ) -> Result<DraftQuestion, AppError> {
        tracing::info!("Regenerating question {} (level {})", index + 1, level);
        let system = prompts::regenerate_system(existing, index, level);
        let user = prompts::regenerate_user(text);
        let reply = self
            .completion
            .complete(ChatRequest {
                system: &system,
                user: &user,
                temperature: QUIZ_TEMPERATURE,
            })
            .await?;
        tracing::debug!("Raw question response: {}", reply);

        parse::parse_single_question(&reply)
    }
}

fn require_text(reply: String, what: &str) -> Result<String, AppError> {
    if reply.trim().chars().count() < MIN_TEXT_REPLY_CHARS {
        return Err(AppError::Ai(format!(
            "AI returned too short or empty {}",
            what
        )));
    }
    Ok(reply)
}
