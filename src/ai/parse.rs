// src/ai/parse.rs

//! Strict parsing of the model's question JSON.
//!
//! Replies are free text that should contain JSON. The JSON is located, decoded
//! into `RawQuestion`, and each question is checked before it becomes a
//! `DraftQuestion`. Anything off-shape is an `AppError::Ai`.

use std::collections::HashSet;

use serde::Deserialize;

use crate::{error::AppError, models::question::DraftQuestion};

pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Deserialize)]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    correct_answer: String,
}

/// Parses a reply that should hold a JSON array of questions.
/// Extra questions beyond `expected` are dropped; fewer is an error.
pub fn parse_question_list(reply: &str, expected: usize) -> Result<Vec<DraftQuestion>, AppError> {
    let json = extract_json(reply, '[', ']')
        .ok_or_else(|| AppError::Ai("no JSON array found in the AI response".to_string()))?;

    let raw: Vec<RawQuestion> = serde_json::from_str(json).map_err(|e| {
        tracing::error!("Invalid quiz JSON: {}", json);
        AppError::Ai(format!("invalid quiz JSON: {}", e))
    })?;

    if raw.is_empty() {
        return Err(AppError::Ai("the AI returned no questions".to_string()));
    }
    if raw.len() < expected {
        return Err(AppError::Ai(format!(
            "asked for {} questions but the AI returned {}",
            expected,
            raw.len()
        )));
    }
    if raw.len() > expected {
        tracing::warn!(
            "AI returned {} questions, keeping the first {}",
            raw.len(),
            expected
        );
    }

    raw.into_iter()
        .take(expected)
        .enumerate()
        .map(|(i, q)| validate(q).map_err(|reason| question_error(Some(i + 1), reason)))
        .collect()
}

/// Parses a reply that should hold a single JSON question object.
pub fn parse_single_question(reply: &str) -> Result<DraftQuestion, AppError> {
    let json = extract_json(reply, '{', '}')
        .ok_or_else(|| AppError::Ai("no JSON object found in the AI response".to_string()))?;

    let raw: RawQuestion = serde_json::from_str(json).map_err(|e| {
        tracing::error!("Invalid question JSON: {}", json);
        AppError::Ai(format!("invalid question JSON: {}", e))
    })?;

    validate(raw).map_err(|reason| question_error(None, reason))
}

/// Span from the first `open` to the last `close`, which skips prose and code fences around the JSON.
fn extract_json(reply: &str, open: char, close: char) -> Option<&str> {
    let start = reply.find(open)?;
    let end = reply.rfind(close)?;
    (end > start).then(|| &reply[start..=end])
}

fn question_error(position: Option<usize>, reason: String) -> AppError {
    match position {
        Some(n) => AppError::Ai(format!("question {} {}", n, reason)),
        None => AppError::Ai(format!("question {}", reason)),
    }
}

fn validate(raw: RawQuestion) -> Result<DraftQuestion, String> {
    let question = raw.question.trim().to_string();
    if question.is_empty() {
        return Err("has no question text".to_string());
    }

    let options: Vec<String> = raw.options.iter().map(|o| o.trim().to_string()).collect();
    if options.len() != OPTIONS_PER_QUESTION {
        return Err(format!(
            "must have exactly {} options, got {}",
            OPTIONS_PER_QUESTION,
            options.len()
        ));
    }
    if options.iter().any(String::is_empty) {
        return Err("has a blank option".to_string());
    }
    let distinct: HashSet<&str> = options.iter().map(String::as_str).collect();
    if distinct.len() != options.len() {
        return Err("has duplicate options".to_string());
    }

    let correct_answer = raw.correct_answer.trim().to_string();
    if !distinct.contains(correct_answer.as_str()) {
        return Err("has a correct answer that is not among its options".to_string());
    }

    Ok(DraftQuestion {
        question,
        options,
        correct_answer,
    })
}
