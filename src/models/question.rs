// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub test_id: i64,

    /// The text content of the question.
    pub question_text: String,

    /// The option that scores the point. Always one of `options`.
    pub correct_answer: String,

    /// Answer options (e.g., ["Option A", "Option B"]).
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// 1-based position within the test.
    pub order_number: i32,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Question {
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    pub fn to_draft(&self) -> DraftQuestion {
        DraftQuestion {
            question: self.question_text.clone(),
            options: self.options.0.clone(),
            correct_answer: self.correct_answer.clone(),
        }
    }
}

/// A question that exists only in the teacher's session until the quiz is saved.
/// Field names follow the JSON shape the completion model is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

/// A draft paired with the ordinal it will be stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedQuestion<'a> {
    pub order_number: i32,
    pub draft: &'a DraftQuestion,
}

/// Assigns the contiguous ordinals 1..=N in list order.
pub fn number_questions(questions: &[DraftQuestion]) -> Vec<NumberedQuestion<'_>> {
    questions
        .iter()
        .zip(1..)
        .map(|(draft, order_number)| NumberedQuestion {
            order_number,
            draft,
        })
        .collect()
}
