// src/models/submission.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

/// Question id -> the option the student picked.
pub type AnswerMap = BTreeMap<i64, String>;

/// Question id -> breakdown of how that question was answered.
pub type DetailedAnswers = BTreeMap<i64, DetailedAnswer>;

/// Represents the 'submissions' table in the database.
/// Rows are written once per attempt and never updated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub test_id: i64,
    pub student_name: String,
    pub answers: Json<AnswerMap>,
    pub detailed_answers: Option<Json<DetailedAnswers>>,
    pub score: i32,
    pub total_questions: i32,

    /// NUMERIC(5,2) in the database, read back as FLOAT8.
    pub percentage: f64,

    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// Per-question entry of `detailed_answers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedAnswer {
    pub question_text: String,
    pub student_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub order_number: i32,
}

/// Values for a new submission row.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub test_id: i64,
    pub student_name: String,
    pub answers: AnswerMap,
    pub detailed_answers: DetailedAnswers,
    pub score: i32,
    pub total_questions: i32,
    pub percentage: f64,
}

/// `round(100 * score / total, 2)`, or 0 for an empty test.
pub fn percentage(score: i32, total_questions: i32) -> f64 {
    if total_questions <= 0 {
        return 0.0;
    }
    (f64::from(score) * 10_000.0 / f64::from(total_questions)).round() / 100.0
}

/// Student form for opening a test.
#[derive(Debug, Deserialize, validator::Validate)]
pub struct StartAttemptForm {
    #[validate(length(min = 1, message = "Please enter your name."))]
    #[serde(default)]
    pub student_name: String,
    #[validate(length(min = 1, message = "Please enter the test access code."))]
    #[serde(default)]
    pub access_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_rounds_to_two_places() {
        assert_eq!(percentage(3, 5), 60.0);
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(5, 5), 100.0);
        assert_eq!(percentage(0, 7), 0.0);
    }

    #[test]
    fn percentage_of_empty_test_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn answer_keys_serialize_as_strings() {
        let mut answers = AnswerMap::new();
        answers.insert(12, "Paris".to_string());
        let json = serde_json::to_value(&answers).unwrap();
        assert_eq!(json, serde_json::json!({"12": "Paris"}));
        let back: AnswerMap = serde_json::from_value(json).unwrap();
        assert_eq!(back.get(&12).map(String::as_str), Some("Paris"));
    }
}
