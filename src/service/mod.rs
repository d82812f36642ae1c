// src/service/mod.rs

pub mod attempt;
pub mod quiz;
pub mod results;

pub use attempt::Attempt;
pub use quiz::{QuizDraft, QuizService};
