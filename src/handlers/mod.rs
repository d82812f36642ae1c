// src/handlers/mod.rs

pub mod student;
pub mod teacher;

/// Liveness probe for both apps.
pub async fn health() -> &'static str {
    "ok"
}
