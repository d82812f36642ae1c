// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    models::{level::DifficultyLevel, question::DraftQuestion, quiz::Article},
    service::{Attempt, QuizService},
    session::SessionStore,
    store::QuizStore,
    views::Notice,
};

/// Work in progress of one teacher browser session.
#[derive(Debug, Clone, Default)]
pub struct TeacherSession {
    /// The processed article questions are generated from.
    pub article: Option<Article>,
    /// Questions generated for `article`, not yet saved.
    pub draft: Vec<DraftQuestion>,
    /// A saved quiz being edited.
    pub editing: Option<EditDraft>,
    /// Shown once on the next rendered page.
    pub notice: Option<Notice>,
}

/// Unsaved edits to a stored test.
#[derive(Debug, Clone)]
pub struct EditDraft {
    pub test_id: i64,
    pub title: String,
    pub level: DifficultyLevel,
    pub article_text: String,
    pub questions: Vec<DraftQuestion>,
}

#[derive(Clone)]
pub struct TeacherState {
    pub quiz: QuizService,
    pub config: Config,
    pub sessions: SessionStore<TeacherSession>,
}

#[derive(Clone)]
pub struct StudentState {
    pub store: Arc<dyn QuizStore>,
    pub sessions: SessionStore<Attempt>,
}

impl FromRef<TeacherState> for QuizService {
    fn from_ref(state: &TeacherState) -> Self {
        state.quiz.clone()
    }
}

impl FromRef<TeacherState> for Config {
    fn from_ref(state: &TeacherState) -> Self {
        state.config.clone()
    }
}

impl FromRef<StudentState> for Arc<dyn QuizStore> {
    fn from_ref(state: &StudentState) -> Self {
        state.store.clone()
    }
}
