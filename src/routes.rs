// src/routes.rs

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    handlers::{health, student, teacher},
    session::session_middleware,
    state::{StudentState, TeacherState},
};

/// Assembles the teacher app: article ingestion, quiz drafting, the quiz library and results.
pub fn teacher_router(state: TeacherState) -> Router {
    let draft_routes = Router::new()
        .route("/generate", post(teacher::generate_quiz))
        .route(
            "/questions/{number}/regenerate",
            post(teacher::regenerate_draft_question),
        )
        .route("/save", post(teacher::save_quiz))
        .route("/discard", post(teacher::discard_quiz));

    let library_routes = Router::new()
        .route("/", get(teacher::list_quizzes))
        .route("/{id}", get(teacher::quiz_detail))
        .route(
            "/{id}/edit",
            get(teacher::edit_page).post(teacher::save_edit),
        )
        .route(
            "/{id}/questions/{number}/regenerate",
            post(teacher::regenerate_saved_question),
        )
        .route("/{id}/delete", post(teacher::delete_quiz));

    Router::new()
        .route("/", get(teacher::create_page))
        .route("/article", post(teacher::process_article))
        .route("/results", get(teacher::results))
        .route("/health", get(health))
        .nest("/quiz", draft_routes)
        .nest("/quizzes", library_routes)
        // Applied from outside in: trace, then session
        .layer(middleware::from_fn(session_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Assembles the student app: access code entry, the test form and the result.
pub fn student_router(state: StudentState) -> Router {
    Router::new()
        .route("/", get(student::current_step))
        .route("/start", post(student::start))
        .route("/submit", post(student::submit))
        .route("/restart", post(student::restart))
        .route("/health", get(health))
        .layer(middleware::from_fn(session_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
