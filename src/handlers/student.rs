// src/handlers/student.rs

use axum::{
    Extension, Form,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use validator::Validate;

use crate::{
    error::AppError,
    models::submission::StartAttemptForm,
    service::Attempt,
    session::SessionId,
    state::StudentState,
    views::{self, Notice},
};

/// Renders whichever step the session's attempt is at.
pub async fn current_step(
    State(state): State<StudentState>,
    Extension(sid): Extension<SessionId>,
) -> Html<String> {
    let page = match state.sessions.load(&sid) {
        Attempt::AwaitingCode => views::student::start_page("", "", None),
        Attempt::InProgress(progress) => views::student::test_page(&progress, None),
        Attempt::Submitted(result) => views::student::result_page(&result),
    };
    Html(page.into_string())
}

pub async fn start(
    State(state): State<StudentState>,
    Extension(sid): Extension<SessionId>,
    Form(form): Form<StartAttemptForm>,
) -> Response {
    let mut attempt = state.sessions.load(&sid);

    let outcome = match form.validate() {
        Ok(()) => {
            attempt
                .start(state.store.as_ref(), &form.student_name, &form.access_code)
                .await
        }
        Err(e) => Err(AppError::from(e)),
    };

    match outcome {
        Ok(()) => {
            state.sessions.save(&sid, attempt);
            Redirect::to("/").into_response()
        }
        Err(e) => {
            e.log();
            let page = views::student::start_page(
                form.student_name.trim(),
                form.access_code.trim(),
                Some(&Notice::error(e.user_message())),
            );
            (e.status(), Html(page.into_string())).into_response()
        }
    }
}

/// Question id from a `q_{id}` radio group name.
fn answer_field(name: &str) -> Option<i64> {
    name.strip_prefix("q_")?.parse().ok()
}

/// Records the posted answers, then grades and stores the attempt.
/// Answers are kept when the submission is rejected so the form comes back filled in.
pub async fn submit(
    State(state): State<StudentState>,
    Extension(sid): Extension<SessionId>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let mut attempt = state.sessions.load(&sid);

    let mut outcome = fields
        .iter()
        .filter_map(|(name, value)| answer_field(name).map(|id| (id, value)))
        .try_for_each(|(id, value)| attempt.record_answer(id, value));
    if outcome.is_ok() {
        outcome = attempt.submit(state.store.as_ref()).await.map(|_| ());
    }

    match outcome {
        Ok(()) => {
            state.sessions.save(&sid, attempt);
            Redirect::to("/").into_response()
        }
        Err(e) => {
            e.log();
            let response = match &attempt {
                Attempt::InProgress(progress) => {
                    let notice = Notice::error(e.user_message());
                    let page = views::student::test_page(progress, Some(&notice));
                    (e.status(), Html(page.into_string())).into_response()
                }
                _ => Redirect::to("/").into_response(),
            };
            state.sessions.save(&sid, attempt);
            response
        }
    }
}

pub async fn restart(
    State(state): State<StudentState>,
    Extension(sid): Extension<SessionId>,
) -> Redirect {
    let mut attempt = state.sessions.load(&sid);
    attempt.restart();
    state.sessions.save(&sid, attempt);
    Redirect::to("/")
}
