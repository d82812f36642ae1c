// src/handlers/teacher.rs

use std::collections::HashMap;

use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        level::DifficultyLevel,
        question::DraftQuestion,
        quiz::{ArticleForm, GenerateForm, NewTest, SaveQuizForm, TestFilter},
    },
    service::{QuizDraft, results::ResultsQuery},
    session::SessionId,
    state::{EditDraft, TeacherSession, TeacherState},
    views::{self, Notice},
};

/// Loads the session and takes its pending notice.
fn take_notice(state: &TeacherState, sid: &SessionId) -> (TeacherSession, Option<Notice>) {
    let mut session = state.sessions.load(sid);
    let notice = session.notice.take();
    if notice.is_some() {
        state.sessions.save(sid, session.clone());
    }
    (session, notice)
}

/// Stores the outcome as a notice and redirects to `to` (post/redirect/get).
fn finish(
    state: &TeacherState,
    sid: &SessionId,
    mut session: TeacherSession,
    outcome: Result<String, AppError>,
    to: &str,
) -> Response {
    session.notice = Some(match outcome {
        Ok(message) => Notice::success(message),
        Err(e) => {
            e.log();
            Notice::error(e.user_message())
        }
    });
    state.sessions.save(sid, session);
    Redirect::to(to).into_response()
}

fn parse_level(raw: &str) -> Result<DifficultyLevel, AppError> {
    raw.parse::<DifficultyLevel>()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// Maps a 1-based question number from the URL to a list index.
fn question_index(number: usize) -> Result<usize, AppError> {
    number
        .checked_sub(1)
        .ok_or_else(|| AppError::Validation("Question numbers start at 1.".to_string()))
}

fn no_article() -> AppError {
    AppError::Validation("Load an article first.".to_string())
}

pub async fn create_page(
    State(state): State<TeacherState>,
    Extension(sid): Extension<SessionId>,
) -> Html<String> {
    let (session, notice) = take_notice(&state, &sid);
    Html(
        views::teacher::create_page(
            &session,
            state.config.default_level,
            state.config.default_question_count,
            notice.as_ref(),
        )
        .into_string(),
    )
}

/// Fetches, cleans and adapts the article. Replaces any previous article and draft.
pub async fn process_article(
    State(state): State<TeacherState>,
    Extension(sid): Extension<SessionId>,
    Form(form): Form<ArticleForm>,
) -> Response {
    let mut session = state.sessions.load(&sid);

    let outcome = async {
        form.validate()?;
        let level = parse_level(&form.level)?;
        state.quiz.process_article(&form.url, level).await
    }
    .await;

    let outcome = outcome.map(|article| {
        let message = format!("Article loaded: {}", article.title);
        session.article = Some(article);
        session.draft.clear();
        message
    });
    finish(&state, &sid, session, outcome, "/")
}

pub async fn generate_quiz(
    State(state): State<TeacherState>,
    Extension(sid): Extension<SessionId>,
    Form(form): Form<GenerateForm>,
) -> Response {
    let mut session = state.sessions.load(&sid);

    let outcome = async {
        form.validate()?;
        let article = session.article.as_ref().ok_or_else(no_article)?;
        state
            .quiz
            .generate_quiz(&article.content, article.level, form.count)
            .await
    }
    .await;

    let outcome = outcome.map(|questions| {
        let message = format!("Generated {} questions.", questions.len());
        session.draft = questions;
        message
    });
    finish(&state, &sid, session, outcome, "/")
}

pub async fn regenerate_draft_question(
    State(state): State<TeacherState>,
    Extension(sid): Extension<SessionId>,
    Path(number): Path<usize>,
) -> Response {
    let mut session = state.sessions.load(&sid);

    let outcome = async {
        let index = question_index(number)?;
        let article = session.article.as_ref().ok_or_else(no_article)?;
        let context = QuizDraft {
            article_text: &article.content,
            level: article.level,
            questions: &session.draft,
        };
        let question = state.quiz.regenerate_question(index, context).await?;
        Ok::<_, AppError>((index, question))
    }
    .await;

    let outcome = outcome.map(|(index, question)| {
        session.draft[index] = question;
        format!("Question {} regenerated.", number)
    });
    finish(&state, &sid, session, outcome, "/")
}

/// Persists the draft and shows the saved quiz with its access code.
pub async fn save_quiz(
    State(state): State<TeacherState>,
    Extension(sid): Extension<SessionId>,
    Form(form): Form<SaveQuizForm>,
) -> Response {
    let mut session = state.sessions.load(&sid);

    let outcome = async {
        form.validate()?;
        let article = session.article.as_ref().ok_or_else(no_article)?;
        let test = NewTest {
            title: form.title.clone(),
            article_url: article.url.clone(),
            article_text: article.content.clone(),
            language_level: article.level,
            teacher_id: state.config.teacher_id.clone(),
        };
        state.quiz.save_quiz(test, &session.draft).await
    }
    .await;

    match outcome {
        Ok(saved) => {
            session.article = None;
            session.draft.clear();
            let message = format!("Quiz saved! Access code: {}", saved.access_code);
            finish(&state, &sid, session, Ok(message), &format!("/quizzes/{}", saved.id))
        }
        Err(e) => finish(&state, &sid, session, Err(e), "/"),
    }
}

pub async fn discard_quiz(
    State(state): State<TeacherState>,
    Extension(sid): Extension<SessionId>,
) -> Response {
    let mut session = state.sessions.load(&sid);
    session.article = None;
    session.draft.clear();
    finish(&state, &sid, session, Ok("Draft discarded.".to_string()), "/")
}

pub async fn list_quizzes(
    State(state): State<TeacherState>,
    Extension(sid): Extension<SessionId>,
    Query(filter): Query<TestFilter>,
) -> Result<Html<String>, AppError> {
    let (_, notice) = take_notice(&state, &sid);
    let page = state
        .quiz
        .list_quizzes(&state.config.teacher_id, &filter)
        .await?;
    Ok(Html(
        views::teacher::quiz_list_page(&page, &filter, notice.as_ref()).into_string(),
    ))
}

pub async fn quiz_detail(
    State(state): State<TeacherState>,
    Extension(sid): Extension<SessionId>,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let (test, questions) = state.quiz.load_quiz(id, &state.config.teacher_id).await?;
    let (_, notice) = take_notice(&state, &sid);
    Ok(Html(
        views::teacher::quiz_detail_page(&test, &questions, notice.as_ref()).into_string(),
    ))
}

/// The session's edit draft for `id`, loading the stored quiz when there is none yet.
async fn edit_draft(
    state: &TeacherState,
    session: &TeacherSession,
    id: i64,
) -> Result<EditDraft, AppError> {
    if let Some(edit) = session.editing.as_ref().filter(|e| e.test_id == id) {
        return Ok(edit.clone());
    }
    let (test, questions) = state.quiz.load_quiz(id, &state.config.teacher_id).await?;
    Ok(EditDraft {
        test_id: test.id,
        title: test.title,
        level: test.language_level,
        article_text: test.article_text,
        questions: questions.iter().map(|q| q.to_draft()).collect(),
    })
}

pub async fn edit_page(
    State(state): State<TeacherState>,
    Extension(sid): Extension<SessionId>,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let (mut session, notice) = take_notice(&state, &sid);
    let edit = edit_draft(&state, &session, id).await?;
    let page = views::teacher::edit_page(&edit, notice.as_ref());
    session.editing = Some(edit);
    state.sessions.save(&sid, session);
    Ok(Html(page.into_string()))
}

/// Values posted by the edit form.
#[derive(Debug, PartialEq)]
pub struct EditedQuiz {
    pub title: String,
    pub level: DifficultyLevel,
    pub questions: Vec<DraftQuestion>,
}

/// Reads `title`, `level`, `question_{n}`, `option_{n}_{k}` and `correct_{n}`.
/// Questions are read from n = 1 until the first gap. A missing or invalid
/// `correct_{n}` leaves the correct answer empty.
pub fn parse_edit_form(fields: &[(String, String)]) -> Result<EditedQuiz, AppError> {
    let map: HashMap<&str, &str> = fields
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let title = map.get("title").copied().unwrap_or_default().trim().to_string();
    let level = parse_level(map.get("level").copied().unwrap_or_default())?;

    let mut questions = Vec::new();
    for n in 1.. {
        let Some(text) = map.get(format!("question_{}", n).as_str()) else {
            break;
        };

        let mut options = Vec::new();
        for k in 0.. {
            let Some(option) = map.get(format!("option_{}_{}", n, k).as_str()) else {
                break;
            };
            options.push(option.trim().to_string());
        }

        let correct_answer = map
            .get(format!("correct_{}", n).as_str())
            .and_then(|k| k.parse::<usize>().ok())
            .and_then(|k| options.get(k).cloned())
            .unwrap_or_default();

        questions.push(DraftQuestion {
            question: text.trim().to_string(),
            options,
            correct_answer,
        });
    }

    Ok(EditedQuiz {
        title,
        level,
        questions,
    })
}

/// Applies posted edits on top of the session draft for `id`.
async fn apply_edits(
    state: &TeacherState,
    session: &TeacherSession,
    id: i64,
    fields: &[(String, String)],
) -> Result<EditDraft, AppError> {
    let mut edit = edit_draft(state, session, id).await?;
    let edited = parse_edit_form(fields)?;
    edit.title = edited.title;
    edit.level = edited.level;
    edit.questions = edited.questions;
    Ok(edit)
}

pub async fn save_edit(
    State(state): State<TeacherState>,
    Extension(sid): Extension<SessionId>,
    Path(id): Path<i64>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let mut session = state.sessions.load(&sid);

    let edit = match apply_edits(&state, &session, id, &fields).await {
        Ok(edit) => edit,
        Err(e) => return finish(&state, &sid, session, Err(e), "/quizzes"),
    };

    let saved = state
        .quiz
        .update_quiz(id, &state.config.teacher_id, &edit.title, edit.level, &edit.questions)
        .await;

    match saved {
        Ok(()) => {
            session.editing = None;
            finish(
                &state,
                &sid,
                session,
                Ok("Changes saved.".to_string()),
                &format!("/quizzes/{}", id),
            )
        }
        Err(e) => {
            session.editing = Some(edit);
            finish(&state, &sid, session, Err(e), &format!("/quizzes/{}/edit", id))
        }
    }
}

pub async fn regenerate_saved_question(
    State(state): State<TeacherState>,
    Extension(sid): Extension<SessionId>,
    Path((id, number)): Path<(i64, usize)>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let mut session = state.sessions.load(&sid);

    let mut edit = match apply_edits(&state, &session, id, &fields).await {
        Ok(edit) => edit,
        Err(e) => return finish(&state, &sid, session, Err(e), "/quizzes"),
    };

    let outcome = async {
        let index = question_index(number)?;
        let context = QuizDraft {
            article_text: &edit.article_text,
            level: edit.level,
            questions: &edit.questions,
        };
        let question = state.quiz.regenerate_question(index, context).await?;
        Ok::<_, AppError>((index, question))
    }
    .await;

    let outcome = outcome.map(|(index, question)| {
        edit.questions[index] = question;
        format!("Question {} regenerated. Save to keep it.", number)
    });
    session.editing = Some(edit);
    finish(&state, &sid, session, outcome, &format!("/quizzes/{}/edit", id))
}

pub async fn delete_quiz(
    State(state): State<TeacherState>,
    Extension(sid): Extension<SessionId>,
    Path(id): Path<i64>,
) -> Response {
    let mut session = state.sessions.load(&sid);
    let outcome = state
        .quiz
        .delete_quiz(id, &state.config.teacher_id)
        .await
        .map(|()| "Quiz deleted.".to_string());
    if session.editing.as_ref().is_some_and(|e| e.test_id == id) {
        session.editing = None;
    }
    finish(&state, &sid, session, outcome, "/quizzes")
}

pub async fn results(
    State(state): State<TeacherState>,
    Query(query): Query<ResultsQuery>,
) -> Result<Html<String>, AppError> {
    let report = state.quiz.results(&state.config.teacher_id, &query).await?;
    Ok(Html(views::teacher::results_page(&report, &query).into_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn edit_form_reads_questions_until_gap() {
        let posted = fields(&[
            ("title", " Rivers "),
            ("level", "b1"),
            ("question_1", "Where?"),
            ("option_1_0", "East"),
            ("option_1_1", " West "),
            ("correct_1", "1"),
            ("question_2", "Why?"),
            ("option_2_0", "Because"),
            ("question_4", "Skipped"),
        ]);

        let edited = parse_edit_form(&posted).unwrap();

        assert_eq!(edited.title, "Rivers");
        assert_eq!(edited.level, DifficultyLevel::B1);
        assert_eq!(edited.questions.len(), 2);
        assert_eq!(edited.questions[0].options, vec!["East", "West"]);
        assert_eq!(edited.questions[0].correct_answer, "West");
        assert_eq!(edited.questions[1].correct_answer, "");
    }

    #[test]
    fn edit_form_rejects_unknown_level() {
        let posted = fields(&[("title", "x"), ("level", "Z9")]);
        assert!(matches!(
            parse_edit_form(&posted),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn question_numbers_are_one_based() {
        assert_eq!(question_index(1).unwrap(), 0);
        assert!(question_index(0).is_err());
    }
}
