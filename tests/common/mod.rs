// tests/common/mod.rs

#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    Router,
    http::header,
    response::{Html, IntoResponse},
    routing::get,
};
use quizmaker::{
    ai::{AiService, ChatCompletion, ChatRequest},
    config::Config,
    error::AppError,
    ingest::ArticleFetcher,
    models::{level::DifficultyLevel, question::DraftQuestion, quiz::NewTest, quiz::Test},
    routes,
    service::QuizService,
    session::SessionStore,
    state::{StudentState, TeacherState},
    store::{MemoryStore, QuizStore},
};

pub const TEACHER_ID: &str = "teacher-1";

pub const CLEANED_ARTICLE: &str = "# Rivers of Europe\n\nThe Danube flows east through ten countries before reaching the Black Sea. The Rhine flows north.";

pub const ARTICLE_HTML: &str = r#"<!DOCTYPE html>
<html><head><title>News</title><script>var tracking = "pixel";</script></head>
<body><nav>Home | Sport | Weather</nav>
<article><h1>Rivers of Europe</h1><p>The Danube flows east &amp; the Rhine flows north.</p></article>
<footer>Copyright Example Media</footer></body></html>"#;

/// Answers prompts the way a well-behaved model would and remembers what it was asked.
#[derive(Default)]
pub struct ScriptedAi {
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedAi {
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

pub fn question_json(text: &str, right: &str) -> serde_json::Value {
    serde_json::json!({
        "question": text,
        "options": [right, "Wrong one", "Wrong two", "Wrong three"],
        "correct_answer": right,
    })
}

#[async_trait]
impl ChatCompletion for ScriptedAi {
    async fn complete(&self, request: ChatRequest<'_>) -> Result<String, AppError> {
        self.prompts.lock().unwrap().push(request.user.to_string());
        let user = request.user;

        if user.starts_with("Find, clean and format") {
            return Ok(CLEANED_ARTICLE.to_string());
        }
        if user.starts_with("Adapt this text") {
            return Ok(format!("{}\n\nSimple words only.", CLEANED_ARTICLE));
        }
        if user.starts_with("Generate a new question") {
            return Ok(question_json("Fresh question about rivers?", "Fresh answer").to_string());
        }
        if let Some(rest) = user.strip_prefix("Generate ") {
            let count: usize = rest
                .split_whitespace()
                .next()
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| AppError::Ai("unexpected prompt".to_string()))?;
            let questions: Vec<serde_json::Value> = (1..=count)
                .map(|i| question_json(&format!("Question {} about rivers?", i), &format!("Right {}", i)))
                .collect();
            return Ok(format!(
                "Here you go:\n```json\n{}\n```",
                serde_json::Value::Array(questions)
            ));
        }
        Err(AppError::Ai("unexpected prompt".to_string()))
    }
}

pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}", port)
}

/// Serves fixture pages for article ingestion.
pub async fn spawn_article_server() -> String {
    let app = Router::new()
        .route("/article", get(|| async { Html(ARTICLE_HTML) }))
        .route("/empty", get(|| async { Html("<html><body><nav>Menu</nav></body></html>") }))
        .route(
            "/data.json",
            get(|| async { ([(header::CONTENT_TYPE, "application/json")], "{}").into_response() }),
        );
    serve(app).await
}

pub fn test_config() -> Config {
    Config {
        database_url: None,
        ai_api_key: None,
        ai_api_base: "http://127.0.0.1:9".to_string(),
        ai_model: "test-model".to_string(),
        default_level: DifficultyLevel::Original,
        default_question_count: 5,
        teacher_id: TEACHER_ID.to_string(),
        article_max_chars: 32_000,
        http_timeout_secs: 5,
        teacher_port: 0,
        student_port: 0,
        rust_log: "error".to_string(),
    }
}

pub struct TestApp {
    pub teacher: String,
    pub student: String,
    pub articles: String,
    pub store: Arc<MemoryStore>,
    pub ai: Arc<ScriptedAi>,
}

/// Both apps on random ports over one in-memory store.
pub async fn spawn_apps() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let ai = Arc::new(ScriptedAi::default());
    let fetcher = ArticleFetcher::new(Duration::from_secs(5), 32_000).unwrap();
    let quiz = QuizService::new(store.clone(), AiService::new(ai.clone()), fetcher);

    let teacher_state = TeacherState {
        quiz,
        config: test_config(),
        sessions: SessionStore::new(),
    };
    let student_state = StudentState {
        store: store.clone(),
        sessions: SessionStore::new(),
    };

    TestApp {
        teacher: serve(routes::teacher_router(teacher_state)).await,
        student: serve(routes::student_router(student_state)).await,
        articles: spawn_article_server().await,
        store,
        ai,
    }
}

/// A browser-like client that keeps the session cookie and follows redirects.
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap()
}

/// Saves a quiz directly in the store. Question n has the correct answer "Right n".
pub async fn seed_test(store: &MemoryStore, access_code: &str, questions: usize) -> Test {
    let drafts: Vec<DraftQuestion> = (1..=questions)
        .map(|i| DraftQuestion {
            question: format!("Question {}?", i),
            options: vec![
                format!("Right {}", i),
                "Wrong one".to_string(),
                "Wrong two".to_string(),
                "Wrong three".to_string(),
            ],
            correct_answer: format!("Right {}", i),
        })
        .collect();
    store
        .insert_test(
            &NewTest {
                title: "Rivers of Europe".to_string(),
                article_url: "https://example.com/rivers".to_string(),
                article_text: CLEANED_ARTICLE.to_string(),
                language_level: DifficultyLevel::Original,
                teacher_id: TEACHER_ID.to_string(),
            },
            access_code,
            &drafts,
        )
        .await
        .unwrap()
}
