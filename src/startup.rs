// src/startup.rs

//! Process bootstrap shared by the `teacher` and `student` binaries.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    ai::{AiService, OpenAiClient},
    config::Config,
    error::AppError,
    ingest::ArticleFetcher,
    service::QuizService,
    session::SessionStore,
    state::{StudentState, TeacherState},
    store::{MemoryStore, PgStore, QuizStore},
};

/// Logs to stdout and to a daily rolling file `logs/<app>.log`.
/// Keep the returned guard alive for the lifetime of the process.
pub fn init_tracing(config: &Config, app: &str) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily("logs", format!("{}.log", app));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}

/// Postgres (with migrations applied) when `DATABASE_URL` is set, otherwise an in-memory store.
pub async fn build_store(config: &Config) -> Result<Arc<dyn QuizStore>, AppError> {
    match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, using the in-memory store. Data is lost on exit.");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

pub fn teacher_state(config: Config, store: Arc<dyn QuizStore>) -> Result<TeacherState, AppError> {
    let timeout = Duration::from_secs(config.http_timeout_secs);
    let client = OpenAiClient::new(
        &config.ai_api_base,
        config.require_ai_key()?,
        &config.ai_model,
        timeout,
    )?;
    let fetcher = ArticleFetcher::new(timeout, config.article_max_chars)?;
    let quiz = QuizService::new(store, AiService::new(Arc::new(client)), fetcher);

    Ok(TeacherState {
        quiz,
        config,
        sessions: SessionStore::new(),
    })
}

pub fn student_state(store: Arc<dyn QuizStore>) -> StudentState {
    StudentState {
        store,
        sessions: SessionStore::new(),
    }
}

/// Reads `--port <n>` or `--port=<n>` from the arguments, falling back to `default`.
pub fn port_from_args<I>(args: I, default: u16) -> Result<u16, AppError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let value = if arg == "--port" {
            args.next()
        } else if let Some(v) = arg.strip_prefix("--port=") {
            Some(v.to_string())
        } else {
            continue;
        };
        let value = value.ok_or_else(|| AppError::Config("--port needs a value".to_string()))?;
        return value
            .parse()
            .map_err(|_| AppError::Config(format!("invalid port '{}'", value)));
    }
    Ok(default)
}

/// Binds all interfaces on `port` and serves until the process is stopped.
pub async fn serve(app: Router, port: u16) -> Result<(), AppError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::InternalServerError(format!("cannot bind {}: {}", addr, e)))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn port_flag_forms() {
        assert_eq!(port_from_args(args(&[]), 8501).unwrap(), 8501);
        assert_eq!(port_from_args(args(&["--port", "9000"]), 8501).unwrap(), 9000);
        assert_eq!(port_from_args(args(&["--port=9100"]), 8501).unwrap(), 9100);
        assert!(port_from_args(args(&["--port"]), 8501).is_err());
        assert!(port_from_args(args(&["--port", "http"]), 8501).is_err());
    }
}
