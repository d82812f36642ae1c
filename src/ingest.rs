// src/ingest.rs

//! Article ingestion: download a page and reduce it to plain text.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::{
    error::AppError,
    utils::html::{html_to_text, truncate_chars},
};

#[derive(Clone)]
pub struct ArticleFetcher {
    client: reqwest::Client,
    max_chars: usize,
}

impl ArticleFetcher {
    pub fn new(timeout: Duration, max_chars: usize) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quizmaker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        Ok(Self { client, max_chars })
    }

    /// Downloads the page and returns its text, truncated to the configured length.
    pub async fn fetch_text(&self, url: &str) -> Result<String, AppError> {
        let html = self.fetch_html(url).await?;

        let text = html_to_text(&html);
        if text.is_empty() {
            return Err(AppError::Ingestion(
                "the page contains no readable text".to_string(),
            ));
        }

        let total = text.chars().count();
        if total > self.max_chars {
            tracing::warn!(
                "Text too long ({} chars), truncating to {}",
                total,
                self.max_chars
            );
            return Ok(truncate_chars(&text, self.max_chars).to_string());
        }

        tracing::debug!("Extracted {} chars of article text", total);
        Ok(text)
    }

    pub async fn fetch_html(&self, url: &str) -> Result<String, AppError> {
        let parsed = parse_article_url(url)?;
        tracing::info!("Fetching article from URL: {}", parsed);

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| AppError::Ingestion(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Ingestion(format!(
                "the server answered with status {}",
                status
            )));
        }

        if let Some(content_type) = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            if !is_html(content_type) {
                return Err(AppError::Ingestion(format!(
                    "expected an HTML page but got '{}'",
                    content_type
                )));
            }
        }

        let html = response
            .text()
            .await
            .map_err(|e| AppError::Ingestion(format!("could not read the page: {}", e)))?;
        tracing::info!("Article fetched successfully, content length: {}", html.len());
        Ok(html)
    }
}

pub fn parse_article_url(raw: &str) -> Result<Url, AppError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| AppError::Ingestion(format!("'{}' is not a valid URL: {}", raw.trim(), e)))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(AppError::Ingestion(format!(
            "unsupported URL scheme '{}'",
            other
        ))),
    }
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

/// Title of a Markdown article: the first `# ` heading, or "Untitled".
pub fn extract_title(markdown: &str) -> String {
    markdown
        .lines()
        .map(str::trim_start)
        .find_map(|line| line.strip_prefix("# "))
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .unwrap_or("Untitled")
        .to_string()
}
