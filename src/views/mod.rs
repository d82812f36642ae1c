// src/views/mod.rs

//! Server-rendered pages (maud templates) shared by both apps.

pub mod student;
pub mod teacher;

use axum::http::StatusCode;
use maud::{DOCTYPE, Markup, PreEscaped, html};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem 1.5rem; color: #222; }
nav { display: flex; gap: 1rem; padding-bottom: .75rem; border-bottom: 1px solid #ddd; margin-bottom: 1rem; }
nav a { text-decoration: none; color: #2456a4; font-weight: 600; }
.notice { padding: .75rem 1rem; border-radius: 6px; margin: 1rem 0; }
.notice.success { background: #e6f4ea; border: 1px solid #9fd3ac; }
.notice.error { background: #fdecea; border: 1px solid #f1a7a0; }
.card { border: 1px solid #ddd; border-radius: 8px; padding: 1rem; margin: 1rem 0; }
.article { white-space: pre-wrap; max-height: 28rem; overflow-y: auto; background: #fafafa; }
.correct { color: #1e7b34; font-weight: 600; }
.wrong { color: #b3261e; }
.code { font-family: monospace; font-size: 1.4rem; letter-spacing: .2rem; }
.stats { display: flex; gap: 1rem; flex-wrap: wrap; }
.stats .card { flex: 1; text-align: center; margin: 0; }
table { border-collapse: collapse; width: 100%; }
th, td { text-align: left; padding: .4rem .5rem; border-bottom: 1px solid #eee; }
form.inline { display: inline; }
label { display: block; margin: .5rem 0 .2rem; }
input[type=text], input[type=url], textarea, select { width: 100%; box-sizing: border-box; padding: .35rem; }
button { padding: .4rem .9rem; margin: .3rem .3rem .3rem 0; cursor: pointer; }
"#;

/// A one-off message carried to the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Notice::Error(message.into())
    }

    pub fn success(message: impl Into<String>) -> Self {
        Notice::Success(message.into())
    }
}

pub fn notice(notice: Option<&Notice>) -> Markup {
    html! {
        @match notice {
            Some(Notice::Success(text)) => {
                div.notice.success { (text) }
            }
            Some(Notice::Error(text)) => {
                div.notice.error { (text) }
            }
            None => {}
        }
    }
}

/// Full HTML document around `body`. `nav` is a list of (href, label) links.
pub fn layout(title: &str, nav: &[(&str, &str)], body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                style { (PreEscaped(STYLE)) }
            }
            body {
                @if !nav.is_empty() {
                    nav {
                        @for (href, label) in nav {
                            a href=(href) { (label) }
                        }
                    }
                }
                (body)
            }
        }
    }
}

/// Page rendered for errors that escape a handler.
pub fn error_page(status: StatusCode, message: &str) -> Markup {
    let heading = status.canonical_reason().unwrap_or("Error");
    layout(
        heading,
        &[("/", "Home")],
        html! {
            h1 { (status.as_u16()) " " (heading) }
            div.notice.error { (message) }
            p { a href="/" { "Back to the start page" } }
        },
    )
}

/// Formats a percentage with two decimals, e.g. `60.00%`.
pub fn percent(value: f64) -> String {
    format!("{:.2}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_page_escapes_message() {
        let page = error_page(StatusCode::NOT_FOUND, "<b>Test not found</b>").into_string();
        assert!(page.contains("404 Not Found"));
        assert!(page.contains("&lt;b&gt;Test not found&lt;/b&gt;"));
    }

    #[test]
    fn percent_has_two_decimals() {
        assert_eq!(percent(60.0), "60.00%");
        assert_eq!(percent(33.333), "33.33%");
    }
}
