// src/session.rs

//! Cookie-keyed, in-process session state.
//!
//! Each browser gets a random id in the `quizmaker_sid` cookie. Per-app state
//! (the teacher's draft quiz, the student's attempt) lives in a `SessionStore`
//! keyed by that id and is lost on restart.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

use axum::{
    body::Body,
    http::{HeaderValue, Request, header},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "quizmaker_sid";

/// Sessions idle for longer than this are dropped on the next write.
const SESSION_IDLE_TTL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

/// Finds the session id in a `Cookie` header value.
pub fn session_from_cookie_header(value: &str) -> Option<SessionId> {
    value
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, id)| Uuid::parse_str(id.trim()).ok())
        .map(SessionId)
}

/// Middleware that makes a `SessionId` available to every handler as an `Extension`,
/// issuing a new cookie when the request carried none.
pub async fn session_middleware(mut req: Request<Body>, next: Next) -> Response {
    let existing = req
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(session_from_cookie_header);

    let (id, is_new) = match existing {
        Some(id) => (id, false),
        None => (SessionId(Uuid::new_v4()), true),
    };
    req.extensions_mut().insert(id);

    let mut response = next.run(req).await;

    if is_new {
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id.0);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Failed to build session cookie: {}", e),
        }
    }
    response
}

struct Entry<T> {
    value: T,
    touched: Instant,
}

/// State of type `T` per session. Reads hand out clones; writes replace the whole value.
#[derive(Clone)]
pub struct SessionStore<T> {
    inner: Arc<RwLock<HashMap<SessionId, Entry<T>>>>,
}

impl<T> Default for SessionStore<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl<T: Clone + Default> SessionStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session's state, or `T::default()` for a session seen for the first time.
    pub fn load(&self, id: &SessionId) -> T {
        match self.inner.read() {
            Ok(map) => map.get(id).map(|e| e.value.clone()).unwrap_or_default(),
            Err(poisoned) => poisoned
                .into_inner()
                .get(id)
                .map(|e| e.value.clone())
                .unwrap_or_default(),
        }
    }

    pub fn save(&self, id: &SessionId, value: T) {
        let mut map = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();
        map.retain(|_, entry| now.duration_since(entry.touched) < SESSION_IDLE_TTL);
        map.insert(
            *id,
            Entry {
                value,
                touched: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .map(|map| map.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
