// src/state.rs

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{config::Config, quiz::QuizSessions};

/// Everything a handler may need, injected once at the router root.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub quiz_sessions: QuizSessions,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let quiz_sessions = QuizSessions::new(config.quiz_session_ttl);
        Self {
            pool,
            config,
            quiz_sessions,
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for QuizSessions {
    fn from_ref(state: &AppState) -> Self {
        state.quiz_sessions.clone()
    }
}
