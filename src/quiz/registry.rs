// src/quiz/registry.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{sync::Mutex, time::Instant};
use uuid::Uuid;

use super::session::QuizSession;
use crate::error::AppError;

struct Entry {
    session: QuizSession,
    last_active: Instant,
}

/// In-memory store of running practice quizzes.
///
/// Sessions are never persisted: they disappear when finished, abandoned, or
/// idle for longer than the TTL.
#[derive(Clone)]
pub struct QuizSessions {
    inner: Arc<Mutex<HashMap<Uuid, Entry>>>,
    ttl: Duration,
}

impl QuizSessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    /// Registers a session, dropping any that went idle.
    pub async fn insert(&self, session: QuizSession) -> Uuid {
        let id = Uuid::new_v4();
        let now = Instant::now();
        let mut sessions = self.inner.lock().await;

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_active) < self.ttl);
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::debug!("Expired {} idle quiz sessions", expired);
        }

        sessions.insert(
            id,
            Entry {
                session,
                last_active: now,
            },
        );
        id
    }

    /// Runs `f` against the session owned by `user_id`.
    ///
    /// The session is removed afterwards if `f` left it finished.
    pub async fn with_session<T>(
        &self,
        id: Uuid,
        user_id: i64,
        f: impl FnOnce(&mut QuizSession) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let now = Instant::now();
        let mut sessions = self.inner.lock().await;

        let expired = match sessions.get(&id) {
            Some(entry) => now.duration_since(entry.last_active) >= self.ttl,
            None => return Err(AppError::NotFound("Quiz session not found".to_string())),
        };
        if expired {
            sessions.remove(&id);
            return Err(AppError::NotFound("Quiz session expired".to_string()));
        }

        let Some(entry) = sessions.get_mut(&id) else {
            return Err(AppError::NotFound("Quiz session not found".to_string()));
        };

        if entry.session.user_id() != user_id {
            return Err(AppError::Forbidden(
                "Quiz session belongs to another user".to_string(),
            ));
        }

        entry.last_active = now;
        let result = f(&mut entry.session);

        if entry.session.is_finished() {
            sessions.remove(&id);
        }
        result
    }

    /// Abandons a session. Returns `false` if it did not exist.
    pub async fn remove(&self, id: Uuid, user_id: i64) -> Result<bool, AppError> {
        let mut sessions = self.inner.lock().await;

        match sessions.get(&id) {
            None => Ok(false),
            Some(entry) if entry.session.user_id() != user_id => Err(AppError::Forbidden(
                "Quiz session belongs to another user".to_string(),
            )),
            Some(_) => {
                sessions.remove(&id);
                Ok(true)
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::session::{QuizItem, SessionState};

    fn session(user_id: i64) -> QuizSession {
        QuizSession::new(
            user_id,
            vec![QuizItem {
                exercise_id: 1,
                name: "Mediana".to_string(),
                question: "?".to_string(),
                options: vec!["A".to_string(), "B".to_string()],
                correct_options: vec![true, false],
                hint: None,
            }],
        )
    }

    #[tokio::test]
    async fn test_owner_can_use_session() {
        let sessions = QuizSessions::new(Duration::from_secs(60));
        let id = sessions.insert(session(1)).await;

        let state = sessions
            .with_session(id, 1, |s| Ok(s.state()))
            .await
            .unwrap();
        assert_eq!(state, SessionState::Presenting(0));
    }

    #[tokio::test]
    async fn test_other_user_is_forbidden() {
        let sessions = QuizSessions::new(Duration::from_secs(60));
        let id = sessions.insert(session(1)).await;

        let err = sessions.with_session(id, 2, |_| Ok(())).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(matches!(sessions.remove(id, 2).await, Err(AppError::Forbidden(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_expire() {
        let sessions = QuizSessions::new(Duration::from_secs(60));
        let id = sessions.insert(session(1)).await;

        tokio::time::advance(Duration::from_secs(61)).await;

        let err = sessions.with_session(id, 1, |_| Ok(())).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(sessions.len().await, 0);
    }

    #[tokio::test]
    async fn test_abandon() {
        let sessions = QuizSessions::new(Duration::from_secs(60));
        let id = sessions.insert(session(1)).await;

        assert!(sessions.remove(id, 1).await.unwrap());
        assert!(!sessions.remove(id, 1).await.unwrap());
    }
}
