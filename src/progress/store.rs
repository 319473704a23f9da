// src/progress/store.rs

use std::fmt;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{
    answer_result::{AnswerResult, NewAnswerResult},
    user::UserProgress,
};

/// Classified storage failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Connectivity class failure; safe to retry for append-only writes.
    Transient(String),
    /// Rejected by the database's access rules.
    PermissionDenied(String),
    /// Referenced row does not exist.
    NotFound(String),
    /// Concurrent write conflict (serialization failure, deadlock).
    Conflict(String),
    Other(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Transient(msg) => write!(f, "transient storage failure: {}", msg),
            StoreError::PermissionDenied(msg) => write!(f, "permission denied: {}", msg),
            StoreError::NotFound(msg) => write!(f, "not found: {}", msg),
            StoreError::Conflict(msg) => write!(f, "write conflict: {}", msg),
            StoreError::Other(msg) => write!(f, "storage error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let msg = err.to_string();
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound(msg),
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => StoreError::Transient(msg),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                // insufficient_privilege
                Some("42501") => StoreError::PermissionDenied(msg),
                // serialization_failure, deadlock_detected
                Some("40001") | Some("40P01") => StoreError::Conflict(msg),
                // foreign_key_violation: the referenced user or exercise is gone
                Some("23503") => StoreError::NotFound(msg),
                // connection_exception class, admin/crash shutdown, cannot_connect_now
                Some(code) if code.starts_with("08") => StoreError::Transient(msg),
                Some("57P01") | Some("57P02") | Some("57P03") => StoreError::Transient(msg),
                _ => StoreError::Other(msg),
            },
            _ => StoreError::Other(msg),
        }
    }
}

/// What an XP award is granted for. Each key pays out at most once per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AwardKey {
    Exercise(i64),
    Video(i64),
}

impl AwardKey {
    pub fn source(&self) -> &'static str {
        match self {
            AwardKey::Exercise(_) => "exercise",
            AwardKey::Video(_) => "video",
        }
    }

    pub fn source_id(&self) -> i64 {
        match self {
            AwardKey::Exercise(id) | AwardKey::Video(id) => *id,
        }
    }
}

/// Result of a conditional progress write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied,
    /// The stored progress no longer matches what was read.
    Stale,
    /// The award key was already claimed; nothing was written.
    AlreadyClaimed,
}

/// Append-only log of grading attempts.
#[async_trait]
pub trait AnswerLedger: Send + Sync {
    /// Appends one attempt. The timestamp is assigned by the store.
    async fn append_answer(&self, attempt: NewAnswerResult) -> Result<AnswerResult, StoreError>;
}

/// Per-user XP and level, written only through compare-and-swap commits.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn fetch_progress(&self, user_id: i64) -> Result<Option<UserProgress>, StoreError>;

    /// Atomically replaces `seen` with `next` for `user_id`.
    ///
    /// When `claim` is given, the award key is inserted in the same atomic
    /// step; if it already exists nothing is written.
    async fn commit_progress(
        &self,
        user_id: i64,
        seen: UserProgress,
        next: UserProgress,
        claim: Option<(AwardKey, i64)>,
    ) -> Result<CommitOutcome, StoreError>;
}

/// PostgreSQL implementation of both storage seams.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnswerLedger for PgStore {
    async fn append_answer(&self, attempt: NewAnswerResult) -> Result<AnswerResult, StoreError> {
        let row = sqlx::query_as::<_, AnswerResult>(
            r#"
            INSERT INTO answer_results (exercise_id, user_id, is_correct)
            VALUES ($1, $2, $3)
            RETURNING id, exercise_id, user_id, is_correct, answered_at
            "#,
        )
        .bind(attempt.exercise_id)
        .bind(attempt.user_id)
        .bind(attempt.is_correct)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}

#[async_trait]
impl ProgressStore for PgStore {
    async fn fetch_progress(&self, user_id: i64) -> Result<Option<UserProgress>, StoreError> {
        let progress =
            sqlx::query_as::<_, UserProgress>("SELECT xp, level FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(progress)
    }

    async fn commit_progress(
        &self,
        user_id: i64,
        seen: UserProgress,
        next: UserProgress,
        claim: Option<(AwardKey, i64)>,
    ) -> Result<CommitOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        if let Some((key, xp)) = claim {
            let claimed = sqlx::query(
                r#"
                INSERT INTO xp_awards (user_id, source, source_id, xp)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id, source, source_id) DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(key.source())
            .bind(key.source_id())
            .bind(xp)
            .execute(&mut *tx)
            .await?;

            if claimed.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(CommitOutcome::AlreadyClaimed);
            }
        }

        // Compare-and-swap: only the exact values read may be replaced.
        let updated = sqlx::query(
            r#"
            UPDATE users SET xp = $1, level = $2
            WHERE id = $3 AND xp = $4 AND level = $5
            "#,
        )
        .bind(next.xp)
        .bind(next.level)
        .bind(user_id)
        .bind(seen.xp)
        .bind(seen.level)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(CommitOutcome::Stale);
        }

        tx.commit().await?;
        Ok(CommitOutcome::Applied)
    }
}
