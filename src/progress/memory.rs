// src/progress/memory.rs
//
// In-process stand-in for `PgStore` used by the unit tests.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;

use super::store::{AnswerLedger, AwardKey, CommitOutcome, ProgressStore, StoreError};
use crate::models::{
    answer_result::{AnswerResult, NewAnswerResult},
    user::UserProgress,
};

#[derive(Default)]
struct Inner {
    users: HashMap<i64, UserProgress>,
    awards: HashSet<(i64, AwardKey)>,
    answers: Vec<AnswerResult>,
    /// Errors returned by the next `append_answer` calls, in order.
    scripted_failures: VecDeque<StoreError>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    progress_writes: AtomicUsize,
    append_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn with_user(user_id: i64, progress: UserProgress) -> Self {
        let store = Self::default();
        store.inner.lock().unwrap().users.insert(user_id, progress);
        store
    }

    pub fn fail_next_appends(&self, errors: impl IntoIterator<Item = StoreError>) {
        self.inner
            .lock()
            .unwrap()
            .scripted_failures
            .extend(errors);
    }

    pub fn progress(&self, user_id: i64) -> Option<UserProgress> {
        self.inner.lock().unwrap().users.get(&user_id).copied()
    }

    pub fn answers(&self) -> Vec<AnswerResult> {
        self.inner.lock().unwrap().answers.clone()
    }

    pub fn progress_writes(&self) -> usize {
        self.progress_writes.load(Ordering::SeqCst)
    }

    pub fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnswerLedger for MemoryStore {
    async fn append_answer(&self, attempt: NewAnswerResult) -> Result<AnswerResult, StoreError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock().unwrap();

        if let Some(err) = inner.scripted_failures.pop_front() {
            return Err(err);
        }

        let row = AnswerResult {
            id: inner.answers.len() as i64 + 1,
            exercise_id: attempt.exercise_id,
            user_id: attempt.user_id,
            is_correct: attempt.is_correct,
            answered_at: Utc::now(),
        };
        inner.answers.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn fetch_progress(&self, user_id: i64) -> Result<Option<UserProgress>, StoreError> {
        let progress = self.inner.lock().unwrap().users.get(&user_id).copied();
        // Let concurrent awards interleave between read and write.
        tokio::task::yield_now().await;
        Ok(progress)
    }

    async fn commit_progress(
        &self,
        user_id: i64,
        seen: UserProgress,
        next: UserProgress,
        claim: Option<(AwardKey, i64)>,
    ) -> Result<CommitOutcome, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        if let Some((key, _)) = claim {
            if inner.awards.contains(&(user_id, key)) {
                return Ok(CommitOutcome::AlreadyClaimed);
            }
        }

        let current = inner
            .users
            .get(&user_id)
            .copied()
            .ok_or_else(|| StoreError::NotFound(format!("user {}", user_id)))?;
        if current != seen {
            return Ok(CommitOutcome::Stale);
        }

        if let Some((key, _)) = claim {
            inner.awards.insert((user_id, key));
        }
        inner.users.insert(user_id, next);
        self.progress_writes.fetch_add(1, Ordering::SeqCst);
        Ok(CommitOutcome::Applied)
    }
}
