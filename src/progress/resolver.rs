// src/progress/resolver.rs

use std::fmt;

use serde::Serialize;

use super::{
    level::LevelTable,
    store::{AwardKey, CommitOutcome, ProgressStore, StoreError},
};
use crate::models::user::UserProgress;

/// Default number of compare-and-swap rounds before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Failure of an XP award transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// The user has no progress record.
    NotFound(i64),
    /// Every compare-and-swap round lost to a concurrent writer.
    Contended { attempts: u32 },
    Store(StoreError),
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::NotFound(user_id) => write!(f, "user {} not found", user_id),
            TransactionError::Contended { attempts } => {
                write!(f, "progress update lost {} races in a row", attempts)
            }
            TransactionError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for TransactionError {}

impl From<StoreError> for TransactionError {
    fn from(err: StoreError) -> Self {
        TransactionError::Store(err)
    }
}

/// Outcome of a keyed award.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AwardOutcome {
    Awarded {
        before: UserProgress,
        after: UserProgress,
    },
    /// The key was claimed earlier; progress is unchanged.
    AlreadyAwarded { progress: UserProgress },
}

impl AwardOutcome {
    pub fn progress(&self) -> UserProgress {
        match self {
            AwardOutcome::Awarded { after, .. } => *after,
            AwardOutcome::AlreadyAwarded { progress } => *progress,
        }
    }

    pub fn xp_gained(&self) -> i64 {
        match self {
            AwardOutcome::Awarded { before, after } => after.xp - before.xp,
            AwardOutcome::AlreadyAwarded { .. } => 0,
        }
    }

    pub fn leveled_up(&self) -> bool {
        match self {
            AwardOutcome::Awarded { before, after } => after.level > before.level,
            AwardOutcome::AlreadyAwarded { .. } => false,
        }
    }
}

/// Applies XP to a user's progress with optimistic concurrency.
///
/// Each round reads the current record, derives the new XP and level, and
/// commits only if the record is unchanged since the read. A lost race
/// re-reads and tries again, up to `max_attempts` rounds.
pub struct LevelResolver<'a, S: ?Sized> {
    store: &'a S,
    levels: &'a LevelTable,
    max_attempts: u32,
}

impl<'a, S> LevelResolver<'a, S>
where
    S: ProgressStore + ?Sized,
{
    pub fn new(store: &'a S, levels: &'a LevelTable) -> Self {
        Self {
            store,
            levels,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Computes the progress that results from adding `xp_delta`.
    pub fn apply(&self, current: UserProgress, xp_delta: u32) -> UserProgress {
        let xp = current.xp.saturating_add(i64::from(xp_delta));
        UserProgress {
            xp,
            level: self.levels.level_for(xp),
        }
    }

    /// Adds `xp_delta` to the user's XP and recomputes the level.
    ///
    /// Writes nothing when neither value would change.
    pub async fn award_xp(
        &self,
        user_id: i64,
        xp_delta: u32,
    ) -> Result<UserProgress, TransactionError> {
        for _ in 0..self.max_attempts {
            let current = self.load(user_id).await?;
            let next = self.apply(current, xp_delta);

            if next == current {
                return Ok(current);
            }

            match self
                .store
                .commit_progress(user_id, current, next, None)
                .await?
            {
                CommitOutcome::Applied => {
                    tracing::info!(
                        "User {} progress {} xp (level {}) -> {} xp (level {})",
                        user_id,
                        current.xp,
                        current.level,
                        next.xp,
                        next.level
                    );
                    return Ok(next);
                }
                CommitOutcome::Stale => {
                    tracing::debug!("Progress for user {} changed concurrently, retrying", user_id);
                }
                // No key was offered, so this cannot happen; treat it as a lost race.
                CommitOutcome::AlreadyClaimed => {}
            }
        }

        Err(self.contended(user_id))
    }

    /// Awards `xp_delta` at most once per `(user, key)`.
    ///
    /// The key claim and the progress update commit together, so two
    /// concurrent first-correct submissions cannot both pay out.
    pub async fn award_once(
        &self,
        user_id: i64,
        key: AwardKey,
        xp_delta: u32,
    ) -> Result<AwardOutcome, TransactionError> {
        for _ in 0..self.max_attempts {
            let current = self.load(user_id).await?;
            let next = self.apply(current, xp_delta);

            match self
                .store
                .commit_progress(user_id, current, next, Some((key, i64::from(xp_delta))))
                .await?
            {
                CommitOutcome::Applied => {
                    tracing::info!(
                        "User {} earned {} xp for {} {} (level {} -> {})",
                        user_id,
                        xp_delta,
                        key.source(),
                        key.source_id(),
                        current.level,
                        next.level
                    );
                    return Ok(AwardOutcome::Awarded {
                        before: current,
                        after: next,
                    });
                }
                CommitOutcome::AlreadyClaimed => {
                    tracing::debug!(
                        "User {} already rewarded for {} {}",
                        user_id,
                        key.source(),
                        key.source_id()
                    );
                    let progress = self.load(user_id).await?;
                    return Ok(AwardOutcome::AlreadyAwarded { progress });
                }
                CommitOutcome::Stale => {
                    tracing::debug!("Progress for user {} changed concurrently, retrying", user_id);
                }
            }
        }

        Err(self.contended(user_id))
    }

    async fn load(&self, user_id: i64) -> Result<UserProgress, TransactionError> {
        self.store
            .fetch_progress(user_id)
            .await?
            .ok_or(TransactionError::NotFound(user_id))
    }

    fn contended(&self, user_id: i64) -> TransactionError {
        tracing::warn!(
            "Giving up on progress update for user {} after {} attempts",
            user_id,
            self.max_attempts
        );
        TransactionError::Contended {
            attempts: self.max_attempts,
        }
    }
}
