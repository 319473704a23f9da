// src/progress/mod.rs
//
// Grading, the answer ledger and XP/level bookkeeping.

pub mod grader;
pub mod ledger;
pub mod level;
pub mod resolver;
pub mod retry;
pub mod store;

#[cfg(test)]
pub(crate) mod memory;

pub use grader::grade;
pub use ledger::{WriteError, record_attempt};
pub use level::{LevelTable, LevelTier};
pub use resolver::{AwardOutcome, LevelResolver, TransactionError};
pub use retry::{RetryError, RetryPolicy};
pub use store::{AnswerLedger, AwardKey, PgStore, ProgressStore, StoreError};
