// src/config.rs

use std::{env, str::FromStr, time::Duration};

use dotenvy::dotenv;

use crate::progress::{LevelTable, RetryPolicy, resolver::DEFAULT_MAX_ATTEMPTS};

/// Bounds on the number of options an exercise may have.
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 5;

/// XP values an exercise or video may grant.
pub const XP_VALUES: [i32; 4] = [10, 20, 30, 50];

/// Converts a stored XP value into an award amount.
/// `None` for anything outside `XP_VALUES`.
pub fn xp_reward(stored: i32) -> Option<u32> {
    if XP_VALUES.contains(&stored) {
        u32::try_from(stored).ok()
    } else {
        None
    }
}

/// Upper bound on questions in one practice quiz.
pub const MAX_QUIZ_QUESTIONS: i64 = 50;

/// Number of entries on the leaderboard.
pub const LEADERBOARD_SIZE: i64 = 10;

/// Immutable application configuration, built once at startup and shared
/// through `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub log_dir: String,
    pub port: u16,
    pub level_table: LevelTable,
    /// Backoff applied to answer-log writes.
    pub write_retry: RetryPolicy,
    /// Compare-and-swap rounds for an XP award.
    pub award_max_attempts: u32,
    pub quiz_question_count: i64,
    pub quiz_session_ttl: Duration,
    /// Optional teacher account created at startup.
    pub seed_teacher_username: Option<String>,
    pub seed_teacher_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let jwt_expiration = parsed("JWT_EXPIRATION", 86_400)?;
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());
        let port = parsed("PORT", 3000)?;

        let level_table = match env::var("LEVEL_THRESHOLDS") {
            Ok(raw) => LevelTable::parse(&raw)?,
            Err(_) => LevelTable::default(),
        };

        let defaults = RetryPolicy::default();
        let write_retry = RetryPolicy {
            max_attempts: parsed("WRITE_RETRY_ATTEMPTS", defaults.max_attempts)?,
            base_delay: Duration::from_millis(parsed(
                "WRITE_RETRY_BASE_MS",
                defaults.base_delay.as_millis() as u64,
            )?),
            multiplier: defaults.multiplier,
        };

        let award_max_attempts = parsed("AWARD_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;
        let quiz_question_count =
            parsed::<i64>("QUIZ_QUESTION_COUNT", 10)?.clamp(1, MAX_QUIZ_QUESTIONS);
        let quiz_session_ttl = Duration::from_secs(parsed("QUIZ_SESSION_TTL_SECS", 1800)?);

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            log_dir,
            port,
            level_table,
            write_retry,
            award_max_attempts,
            quiz_question_count,
            quiz_session_ttl,
            seed_teacher_username: env::var("SEED_TEACHER_USERNAME").ok(),
            seed_teacher_password: env::var("SEED_TEACHER_PASSWORD").ok(),
        })
    }
}

fn required(key: &str) -> Result<String, String> {
    env::var(key).map_err(|_| format!("{} must be set", key))
}

fn parsed<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("{} has an invalid value: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_default_when_unset() {
        let value: u32 = parsed("ESTATISTICO_TEST_UNSET_KEY", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_xp_reward_accepts_only_known_values() {
        for xp in XP_VALUES {
            assert_eq!(xp_reward(xp), Some(xp as u32));
        }
        assert_eq!(xp_reward(0), None);
        assert_eq!(xp_reward(-20), None);
        assert_eq!(xp_reward(15), None);
    }

    #[test]
    fn test_required_reports_missing_key() {
        let err = required("ESTATISTICO_TEST_UNSET_KEY").unwrap_err();
        assert!(err.contains("ESTATISTICO_TEST_UNSET_KEY"));
    }
}
