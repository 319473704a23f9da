// src/handlers/answer.rs

use std::collections::BTreeSet;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::{Config, xp_reward},
    error::AppError,
    handlers::exercise::fetch_exercise,
    models::answer_result::{AnswerOutcome, SubmitAnswerRequest},
    progress::{
        AnswerLedger, AwardKey, LevelResolver, LevelTable, PgStore, ProgressStore, RetryPolicy,
        TransactionError, grade, record_attempt,
    },
    utils::jwt::Claims,
};

/// A graded answer waiting to be persisted.
#[derive(Debug, Clone, Copy)]
struct GradedAnswer {
    user_id: i64,
    exercise_id: i64,
    is_correct: bool,
    xp_value: u32,
}

/// Submits an answer to an exercise.
///
/// * Rejects empty or out-of-range selections before any write.
/// * Grades by exact set equality with the exercise's answer key.
/// * Appends the attempt to the answer log (retried on transient failures).
/// * On a correct answer, awards the exercise's XP once per user.
///
/// A failed XP update does not hide the grading result: the response still
/// carries `is_correct`, with `xp_error` set.
pub async fn submit_answer(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(exercise_id): Path<i64>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let user_id = claims.user_id()?;

    let selected: BTreeSet<usize> = payload.selected.iter().copied().collect();
    let exercise = fetch_exercise(&pool, exercise_id).await?;

    if let Some(&index) = selected.iter().find(|&&i| i >= exercise.options.len()) {
        return Err(AppError::BadRequest(format!(
            "Option {} does not exist in this exercise",
            index
        )));
    }

    let graded = GradedAnswer {
        user_id,
        exercise_id,
        is_correct: grade(&selected, &exercise.correct_options),
        xp_value: xp_reward(exercise.xp_value).ok_or_else(|| {
            tracing::error!(
                "Exercise {} has an invalid stored XP value {}",
                exercise_id,
                exercise.xp_value
            );
            AppError::InternalServerError("Exercise has an invalid XP value".to_string())
        })?,
    };

    // Persist on a separate task so the write finishes even if the client
    // goes away and this handler is dropped.
    let store = PgStore::new(pool);
    let task = tokio::spawn(async move {
        persist_answer(
            &store,
            &config.level_table,
            &config.write_retry,
            config.award_max_attempts,
            graded,
        )
        .await
    });

    let outcome = task
        .await
        .map_err(|e| AppError::InternalServerError(format!("answer task failed: {}", e)))??;

    Ok(Json(outcome))
}

/// Records the attempt, then applies the first-correct XP award.
async fn persist_answer<S>(
    store: &S,
    levels: &LevelTable,
    retry: &RetryPolicy,
    award_attempts: u32,
    graded: GradedAnswer,
) -> Result<AnswerOutcome, AppError>
where
    S: AnswerLedger + ProgressStore,
{
    let answer = record_attempt(
        store,
        retry,
        graded.exercise_id,
        graded.user_id,
        graded.is_correct,
    )
    .await?;

    let mut outcome = AnswerOutcome {
        answer_id: answer.id,
        is_correct: graded.is_correct,
        answered_at: answer.answered_at,
        xp_awarded: 0,
        leveled_up: false,
        progress: None,
        xp_error: None,
    };

    if !graded.is_correct {
        return Ok(outcome);
    }

    let award = LevelResolver::new(store, levels)
        .with_max_attempts(award_attempts)
        .award_once(
            graded.user_id,
            AwardKey::Exercise(graded.exercise_id),
            graded.xp_value,
        )
        .await;

    match award {
        Ok(award) => {
            outcome.xp_awarded = award.xp_gained();
            outcome.leveled_up = award.leveled_up();
            outcome.progress = Some(award.progress());
        }
        Err(e) => {
            tracing::error!(
                "XP award failed for user {} on exercise {}: {}",
                graded.user_id,
                graded.exercise_id,
                e
            );
            outcome.xp_error = Some(xp_error_message(&e).to_string());
        }
    }

    Ok(outcome)
}

fn xp_error_message(err: &TransactionError) -> &'static str {
    match err {
        TransactionError::NotFound(_) => "Your account could not be found, so no XP was recorded.",
        TransactionError::Contended { .. } => {
            "Your answer was saved, but XP could not be updated right now. Please try again."
        }
        TransactionError::Store(_) => {
            "Your answer was saved, but XP could not be updated. Please try again later."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::user::UserProgress,
        progress::{StoreError, memory::MemoryStore},
    };

    fn graded(is_correct: bool) -> GradedAnswer {
        GradedAnswer {
            user_id: 1,
            exercise_id: 7,
            is_correct,
            xp_value: 20,
        }
    }

    async fn submit(store: &MemoryStore, answer: GradedAnswer) -> Result<AnswerOutcome, AppError> {
        persist_answer(
            store,
            &LevelTable::default(),
            &RetryPolicy::default(),
            5,
            answer,
        )
        .await
    }

    #[tokio::test]
    async fn test_first_correct_answer_awards_xp() {
        let store = MemoryStore::with_user(1, UserProgress { xp: 90, level: 1 });

        let outcome = submit(&store, graded(true)).await.unwrap();

        assert!(outcome.is_correct);
        assert_eq!(outcome.xp_awarded, 20);
        assert!(outcome.leveled_up);
        assert_eq!(outcome.progress, Some(UserProgress { xp: 110, level: 2 }));
        assert_eq!(store.answers().len(), 1);
        assert!(store.answers()[0].is_correct);
    }

    #[tokio::test]
    async fn test_repeat_correct_answer_is_logged_without_xp() {
        let store = MemoryStore::with_user(1, UserProgress { xp: 90, level: 1 });

        submit(&store, graded(true)).await.unwrap();
        let again = submit(&store, graded(true)).await.unwrap();

        assert!(again.is_correct);
        assert_eq!(again.xp_awarded, 0);
        assert!(!again.leveled_up);
        assert_eq!(store.answers().len(), 2);
        assert_eq!(store.progress(1), Some(UserProgress { xp: 110, level: 2 }));
    }

    #[tokio::test]
    async fn test_wrong_answer_is_logged_without_award() {
        let store = MemoryStore::with_user(1, UserProgress { xp: 0, level: 1 });

        let outcome = submit(&store, graded(false)).await.unwrap();

        assert!(!outcome.is_correct);
        assert_eq!(outcome.progress, None);
        assert_eq!(store.answers().len(), 1);
        assert_eq!(store.progress_writes(), 0);
    }

    #[tokio::test]
    async fn test_grading_survives_failed_award() {
        // Answer log accepts the row but the user record is missing.
        let store = MemoryStore::default();

        let outcome = submit(&store, graded(true)).await.unwrap();

        assert!(outcome.is_correct);
        assert_eq!(outcome.xp_awarded, 0);
        assert!(outcome.xp_error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_log_write_surfaces_error() {
        let store = MemoryStore::with_user(1, UserProgress::default());
        store.fail_next_appends((0..3).map(|_| StoreError::Transient("offline".into())));

        let err = submit(&store, graded(true)).await.unwrap_err();

        assert!(matches!(err, AppError::ServiceUnavailable(_)));
        assert!(store.answers().is_empty());
        assert_eq!(store.progress(1), Some(UserProgress::default()));
    }
}
