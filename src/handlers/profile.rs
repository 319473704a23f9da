// src/handlers/profile.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;

use crate::{
    config::{Config, LEADERBOARD_SIZE},
    error::AppError,
    models::{
        answer_result::AnswerHistoryEntry,
        user::{LeaderboardEntry, MeResponse},
    },
    utils::jwt::Claims,
};

#[derive(sqlx::FromRow)]
struct MeRow {
    id: i64,
    username: String,
    role: String,
    xp: i64,
    level: i32,
    created_at: chrono::DateTime<chrono::Utc>,
    answers_count: i64,
    correct_answers_count: i64,
}

/// Get current user's profile, progress and answer statistics.
pub async fn get_me(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let me = sqlx::query_as::<_, MeRow>(
        r#"
        SELECT
            u.id, u.username, u.role, u.xp, u.level, u.created_at,
            (SELECT COUNT(*) FROM answer_results WHERE user_id = u.id) AS answers_count,
            (SELECT COUNT(*) FROM answer_results WHERE user_id = u.id AND is_correct) AS correct_answers_count
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    let next_level = config.level_table.next_tier(me.xp);

    Ok(Json(MeResponse {
        id: me.id,
        username: me.username,
        role: me.role,
        xp: me.xp,
        level: me.level,
        max_level: config.level_table.max_level(),
        next_level,
        xp_to_next_level: next_level.map(|tier| tier.min_xp - me.xp),
        answers_count: me.answers_count,
        correct_answers_count: me.correct_answers_count,
        created_at: me.created_at,
    }))
}

/// Pagination for the answer history.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<i64>,
    pub cursor: Option<chrono::DateTime<chrono::Utc>>,
}

/// List the current user's graded attempts, newest first.
pub async fn list_my_answers(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<HistoryParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let answers = sqlx::query_as::<_, AnswerHistoryEntry>(
        r#"
        SELECT a.id, a.exercise_id, e.name AS exercise_name, a.is_correct, a.answered_at
        FROM answer_results a
        JOIN exercises e ON a.exercise_id = e.id
        WHERE a.user_id = $1
          AND ($2::TIMESTAMPTZ IS NULL OR a.answered_at < $2)
        ORDER BY a.answered_at DESC, a.id DESC
        LIMIT $3
        "#,
    )
    .bind(user_id)
    .bind(params.cursor)
    .bind(limit)
    .fetch_all(&pool)
    .await?;

    Ok(Json(answers))
}

/// Retrieves the users with the most XP.
pub async fn get_leaderboard(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let leaderboard = sqlx::query_as::<_, LeaderboardEntry>(
        r#"
        SELECT username, xp, level
        FROM users
        ORDER BY xp DESC, id ASC
        LIMIT $1
        "#,
    )
    .bind(LEADERBOARD_SIZE)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(leaderboard))
}
