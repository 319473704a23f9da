// src/handlers/exercise.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::exercise::{CreateExerciseRequest, Exercise, ExerciseListParams, PublicExercise},
    utils::jwt::Claims,
};

pub(crate) const EXERCISE_COLUMNS: &str =
    "id, name, question, options, correct_options, hint, xp_value, created_at, created_by";

/// Loads one live exercise including its answer key.
/// Archived exercises are treated as missing.
pub(crate) async fn fetch_exercise(pool: &PgPool, id: i64) -> Result<Exercise, AppError> {
    sqlx::query_as::<_, Exercise>(&format!(
        "SELECT {} FROM exercises WHERE id = $1 AND archived_at IS NULL",
        EXERCISE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Exercise not found".to_string()))
}

/// Lists exercises, newest first, optionally only those by one author.
pub async fn list_exercises(
    State(pool): State<PgPool>,
    Query(params): Query<ExerciseListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(50).clamp(1, 200);

    let exercises = sqlx::query_as::<_, Exercise>(&format!(
        r#"
        SELECT {}
        FROM exercises
        WHERE archived_at IS NULL
          AND ($1::BIGINT IS NULL OR created_by = $1)
        ORDER BY created_at DESC, id DESC
        LIMIT $2
        "#,
        EXERCISE_COLUMNS
    ))
    .bind(params.created_by)
    .bind(limit)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list exercises: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let public: Vec<PublicExercise> = exercises.into_iter().map(PublicExercise::from).collect();

    Ok(Json(public))
}

/// Retrieves a single exercise by ID, without its answer key.
pub async fn get_exercise(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exercise = fetch_exercise(&pool, id).await?;
    Ok(Json(PublicExercise::from(exercise)))
}

/// Publishes a new exercise.
/// Teacher only. Exercises cannot be edited once published.
pub async fn create_exercise(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateExerciseRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let author_id = claims.user_id()?;

    let hint = payload
        .hint
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty());

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO exercises (name, question, options, correct_options, hint, xp_value, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(payload.name.trim())
    .bind(&payload.question)
    .bind(SqlJson(&payload.options))
    .bind(SqlJson(&payload.correct_options))
    .bind(hint)
    .bind(payload.xp_value)
    .bind(author_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create exercise: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    tracing::info!("Teacher {} published exercise {}", author_id, id);

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Removes an exercise from the catalogue.
/// Teacher only, and only the author.
///
/// The row is archived, not deleted: answers already logged against it stay
/// in every user's history.
pub async fn delete_exercise(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let author_id = claims.user_id()?;
    let exercise = fetch_exercise(&pool, id).await?;

    if exercise.created_by != Some(author_id) {
        return Err(AppError::Forbidden(
            "Only the author can delete this exercise".to_string(),
        ));
    }

    let result = sqlx::query(
        "UPDATE exercises SET archived_at = NOW() WHERE id = $1 AND archived_at IS NULL",
    )
    .bind(id)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to archive exercise: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Exercise not found".to_string()));
    }

    tracing::info!("Teacher {} archived exercise {}", author_id, id);

    Ok(StatusCode::NO_CONTENT)
}
