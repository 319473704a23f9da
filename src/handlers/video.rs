// src/handlers/video.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    config::{Config, xp_reward},
    error::AppError,
    models::video::{CreateVideoRequest, UpdateVideoRequest, Video},
    progress::{AwardKey, LevelResolver, PgStore},
    utils::jwt::Claims,
};

const VIDEO_COLUMNS: &str = "id, title, url, summary, xp_value, created_at, created_by";

async fn fetch_video(pool: &PgPool, id: i64) -> Result<Video, AppError> {
    sqlx::query_as::<_, Video>(&format!("SELECT {} FROM videos WHERE id = $1", VIDEO_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Video not found".to_string()))
}

/// Ensures the caller wrote the video.
fn ensure_author(video: &Video, claims: &Claims) -> Result<(), AppError> {
    if video.created_by != Some(claims.user_id()?) {
        return Err(AppError::Forbidden(
            "Only the author can change this video".to_string(),
        ));
    }
    Ok(())
}

/// Lists all videos, newest first.
pub async fn list_videos(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let videos = sqlx::query_as::<_, Video>(&format!(
        "SELECT {} FROM videos ORDER BY created_at DESC, id DESC",
        VIDEO_COLUMNS
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list videos: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(videos))
}

/// Retrieves a single video by ID.
pub async fn get_video(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(fetch_video(&pool, id).await?))
}

/// Adds a video to the catalogue.
/// Teacher only.
pub async fn create_video(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateVideoRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let author_id = claims.user_id()?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO videos (title, url, summary, xp_value, created_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(payload.title.trim())
    .bind(&payload.url)
    .bind(payload.summary.as_deref().unwrap_or_default())
    .bind(payload.xp_value)
    .bind(author_id)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create video: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Updates a video by ID.
/// Teacher only, and only the author.
pub async fn update_video(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateVideoRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let video = fetch_video(&pool, id).await?;
    ensure_author(&video, &claims)?;

    if payload.is_empty() {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE videos SET ");
    let mut separated = builder.separated(", ");

    if let Some(title) = payload.title {
        separated.push("title = ");
        separated.push_bind_unseparated(title.trim().to_string());
    }

    if let Some(url) = payload.url {
        separated.push("url = ");
        separated.push_bind_unseparated(url);
    }

    if let Some(summary) = payload.summary {
        separated.push("summary = ");
        separated.push_bind_unseparated(summary);
    }

    if let Some(xp_value) = payload.xp_value {
        separated.push("xp_value = ");
        separated.push_bind_unseparated(xp_value);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update video: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Video not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a video by ID.
/// Teacher only, and only the author.
pub async fn delete_video(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let video = fetch_video(&pool, id).await?;
    ensure_author(&video, &claims)?;

    sqlx::query("DELETE FROM videos WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete video: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Marks a video as watched and grants its XP the first time.
pub async fn mark_watched(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let video = fetch_video(&pool, id).await?;
    let xp_value = xp_reward(video.xp_value).ok_or_else(|| {
        tracing::error!("Video {} has an invalid stored XP value {}", id, video.xp_value);
        AppError::InternalServerError("Video has an invalid XP value".to_string())
    })?;

    let store = PgStore::new(pool);
    let outcome = tokio::spawn(async move {
        LevelResolver::new(&store, &config.level_table)
            .with_max_attempts(config.award_max_attempts)
            .award_once(user_id, AwardKey::Video(id), xp_value)
            .await
    })
    .await
    .map_err(|e| AppError::InternalServerError(format!("award task failed: {}", e)))??;

    Ok(Json(serde_json::json!({
        "xp_awarded": outcome.xp_gained(),
        "leveled_up": outcome.leveled_up(),
        "progress": outcome.progress(),
    })))
}
