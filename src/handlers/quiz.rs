// src/handlers/quiz.rs

use std::collections::BTreeSet;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    handlers::exercise::EXERCISE_COLUMNS,
    models::{
        exercise::Exercise,
        quiz::{QuizAnswerRequest, QuizStepResponse, StartQuizParams, StartQuizResponse},
    },
    quiz::{QuizItem, QuizSession, QuizSessions},
    utils::jwt::Claims,
};

/// Starts a practice quiz over randomly picked exercises.
///
/// Options are shuffled per question. Practice quizzes never award XP and
/// never write to the answer log.
pub async fn start_quiz(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    State(sessions): State<QuizSessions>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<StartQuizParams>,
) -> Result<impl IntoResponse, AppError> {
    params
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let user_id = claims.user_id()?;
    let count = params.count.unwrap_or(config.quiz_question_count);

    let exercises = sqlx::query_as::<_, Exercise>(&format!(
        "SELECT {} FROM exercises WHERE archived_at IS NULL ORDER BY RANDOM() LIMIT $1",
        EXERCISE_COLUMNS
    ))
    .bind(count)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to pick quiz exercises: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if exercises.is_empty() {
        return Err(AppError::NotFound(
            "No exercises available for a quiz yet".to_string(),
        ));
    }

    let items: Vec<QuizItem> = exercises.into_iter().map(QuizItem::from).collect();
    let mut session = QuizSession::new(user_id, items);
    let question = session.present(&mut rand::thread_rng())?;
    let total = session.total();

    let session_id = sessions.insert(session).await;
    let active = sessions.len().await;
    tracing::debug!(
        "User {} started quiz {} ({} questions, {} sessions active)",
        user_id,
        session_id,
        total,
        active
    );

    Ok((
        StatusCode::CREATED,
        Json(StartQuizResponse {
            session_id,
            total,
            question,
        }),
    ))
}

/// Grades the question on screen and presents the next one.
pub async fn answer_question(
    State(sessions): State<QuizSessions>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<QuizAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let user_id = claims.user_id()?;
    let selected: BTreeSet<usize> = payload.selected.into_iter().collect();

    let step = sessions
        .with_session(session_id, user_id, |session| {
            let verdict = session.submit(&selected)?;
            session.advance()?;

            let next = if session.is_finished() {
                None
            } else {
                Some(session.present(&mut rand::thread_rng())?)
            };

            Ok(QuizStepResponse {
                correct: verdict.correct,
                correct_options: verdict.correct_options,
                score: session.score(),
                total: session.total(),
                finished: next.is_none(),
                next,
            })
        })
        .await?;

    if step.finished {
        tracing::debug!(
            "User {} finished quiz {} with {}/{}",
            user_id,
            session_id,
            step.score,
            step.total
        );
    }

    Ok(Json(step))
}

/// Abandons a running quiz.
pub async fn abandon_quiz(
    State(sessions): State<QuizSessions>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    if !sessions.remove(session_id, user_id).await? {
        return Err(AppError::NotFound("Quiz session not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
