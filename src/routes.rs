// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{answer, auth, exercise, profile, quiz, video},
    state::AppState,
    utils::jwt::{auth_middleware, teacher_middleware},
};

/// Assembles the main application router.
///
/// * Public catalogue routes (exercises, videos, leaderboard).
/// * Student routes behind `auth_middleware`.
/// * Teacher routes behind `auth_middleware` then `teacher_middleware`.
/// * Global Trace and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let exercise_routes = Router::new()
        .route("/", get(exercise::list_exercises))
        .route("/{id}", get(exercise::get_exercise))
        .merge(
            Router::new()
                .route("/{id}/answers", post(answer::submit_answer))
                .layer(require_auth.clone()),
        )
        // Auth first, then the teacher check
        .merge(
            Router::new()
                .route("/", post(exercise::create_exercise))
                .route("/{id}", delete(exercise::delete_exercise))
                .layer(middleware::from_fn(teacher_middleware))
                .layer(require_auth.clone()),
        );

    let video_routes = Router::new()
        .route("/", get(video::list_videos))
        .route("/{id}", get(video::get_video))
        .merge(
            Router::new()
                .route("/{id}/watched", post(video::mark_watched))
                .layer(require_auth.clone()),
        )
        .merge(
            Router::new()
                .route("/", post(video::create_video))
                .route("/{id}", put(video::update_video).delete(video::delete_video))
                .layer(middleware::from_fn(teacher_middleware))
                .layer(require_auth.clone()),
        );

    let me_routes = Router::new()
        .route("/", get(profile::get_me))
        .route("/answers", get(profile::list_my_answers))
        .layer(require_auth.clone());

    let quiz_routes = Router::new()
        .route("/start", post(quiz::start_quiz))
        .route("/{session_id}", delete(quiz::abandon_quiz))
        .route("/{session_id}/answer", post(quiz::answer_question))
        .layer(require_auth);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/exercises", exercise_routes)
        .nest("/api/videos", video_routes)
        .nest("/api/me", me_routes)
        .nest("/api/quiz", quiz_routes)
        .route("/api/leaderboard", get(profile::get_leaderboard))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
