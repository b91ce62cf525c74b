// src/routes.rs

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{
    handlers::{quiz, upload},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Mounts the quiz API under `/api`.
/// * Applies global middleware (Trace, CORS).
/// * Serves the frontend build as a SPA fallback when present.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/upload", post(upload::upload_file))
        .route("/quizzes", get(quiz::list_quizzes))
        .route("/quiz/{quiz_id}/metadata", get(quiz::get_quiz_metadata))
        .route("/quiz/{quiz_id}", get(quiz::get_quiz_questions))
        .route("/quiz/{quiz_id}/submit", post(quiz::submit_attempt))
        .route("/quiz/{quiz_id}/leaderboard", get(quiz::get_leaderboard));

    let router = Router::new()
        .nest("/api", api_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    // Serve the built frontend if a build exists next to the binary.
    let dist = std::path::Path::new("frontend/dist");
    if dist.exists() {
        let spa = ServeDir::new(dist).fallback(ServeFile::new(dist.join("index.html")));
        router.fallback_service(spa)
    } else {
        router
    }
}
