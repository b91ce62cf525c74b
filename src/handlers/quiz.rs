// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{error::AppError, models::attempt::SubmitAttemptRequest, scoring, store};

/// Lists all quizzes, newest first.
pub async fn list_quizzes(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let quizzes = store::list_quizzes(&pool).await?;
    Ok(Json(quizzes))
}

/// Retrieves metadata for a single quiz.
pub async fn get_quiz_metadata(
    State(pool): State<PgPool>,
    Path(quiz_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = store::get_quiz(&pool, quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    Ok(Json(quiz))
}

/// Retrieves a quiz's questions in their stored order.
/// A quiz with no questions cannot exist (creation is atomic), so an empty
/// result means the quiz id is unknown.
pub async fn get_quiz_questions(
    State(pool): State<PgPool>,
    Path(quiz_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let questions = store::list_questions(&pool, quiz_id).await?;

    if questions.is_empty() {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(Json(questions))
}

/// Grades a submitted attempt and persists it.
///
/// * 404 for an unknown quiz.
/// * 400 when the answer count differs from the question count.
/// * 10 points per correct answer; out-of-range indices never match.
///
/// A failed submission leaves no attempt record.
pub async fn submit_attempt(
    State(pool): State<PgPool>,
    Path(quiz_id): Path<Uuid>,
    Json(req): Json<SubmitAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let questions = store::list_questions(&pool, quiz_id).await?;
    if questions.is_empty() {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    let correct: Vec<i32> = questions.iter().map(|q| q.correct_answer).collect();
    let score = scoring::score_answers(&correct, &req.answers)?;

    let attempt = store::record_attempt(&pool, quiz_id, &req.user_name, score).await?;

    Ok(Json(attempt))
}

/// Retrieves the leaderboard for a quiz: score descending, ties in
/// submission order.
pub async fn get_leaderboard(
    State(pool): State<PgPool>,
    Path(quiz_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let entries = store::leaderboard(&pool, quiz_id).await?;
    Ok(Json(entries))
}
