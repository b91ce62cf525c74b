// src/store.rs
//
// Quiz Store: explicit persistence methods returning plain records.
// All mutation paths are inserts; rows are immutable once committed.

use std::collections::HashSet;

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::AppError;
use crate::generation::QuestionRecord;
use crate::models::attempt::{Attempt, LeaderboardEntry};
use crate::models::question::Question;
use crate::models::quiz::Quiz;

/// Inserts a quiz and all of its questions as a single durable unit.
///
/// Runs in one transaction: if any question insert fails, the quiz row rolls
/// back with it and no orphan quiz becomes visible. A unique violation on the
/// display name surfaces as `AppError::NameConflict` via the `From` impl, so
/// the caller can re-probe and retry.
pub async fn create_quiz_with_questions(
    pool: &PgPool,
    display_name: &str,
    records: &[QuestionRecord],
) -> Result<Quiz, AppError> {
    let mut tx = pool.begin().await?;

    let quiz: Quiz = sqlx::query_as(
        r#"
        INSERT INTO quizzes (id, filename)
        VALUES ($1, $2)
        RETURNING id, filename, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(display_name)
    .fetch_one(&mut *tx)
    .await?;

    for record in records {
        sqlx::query(
            r#"
            INSERT INTO questions (quiz_id, text, options, correct_answer, explanation)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(quiz.id)
        .bind(&record.text)
        .bind(Json(&record.options))
        .bind(record.correct_answer)
        .bind(&record.explanation)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(quiz)
}

/// Fetches the display names that could collide with `base`: the base name
/// itself and any of its `"base N"` siblings. Feeds the deduplication probe;
/// the unique constraint remains the authority at commit time.
pub async fn taken_names(pool: &PgPool, base: &str) -> Result<HashSet<String>, AppError> {
    // Escape LIKE metacharacters so a literal '_' or '%' in the base name
    // does not widen the match.
    let escaped = base
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");

    let names: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT filename FROM quizzes
        WHERE filename = $1 OR filename LIKE $2
        "#,
    )
    .bind(base)
    .bind(format!("{} %", escaped))
    .fetch_all(pool)
    .await?;

    Ok(names.into_iter().map(|(name,)| name).collect())
}

/// Lists all quizzes, newest first.
pub async fn list_quizzes(pool: &PgPool) -> Result<Vec<Quiz>, AppError> {
    let quizzes = sqlx::query_as(
        r#"
        SELECT id, filename, created_at
        FROM quizzes
        ORDER BY created_at DESC, id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(quizzes)
}

/// Fetches one quiz by id.
pub async fn get_quiz(pool: &PgPool, quiz_id: Uuid) -> Result<Option<Quiz>, AppError> {
    let quiz = sqlx::query_as(
        r#"
        SELECT id, filename, created_at
        FROM quizzes
        WHERE id = $1
        "#,
    )
    .bind(quiz_id)
    .fetch_optional(pool)
    .await?;

    Ok(quiz)
}

/// Lists a quiz's questions in insertion order.
pub async fn list_questions(pool: &PgPool, quiz_id: Uuid) -> Result<Vec<Question>, AppError> {
    let questions = sqlx::query_as(
        r#"
        SELECT id, quiz_id, text, options, correct_answer, explanation
        FROM questions
        WHERE quiz_id = $1
        ORDER BY id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    Ok(questions)
}

/// Persists one graded attempt.
pub async fn record_attempt(
    pool: &PgPool,
    quiz_id: Uuid,
    user_name: &str,
    score: i32,
) -> Result<Attempt, AppError> {
    let attempt = sqlx::query_as(
        r#"
        INSERT INTO attempts (quiz_id, user_name, score)
        VALUES ($1, $2, $3)
        RETURNING id, quiz_id, user_name, score, created_at
        "#,
    )
    .bind(quiz_id)
    .bind(user_name)
    .bind(score)
    .fetch_one(pool)
    .await?;

    Ok(attempt)
}

/// Leaderboard for one quiz: score descending, ties broken by submission
/// order.
pub async fn leaderboard(pool: &PgPool, quiz_id: Uuid) -> Result<Vec<LeaderboardEntry>, AppError> {
    let entries = sqlx::query_as(
        r#"
        SELECT user_name, score, created_at
        FROM attempts
        WHERE quiz_id = $1
        ORDER BY score DESC, id
        "#,
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
