// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Represents the 'attempts' table in the database.
/// An attempt is created terminal: no edit or resubmit path.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub quiz_id: Uuid,
    pub user_name: String,
    pub score: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    #[validate(length(min = 1, max = 100))]
    pub user_name: String,

    /// Chosen option indices, one per question, in question order.
    pub answers: Vec<i32>,
}

/// One leaderboard row for a quiz, ranked by score.
#[derive(Debug, Serialize, FromRow)]
pub struct LeaderboardEntry {
    pub user_name: String,
    pub score: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
