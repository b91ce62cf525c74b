// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// Represents the 'quizzes' table in the database.
///
/// A quiz is created once per successful generation and is immutable
/// afterwards: no update or delete path exists. `filename` is the display
/// name derived from the upload filename, unique across all quizzes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub filename: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
