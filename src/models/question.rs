// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use uuid::Uuid;

/// Represents the 'questions' table in the database.
/// Questions are inserted in bulk at quiz-creation time and never modified.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub quiz_id: Uuid,

    /// The text prompt shown to the player.
    pub text: String,

    /// Option strings, at least 2. Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// Index of the correct option. Validated against `options` length
    /// before insertion.
    pub correct_answer: i32,

    /// Explanation of the correct answer; may be empty.
    pub explanation: String,
}
