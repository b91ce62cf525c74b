// src/handlers/upload.rs

use axum::{
    Json,
    extract::{Multipart, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    state::AppState,
    store,
    utils::{extract, names},
};

/// Handles a transcript upload and runs the full generation pipeline.
///
/// * Decodes the uploaded bytes as strict UTF-8.
/// * Probes a collision-free display name (best-effort).
/// * Calls the model with no transaction open; this is the only slow step.
/// * Persists quiz + questions atomically; a commit-time name conflict is
///   retried exactly once with a fresh probe.
///
/// A failed generation leaves no quiz record behind.
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut filename = None;
    let mut bytes = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() == Some("file") {
            filename = field.file_name().map(str::to_string);
            bytes = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?,
            );
            break;
        }
    }

    let bytes = bytes.ok_or_else(|| AppError::BadRequest("Missing 'file' field".to_string()))?;
    let filename = filename.unwrap_or_else(|| "upload.txt".to_string());

    let content = extract::decode_utf8(bytes.to_vec())?;

    // Probe the name before the model call so an obviously taken name is
    // skipped early. The unique constraint still decides at commit time.
    let display_name = allocate_name(&state.pool, &filename).await?;

    let records = state.generator.generate(&content).await?;

    let quiz = match store::create_quiz_with_questions(&state.pool, &display_name, &records).await {
        Ok(quiz) => quiz,
        Err(AppError::NameConflict(_)) => {
            // Lost the race to a concurrent upload with the same base name.
            // Re-probe against the now-committed names and retry once.
            tracing::warn!("Display name '{}' taken at commit time, retrying", display_name);
            let display_name = allocate_name(&state.pool, &filename).await?;
            store::create_quiz_with_questions(&state.pool, &display_name, &records).await?
        }
        Err(e) => return Err(e),
    };

    tracing::info!(
        "Created quiz '{}' ({}) with {} questions",
        quiz.filename,
        quiz.id,
        records.len()
    );

    Ok(Json(quiz))
}

/// Derives a currently-free display name for the upload filename.
async fn allocate_name(pool: &PgPool, filename: &str) -> Result<String, AppError> {
    let base = names::strip_extension(filename);
    let taken = store::taken_names(pool, base).await?;
    Ok(names::dedupe_name(filename, |candidate| {
        taken.contains(candidate)
    }))
}
