// src/utils/extract.rs

use crate::error::AppError;

/// Decodes uploaded bytes into text.
///
/// Strict UTF-8 only: anything else is rejected as `AppError::Decode`.
/// No trimming, no size capping; the generation client owns truncation.
pub fn decode_utf8(bytes: Vec<u8>) -> Result<String, AppError> {
    String::from_utf8(bytes).map_err(|_| {
        AppError::Decode("Invalid file format. Please upload a UTF-8 text file.".to_string())
    })
}
