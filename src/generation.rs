// src/generation.rs
//
// Quiz Generation Client: turns a transcript into validated question records
// via a single call to a generative model endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Config;
use crate::error::AppError;

/// Transcript content beyond this many characters is dropped before
/// prompting. Not summarized, dropped.
pub const MAX_TRANSCRIPT_CHARS: usize = 250_000;

/// Number of questions the prompt asks the model for. The model is not
/// guaranteed to comply; validation decides what survives.
pub const TARGET_QUESTION_COUNT: usize = 20;

/// A question as extracted from the model response, validated but not yet
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionRecord {
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: i32,
    pub explanation: String,
}

/// Why a single model-emitted item was dropped during validation.
/// Rejections are logged, never surfaced to the end user individually.
#[derive(Debug, PartialEq, Eq)]
pub enum ItemRejection {
    NotAnObject,
    MissingOrEmptyText,
    BadOptions,
    MissingCorrectAnswer,
    CorrectAnswerOutOfRange,
}

/// Seam to the generative model: prompt in, free-form text out.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String, AppError>;
}

/// HTTP client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.gemini_timeout_secs))
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(Self {
            http,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> Result<String, AppError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!("Gemini returned {}: {}", status, detail);
            return Err(AppError::Generation(format!(
                "model endpoint returned {}",
                status
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AppError::Generation(e.to_string()))?;

        // Concatenate every text part of the first candidate.
        let parts = payload
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .ok_or_else(|| AppError::Generation("no candidate content in response".to_string()))?;

        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();

        if text.is_empty() {
            return Err(AppError::Generation(
                "candidate contained no text parts".to_string(),
            ));
        }

        Ok(text)
    }
}

/// The generation pipeline: truncate, prompt, call the model once, parse and
/// validate. Cheap to clone; handlers keep one in `AppState`.
#[derive(Clone)]
pub struct QuizGenerator {
    model: Arc<dyn ModelClient>,
}

impl QuizGenerator {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self { model }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Ok(Self::new(Arc::new(GeminiClient::new(config)?)))
    }

    /// Runs the full generation pipeline for one transcript.
    ///
    /// A transport/parse failure is `Generation`; zero surviving questions is
    /// `EmptyResult`. No partial results, no automatic retry.
    pub async fn generate(&self, transcript: &str) -> Result<Vec<QuestionRecord>, AppError> {
        let truncated = truncate_transcript(transcript);
        if truncated.len() < transcript.len() {
            tracing::info!(
                "Transcript truncated from {} to {} chars before prompting",
                transcript.chars().count(),
                MAX_TRANSCRIPT_CHARS
            );
        }

        let prompt = build_prompt(truncated);
        let raw = self.model.generate_text(&prompt).await?;

        let questions = parse_model_response(&raw)?;
        if questions.is_empty() {
            return Err(AppError::EmptyResult);
        }

        tracing::info!("Generated {} questions using Gemini.", questions.len());
        Ok(questions)
    }
}

/// Truncates to `MAX_TRANSCRIPT_CHARS` characters on a char boundary.
fn truncate_transcript(content: &str) -> &str {
    match content.char_indices().nth(MAX_TRANSCRIPT_CHARS) {
        Some((byte_idx, _)) => &content[..byte_idx],
        None => content,
    }
}

/// Fixed instruction template sent with every generation request.
fn build_prompt(content: &str) -> String {
    format!(
        r#"[Task]
You are an expert at analyzing long conversation logs.
Analyze the ENTIRE chat log provided below and generate {count} high-quality multiple-choice questions.

[Requirements]
1. Focus: funny moments, unique inside jokes, specific details (dates, amounts, locations), and identifying who said what.
2. Distribution: Ensure the questions are derived from DIFFERENT parts of the log (beginning, middle, and end) to represent the whole conversation.
3. Language: Everything (questions and options) MUST be in Traditional Chinese (繁體中文).
4. Output Format: STRICTLY output a raw JSON array of objects. No markdown, no preamble, no trailing text.

[JSON Schema]
[
    {{
        "text": "問題題目",
        "options": ["選項 A", "選項 B", "選項 C", "選項 D"],
        "correct_answer": 0,
        "explanation": "簡短解釋正確答案的出處或原因"
    }}
]

[Chat Log Content]
{content}"#,
        count = TARGET_QUESTION_COUNT,
        content = content
    )
}

/// Removes code-fence markup the model may still wrap around the JSON body.
fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parses the raw model output into validated question records.
///
/// Malformed JSON or a non-array top level aborts the whole operation.
/// Individual items failing validation are logged and dropped.
pub fn parse_model_response(raw: &str) -> Result<Vec<QuestionRecord>, AppError> {
    let cleaned = strip_code_fences(raw);

    let parsed: Value = serde_json::from_str(&cleaned)
        .map_err(|e| AppError::Generation(format!("model output is not valid JSON: {}", e)))?;

    let items = parsed
        .as_array()
        .ok_or_else(|| AppError::Generation("model output is not a JSON array".to_string()))?;

    let mut questions = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match validate_item(item) {
            Ok(record) => questions.push(record),
            Err(reason) => {
                tracing::warn!("Dropping model item {}: {:?}", idx, reason);
            }
        }
    }

    Ok(questions)
}

/// Schema validation for one model-emitted item.
///
/// Accepts only items with non-empty `text`, at least 2 string `options`,
/// and a `correct_answer` that is a valid index into `options`. An
/// out-of-range correct index would make the question permanently unscorable
/// as "correct", so it is rejected here rather than stored.
fn validate_item(item: &Value) -> Result<QuestionRecord, ItemRejection> {
    let obj = item.as_object().ok_or(ItemRejection::NotAnObject)?;

    let text = obj
        .get("text")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .ok_or(ItemRejection::MissingOrEmptyText)?;

    let options: Vec<String> = obj
        .get("options")
        .and_then(Value::as_array)
        .and_then(|opts| {
            opts.iter()
                .map(|o| o.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .filter(|opts| opts.len() >= 2)
        .ok_or(ItemRejection::BadOptions)?;

    let correct_answer = obj
        .get("correct_answer")
        .and_then(Value::as_i64)
        .ok_or(ItemRejection::MissingCorrectAnswer)?;

    if correct_answer < 0 || correct_answer as usize >= options.len() {
        return Err(ItemRejection::CorrectAnswerOutOfRange);
    }

    let explanation = obj
        .get("explanation")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    Ok(QuestionRecord {
        text: text.to_string(),
        options,
        correct_answer: correct_answer as i32,
        explanation,
    })
}
