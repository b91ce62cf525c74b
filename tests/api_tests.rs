// tests/api_tests.rs

use axum::{Json, Router, routing::post};
use quizchat_backend::{config::Config, generation::QuizGenerator, routes, state::AppState};
use sqlx::postgres::PgPoolOptions;

/// Canned model output: three valid questions with correct answers [0, 1, 2].
const THREE_QUESTIONS: &str = r#"[
  {"text": "誰先說早安?", "options": ["小明", "小華", "小美", "小強"], "correct_answer": 0, "explanation": "對話開頭"},
  {"text": "聚餐地點在哪?", "options": ["台北", "台中", "高雄", "台南"], "correct_answer": 1, "explanation": "對話中段"},
  {"text": "最後誰道晚安?", "options": ["小明", "小華", "小美", "小強"], "correct_answer": 2, "explanation": "對話結尾"}
]"#;

/// Spawns a stub model endpoint that answers every generateContent call with
/// the given text wrapped in the Gemini response envelope.
async fn spawn_model_stub(response_text: &str) -> String {
    let text = response_text.to_string();

    let app = Router::new().route(
        "/v1beta/models/{action}",
        post(move || {
            let text = text.clone();
            async move {
                Json(serde_json::json!({
                    "candidates": [{ "content": { "parts": [{ "text": text }] } }]
                }))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Helper function to spawn the app on a random port for testing.
/// The generation client is pointed at a stub model server returning
/// `model_response`. Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app(model_response: &str) -> String {
    // Note: For Postgres, you must have a running database.
    // We'll read from DATABASE_URL environment variable.
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing. Make sure DATABASE_URL is set.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let stub_url = spawn_model_stub(model_response).await;

    let config = Config {
        database_url: database_url.clone(),
        gemini_api_key: "test-key".to_string(),
        gemini_model: "gemini-test".to_string(),
        gemini_base_url: stub_url,
        gemini_timeout_secs: 10,
        rust_log: "error".to_string(),
    };

    let generator = QuizGenerator::from_config(&config).expect("Failed to build generator");

    let state = AppState {
        pool,
        config,
        generator,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Uploads `bytes` as a multipart `file` field named `filename`.
async fn upload(
    client: &reqwest::Client,
    address: &str,
    filename: &str,
    bytes: &[u8],
) -> reqwest::Response {
    let part = reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(filename.to_string());
    let form = reqwest::multipart::Form::new().part("file", part);

    client
        .post(format!("{}/api/upload", address))
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute upload request")
}

/// Fetches all quizzes and keeps only those whose display name starts with
/// `prefix`, preserving server order.
async fn list_with_prefix(
    client: &reqwest::Client,
    address: &str,
    prefix: &str,
) -> Vec<serde_json::Value> {
    let all: Vec<serde_json::Value> = client
        .get(format!("{}/api/quizzes", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    all.into_iter()
        .filter(|q| q["filename"].as_str().unwrap_or("").starts_with(prefix))
        .collect()
}

fn unique_filename(prefix: &str) -> String {
    format!("{}_{}.txt", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}

#[tokio::test]
async fn upload_creates_quiz_with_questions() {
    // Arrange
    let address = spawn_app(THREE_QUESTIONS).await;
    let client = reqwest::Client::new();
    let filename = unique_filename("chat");

    // Act
    let response = upload(&client, &address, &filename, "line one\nline two".as_bytes()).await;

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let quiz: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        quiz["filename"].as_str().unwrap(),
        filename.trim_end_matches(".txt")
    );

    let quiz_id = quiz["id"].as_str().unwrap();

    let questions: Vec<serde_json::Value> = client
        .get(format!("{}/api/quiz/{}", address, quiz_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(questions.len(), 3);
    assert_eq!(questions[0]["text"], "誰先說早安?");
    assert_eq!(questions[2]["correct_answer"], 2);

    let metadata_status = client
        .get(format!("{}/api/quiz/{}/metadata", address, quiz_id))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(metadata_status.as_u16(), 200);
}

#[tokio::test]
async fn upload_filters_invalid_items() {
    // One valid item, one missing options, one with out-of-range correct index.
    let mixed = r#"```json
[
  {"text": "有效題目", "options": ["甲", "乙"], "correct_answer": 1, "explanation": ""},
  {"text": "沒有選項", "correct_answer": 0},
  {"text": "索引超界", "options": ["甲", "乙"], "correct_answer": 5}
]
```"#;
    let address = spawn_app(mixed).await;
    let client = reqwest::Client::new();

    let response = upload(&client, &address, &unique_filename("mixed"), b"log").await;
    assert_eq!(response.status().as_u16(), 200);

    let quiz: serde_json::Value = response.json().await.unwrap();
    let questions: Vec<serde_json::Value> = client
        .get(format!("{}/api/quiz/{}", address, quiz["id"].as_str().unwrap()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["text"], "有效題目");
}

#[tokio::test]
async fn upload_rejects_non_utf8_bytes() {
    let address = spawn_app(THREE_QUESTIONS).await;
    let client = reqwest::Client::new();

    let response = upload(&client, &address, "binary.txt", &[0xff, 0xfe, 0x00]).await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn upload_fails_when_model_returns_garbage() {
    let address = spawn_app("Sorry, I can't do that.").await;
    let client = reqwest::Client::new();

    let response = upload(&client, &address, &unique_filename("bad"), b"log").await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn upload_fails_when_no_questions_survive() {
    let address = spawn_app("[]").await;
    let client = reqwest::Client::new();

    let response = upload(&client, &address, &unique_filename("empty"), b"log").await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn repeated_filenames_get_numbered_names() {
    let address = spawn_app(THREE_QUESTIONS).await;
    let client = reqwest::Client::new();
    let filename = unique_filename("dup");
    let base = filename.trim_end_matches(".txt").to_string();

    let first: serde_json::Value = upload(&client, &address, &filename, b"log")
        .await
        .json()
        .await
        .unwrap();
    let second: serde_json::Value = upload(&client, &address, &filename, b"log")
        .await
        .json()
        .await
        .unwrap();
    let third: serde_json::Value = upload(&client, &address, &filename, b"log")
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(first["filename"].as_str().unwrap(), base);
    assert_eq!(second["filename"].as_str().unwrap(), format!("{} 2", base));
    assert_eq!(third["filename"].as_str().unwrap(), format!("{} 3", base));
}

#[tokio::test]
async fn submit_and_leaderboard_flow() {
    let address = spawn_app(THREE_QUESTIONS).await;
    let client = reqwest::Client::new();

    let quiz: serde_json::Value = upload(&client, &address, &unique_filename("flow"), b"log")
        .await
        .json()
        .await
        .unwrap();
    let quiz_id = quiz["id"].as_str().unwrap();

    // Correct answers are [0, 1, 2].
    let submissions = [
        ("alice", vec![0, 1, 3], 20),
        ("bob", vec![0, 1, 2], 30),
        ("carol", vec![9, 9, 9], 0),
    ];

    for (user, answers, expected_score) in &submissions {
        let response = client
            .post(format!("{}/api/quiz/{}/submit", address, quiz_id))
            .json(&serde_json::json!({ "user_name": user, "answers": answers }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 200);
        let attempt: serde_json::Value = response.json().await.unwrap();
        assert_eq!(attempt["score"].as_i64().unwrap(), *expected_score as i64);
        assert_eq!(attempt["user_name"].as_str().unwrap(), *user);
    }

    // Wrong answer count is a 400 and leaves no attempt behind.
    let mismatch = client
        .post(format!("{}/api/quiz/{}/submit", address, quiz_id))
        .json(&serde_json::json!({ "user_name": "dave", "answers": [0, 1] }))
        .send()
        .await
        .unwrap();
    assert_eq!(mismatch.status().as_u16(), 400);

    let leaderboard: Vec<serde_json::Value> = client
        .get(format!("{}/api/quiz/{}/leaderboard", address, quiz_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let ranked: Vec<(&str, i64)> = leaderboard
        .iter()
        .map(|e| (e["user_name"].as_str().unwrap(), e["score"].as_i64().unwrap()))
        .collect();
    assert_eq!(ranked, vec![("bob", 30), ("alice", 20), ("carol", 0)]);
}

#[tokio::test]
async fn unknown_quiz_returns_404() {
    let address = spawn_app(THREE_QUESTIONS).await;
    let client = reqwest::Client::new();
    let missing_id = uuid::Uuid::new_v4();

    for path in [
        format!("{}/api/quiz/{}/metadata", address, missing_id),
        format!("{}/api/quiz/{}", address, missing_id),
    ] {
        let response = client.get(&path).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 404, "expected 404 for {}", path);
    }

    let submit = client
        .post(format!("{}/api/quiz/{}/submit", address, missing_id))
        .json(&serde_json::json!({ "user_name": "alice", "answers": [0] }))
        .send()
        .await
        .unwrap();
    assert_eq!(submit.status().as_u16(), 404);
}

#[tokio::test]
async fn list_quizzes_is_stable_between_reads() {
    let address = spawn_app(THREE_QUESTIONS).await;
    let client = reqwest::Client::new();

    // Two uploads sharing a unique prefix so other tests' quizzes can be
    // filtered out of the comparison.
    let prefix = format!("stable_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    upload(&client, &address, &format!("{}_a.txt", prefix), b"log").await;
    upload(&client, &address, &format!("{}_b.txt", prefix), b"log").await;

    let first = list_with_prefix(&client, &address, &prefix).await;
    let second = list_with_prefix(&client, &address, &prefix).await;

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    // Newest first: the second upload leads.
    assert!(first[0]["filename"]
        .as_str()
        .unwrap()
        .ends_with("_b"));
}
