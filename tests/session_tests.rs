// tests/session_tests.rs

use std::time::Duration;

use quiz_backend::{
    config::{Config, QuestionSourceKind},
    routes,
    state::AppState,
};
use serde_json::{Value, json};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

struct TestApp {
    address: String,
    pool: SqlitePool,
    client: reqwest::Client,
    token: String,
}

async fn spawn_app_with(config: Config) -> TestApp {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(&config.database_url)
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let app = routes::create_router(AppState::new(pool.clone(), config).unwrap());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({"email": "taker@example.com", "password": "password123"}))
        .send()
        .await
        .unwrap();
    let login: Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({"email": "taker@example.com", "password": "password123"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = login["token"].as_str().unwrap().to_string();

    TestApp {
        address,
        pool,
        client,
        token,
    }
}

/// Three choice questions with correct indices [1, 0, 2].
async fn seed_three_questions(pool: &SqlitePool) {
    for correct in [1, 0, 2] {
        sqlx::query(
            "INSERT INTO questions (kind, level, text, options, correct_answer) VALUES ('choice', 'beginner', $1, $2, $3)",
        )
        .bind(json!(format!("Question {}", correct)).to_string())
        .bind(json!(["A", "B", "C"]).to_string())
        .bind(correct)
        .execute(pool)
        .await
        .unwrap();
    }
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get_json(&self, path: &str) -> Value {
        self.client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    async fn start(&self) -> Value {
        let response = self.post("/api/sessions", json!({})).await;
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    async fn answer(&self, id: &str, answer: Value) -> Value {
        self.post(&format!("/api/sessions/{}/answer", id), json!({ "answer": answer }))
            .await
            .json()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn full_run_scores_two_of_three() {
    let app = spawn_app_with(Config::for_tests("session_secret")).await;
    seed_three_questions(&app.pool).await;

    let session = app.start().await;
    let id = session["id"].as_str().unwrap().to_string();
    assert_eq!(session["status"], "in_progress");
    assert_eq!(session["index"], 0);
    assert_eq!(session["total"], 3);
    assert!(session["question"].get("correctAnswer").is_none());

    // Result is not available before submission.
    let pending = app.get_json(&format!("/api/sessions/{}/result", id)).await;
    assert_eq!(pending["status"], "no_results");

    assert_eq!(app.answer(&id, json!(1)).await["index"], 1);
    assert_eq!(app.answer(&id, json!(0)).await["index"], 2);
    let last = app.answer(&id, json!(1)).await;
    assert_eq!(last["status"], "submitted");

    let result = app.get_json(&format!("/api/sessions/{}/result", id)).await;
    assert_eq!(
        result,
        json!({"status": "scored", "score": 2, "percent": 67, "total_graded": 3, "band": "medium"})
    );

    // Answers after submission change nothing.
    let late = app.answer(&id, json!(2)).await;
    assert_eq!(late["status"], "submitted");
    let again = app.get_json(&format!("/api/sessions/{}/result", id)).await;
    assert_eq!(again, result);

    // The attempt is saved in the background.
    let mut attempts = Vec::new();
    for _ in 0..20 {
        attempts = app.get_json("/api/attempts").await.as_array().cloned().unwrap();
        if !attempts.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0]["percent"], 67);
    assert_eq!(attempts[0]["answers"], json!([1, 0, 1]));
}

#[tokio::test]
async fn timer_expiry_submits_unanswered_attempt() {
    let mut config = Config::for_tests("session_secret");
    config.test_duration_secs = 1;
    let app = spawn_app_with(config).await;
    seed_three_questions(&app.pool).await;

    let session = app.start().await;
    let id = session["id"].as_str().unwrap().to_string();

    let mut result = Value::Null;
    for _ in 0..40 {
        result = app.get_json(&format!("/api/sessions/{}/result", id)).await;
        if result["status"] == "scored" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(result["score"], 0);
    assert_eq!(result["percent"], 0);
    assert_eq!(result["band"], "weak");

    let snapshot = app.get_json(&format!("/api/sessions/{}", id)).await;
    assert_eq!(snapshot["status"], "submitted");
    assert_eq!(snapshot["remaining_secs"], 0);
}

#[tokio::test]
async fn unavailable_source_starts_nothing() {
    let mut config = Config::for_tests("session_secret");
    config.question_source =
        QuestionSourceKind::Http(url::Url::parse("http://127.0.0.1:9/questions").unwrap());
    config.question_fetch_timeout_secs = 1;
    let app = spawn_app_with(config).await;

    let response = app.post("/api/sessions", json!({})).await;
    assert_eq!(response.status().as_u16(), 503);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn empty_question_bank_is_unavailable() {
    let app = spawn_app_with(Config::for_tests("session_secret")).await;
    let response = app.post("/api/sessions", json!({})).await;
    assert_eq!(response.status().as_u16(), 503);
}

#[tokio::test]
async fn bundled_source_serves_levels() {
    let mut config = Config::for_tests("session_secret");
    config.question_source = QuestionSourceKind::Static;
    let app = spawn_app_with(config).await;

    let response = app.post("/api/sessions", json!({"level": "advanced"})).await;
    assert_eq!(response.status().as_u16(), 201);
    let session: Value = response.json().await.unwrap();
    assert_eq!(session["question"]["level"], "advanced");
}

#[tokio::test]
async fn sessions_are_private_and_can_be_abandoned() {
    let app = spawn_app_with(Config::for_tests("session_secret")).await;
    seed_three_questions(&app.pool).await;
    let session = app.start().await;
    let id = session["id"].as_str().unwrap().to_string();

    // A second user cannot see it.
    app.client
        .post(app.url("/api/auth/register"))
        .json(&json!({"email": "other@example.com", "password": "password123"}))
        .send()
        .await
        .unwrap();
    let other: Value = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({"email": "other@example.com", "password": "password123"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let foreign = app
        .client
        .get(app.url(&format!("/api/sessions/{}", id)))
        .bearer_auth(other["token"].as_str().unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(foreign.status().as_u16(), 404);

    let abandoned = app
        .client
        .delete(app.url(&format!("/api/sessions/{}", id)))
        .bearer_auth(&app.token)
        .send()
        .await
        .unwrap();
    assert_eq!(abandoned.status().as_u16(), 204);

    let result = app.get_json(&format!("/api/sessions/{}/result", id)).await;
    assert_eq!(result["status"], "no_results");
}
