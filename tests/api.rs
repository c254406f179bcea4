// Integration tests for the HTTP API: question fallbacks, profile CRUD,
// answer recording, badges, sessions, and reset.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use greengpt_backend::api;
use greengpt_backend::db::Database;

/// Router backed by an in-memory database and no generation client, so
/// question routes exercise the fallback path.
async fn test_app() -> Router {
    let db = Arc::new(Database::new_in_memory().await.unwrap());
    api::router(db, None)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

fn post_json(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn put_json(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ── Health and static data ───────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "greengpt-backend");
}

#[tokio::test]
async fn test_list_categories() {
    let app = test_app().await;
    let (status, body) = send(&app, get("/api/categories")).await;
    assert_eq!(status, StatusCode::OK);
    let categories = body.as_array().unwrap();
    assert_eq!(categories.len(), 10);
    assert!(categories.iter().any(|c| c["name"] == "Biodiversité"));
    for c in categories {
        assert!(c["icon"].is_string());
        assert!(!c["subjects"].as_array().unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_list_modes() {
    let app = test_app().await;
    let (status, body) = send(&app, get("/api/modes")).await;
    assert_eq!(status, StatusCode::OK);
    let modes = body.as_array().unwrap();
    assert_eq!(modes.len(), 6);
    assert!(modes.iter().any(|m| m["id"] == "classic"));
    assert!(modes.iter().any(|m| m["id"] == "marathon"));
}

#[tokio::test]
async fn test_list_badges() {
    let app = test_app().await;
    let (status, body) = send(&app, get("/api/badges")).await;
    assert_eq!(status, StatusCode::OK);
    let badges = body.as_array().unwrap();
    assert_eq!(badges.len(), 7);
    for b in badges {
        assert!(b["id"].is_string());
        assert!(b["name"].is_string());
    }
}

// ── Question routes (fallback path) ──────────────────────────────────

#[tokio::test]
async fn test_quiz_question_serves_valid_fallback() {
    let app = test_app().await;
    let (status, body) = send(&app, post_json("/api/quiz-question", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["affirmation"].is_string());
    assert!(body["reponse"].is_boolean());
    assert!(body["explication"].is_string());
    assert!(body["categorie"].is_string());
    assert!(body["icone"].is_string());
    assert!(["facile", "moyen", "difficile"]
        .contains(&body["difficulte"].as_str().unwrap()));
}

#[tokio::test]
async fn test_quiz_question_accepts_mode_and_header() {
    let app = test_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/quiz-question")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-question-number", "12")
        .body(Body::from(
            json!({ "mode": "marathon" }).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["affirmation"].is_string());
}

#[tokio::test]
async fn test_quiz_question_without_body() {
    let app = test_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/quiz-question")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["affirmation"].is_string());
}

#[tokio::test]
async fn test_generate_statement_requires_prompt() {
    let app = test_app().await;

    let (status, body) = send(&app, post_json("/api/generate-statement", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        post_json("/api/generate-statement", json!({ "prompt": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_statement_falls_back_without_generator() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        post_json(
            "/api/generate-statement",
            json!({ "prompt": "Une question sur le recyclage" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["affirmation"].is_string());
    assert!(body["reponse"].is_boolean());
}

#[tokio::test]
async fn test_check_answer_without_generator_is_500() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        post_json(
            "/api/check-answer",
            json!({ "statement": "Les abeilles pollinisent.", "user_answer": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());
}

// ── Profiles ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_profile_crud() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        post_json("/api/profiles", json!({ "name": "Léa", "avatar": "🦊" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Léa");
    assert_eq!(body["avatar"], "🦊");
    assert_eq!(body["level"], 1);
    let id = body["id"].as_i64().unwrap();

    let (status, body) = send(&app, get(&format!("/api/profiles/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Léa");

    let (status, body) = send(
        &app,
        put_json(&format!("/api/profiles/{id}"), json!({ "name": "Léo" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Léo");
    assert_eq!(body["avatar"], "🦊");

    let (status, body) = send(&app, get("/api/profiles")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/profiles/{id}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, get(&format!("/api/profiles/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_profile_requires_name() {
    let app = test_app().await;
    let (status, _) = send(&app, post_json("/api/profiles", json!({ "name": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_not_found() {
    let app = test_app().await;
    let (status, _) = send(&app, get("/api/profiles/999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        post_json("/api/profiles/999/answers", json!({ "correct": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Answers, badges, sessions ────────────────────────────────────────

async fn create_profile(app: &Router, name: &str) -> i64 {
    let (status, body) = send(app, post_json("/api/profiles", json!({ "name": name }))).await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_record_answer_awards_xp_and_first_badge() {
    let app = test_app().await;
    let id = create_profile(&app, "Joueur").await;

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/profiles/{id}/answers"),
            json!({ "correct": true, "category": "Climat", "difficulty": "moyen" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["total_correct"], 1);
    assert_eq!(body["profile"]["current_streak"], 1);
    assert_eq!(body["profile"]["xp"], 10);

    // First correct answer unlocks the starter badge.
    let new_badges = body["new_badges"].as_array().unwrap();
    assert!(new_badges.iter().any(|b| b["id"] == "first-correct"));

    // Answering again does not re-award it.
    let (_, body) = send(
        &app,
        post_json(
            &format!("/api/profiles/{id}/answers"),
            json!({ "correct": true }),
        ),
    )
    .await;
    let new_badges = body["new_badges"].as_array().unwrap();
    assert!(!new_badges.iter().any(|b| b["id"] == "first-correct"));

    let (status, body) = send(&app, get(&format!("/api/profiles/{id}/badges"))).await;
    assert_eq!(status, StatusCode::OK);
    let unlocked = body.as_array().unwrap();
    assert_eq!(unlocked.len(), 1);
    assert_eq!(unlocked[0]["id"], "first-correct");
    assert!(unlocked[0]["name"].is_string());
}

#[tokio::test]
async fn test_wrong_answer_resets_streak() {
    let app = test_app().await;
    let id = create_profile(&app, "Joueur").await;

    for _ in 0..3 {
        send(
            &app,
            post_json(
                &format!("/api/profiles/{id}/answers"),
                json!({ "correct": true }),
            ),
        )
        .await;
    }
    let (_, body) = send(
        &app,
        post_json(
            &format!("/api/profiles/{id}/answers"),
            json!({ "correct": false }),
        ),
    )
    .await;
    assert_eq!(body["profile"]["current_streak"], 0);
    assert_eq!(body["profile"]["max_streak"], 3);
    assert_eq!(body["profile"]["total_questions"], 4);
}

#[tokio::test]
async fn test_custom_xp_award_levels_up() {
    let app = test_app().await;
    let id = create_profile(&app, "Grimpeur").await;

    let (_, body) = send(
        &app,
        post_json(
            &format!("/api/profiles/{id}/answers"),
            json!({ "correct": true, "xp": 250 }),
        ),
    )
    .await;
    assert_eq!(body["profile"]["xp"], 250);
    assert_eq!(body["profile"]["level"], 3);
}

#[tokio::test]
async fn test_sessions_and_stats() {
    let app = test_app().await;
    let id = create_profile(&app, "Joueur").await;

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/profiles/{id}/sessions"),
            json!({
                "mode": "chrono",
                "score": 8,
                "total_questions": 10,
                "max_streak": 5,
                "xp_gained": 80,
                "duration_seconds": 60,
                "categories": ["Climat", "Biodiversité"],
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["mode"], "chrono");
    assert_eq!(body["score"], 8);

    let (status, body) = send(&app, get(&format!("/api/profiles/{id}/sessions"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, get(&format!("/api/profiles/{id}/stats"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["id"], id);
    let modes = body["modes"].as_array().unwrap();
    assert_eq!(modes.len(), 1);
    assert_eq!(modes[0]["mode"], "chrono");
    assert_eq!(modes[0]["games_played"], 1);
}

#[tokio::test]
async fn test_unknown_session_mode_defaults_to_classic() {
    let app = test_app().await;
    let id = create_profile(&app, "Joueur").await;

    let (status, body) = send(
        &app,
        post_json(
            &format!("/api/profiles/{id}/sessions"),
            json!({
                "mode": "n-importe-quoi",
                "score": 1,
                "total_questions": 2,
                "max_streak": 1,
                "xp_gained": 10,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["mode"], "classic");
}

#[tokio::test]
async fn test_reset_progress() {
    let app = test_app().await;
    let id = create_profile(&app, "Joueur").await;

    send(
        &app,
        post_json(
            &format!("/api/profiles/{id}/answers"),
            json!({ "correct": true, "xp": 120 }),
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        post_json(&format!("/api/profiles/{id}/reset"), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["xp"], 0);
    assert_eq!(body["level"], 1);
    assert_eq!(body["name"], "Joueur");

    let (_, body) = send(&app, get(&format!("/api/profiles/{id}/badges"))).await;
    assert!(body.as_array().unwrap().is_empty());
}

// ── Metrics ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_metrics_endpoint() {
    greengpt_backend::metrics::register_metrics();
    let app = test_app().await;
    send(&app, post_json("/api/quiz-question", json!({}))).await;

    let response = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("greengpt_fallbacks_served_total"));
}
