// HTTP API routes (question generation, answer checking, profiles, etc.)

use axum::{
    extract::{Json, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::categories::{find_category, random_prompt, CategoryRotation, QUIZ_CATEGORIES};
use crate::db::Database;
use crate::gamification::{earned_badges, xp_for_next_level, xp_progress, BADGES};
use crate::json_extract::{parse_safely, ParseError};
use crate::llm::{GenerationClient, GenerationError};
use crate::metrics;
use crate::modes::{
    question_prompts, verdict_prompt, GameMode, GAME_MODES, VERDICT_SYSTEM_PROMPT,
};
use crate::question::{
    decode_answer_check, decode_quiz_question, fixed_fallback, random_fallback, AnswerCheck,
    QuizQuestion, ValidationError,
};

/// Shown to the player when the model's verdict could not be decoded.
const RETRY_EXPLANATION: &str =
    "Impossible de vérifier la réponse pour le moment. Réessayez avec une autre question.";

// ── Request types ─────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct QuizQuestionRequest {
    pub mode: Option<String>,
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct GenerateStatementRequest {
    pub prompt: Option<String>,
}

#[derive(Deserialize)]
pub struct CheckAnswerRequest {
    pub statement: Option<String>,
    #[serde(alias = "userAnswer")]
    pub user_answer: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateProfileRequest {
    pub name: String,
    pub avatar: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Deserialize)]
pub struct RecordAnswerRequest {
    pub correct: bool,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub xp: Option<i64>,
}

#[derive(Deserialize)]
pub struct RecordSessionRequest {
    pub mode: Option<String>,
    pub score: i64,
    pub total_questions: i64,
    pub max_streak: i64,
    pub xp_gained: i64,
    pub duration_seconds: Option<i64>,
    pub categories: Option<Vec<String>>,
}

#[derive(Deserialize)]
pub struct SessionListParams {
    pub limit: Option<i64>,
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub generator: Option<Arc<GenerationClient>>,
    pub rotation: Arc<Mutex<CategoryRotation>>,
}

// ── Error helpers ─────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: &str) -> impl IntoResponse {
    (status, Json(json!({ "error": msg })))
}

fn internal_error(e: sqlx::Error) -> impl IntoResponse {
    tracing::error!("Database error: {e}");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

/// Everything that can go wrong between the prompt and a validated question.
#[derive(Debug)]
enum PipelineError {
    Generation(GenerationError),
    Parse(ParseError),
    Validation(ValidationError),
}

impl PipelineError {
    fn kind(&self) -> &'static str {
        match self {
            PipelineError::Generation(e) => e.kind(),
            PipelineError::Parse(e) => e.kind(),
            PipelineError::Validation(_) => "validation",
        }
    }

    fn record(&self) {
        match self {
            PipelineError::Generation(e) => {
                metrics::GENERATION_FAILURES_TOTAL
                    .with_label_values(&[e.kind()])
                    .inc();
            }
            PipelineError::Parse(e) => {
                metrics::PARSE_FAILURES_TOTAL
                    .with_label_values(&[e.kind()])
                    .inc();
            }
            PipelineError::Validation(_) => {
                metrics::PARSE_FAILURES_TOTAL
                    .with_label_values(&["validation"])
                    .inc();
            }
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(db: Arc<Database>, generator: Option<Arc<GenerationClient>>) -> Router {
    let state = AppState {
        db,
        generator,
        rotation: Arc::new(Mutex::new(CategoryRotation::new())),
    };

    Router::new()
        // Question generation
        .route("/api/quiz-question", post(quiz_question))
        .route("/api/generate-statement", post(generate_statement))
        .route("/api/check-answer", post(check_answer))
        // Static game data
        .route("/api/categories", get(list_categories))
        .route("/api/modes", get(list_modes))
        .route("/api/badges", get(list_badges))
        // Profiles
        .route("/api/profiles", get(list_profiles).post(create_profile))
        .route(
            "/api/profiles/{id}",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
        .route("/api/profiles/{id}/answers", post(record_answer))
        .route("/api/profiles/{id}/stats", get(get_profile_stats))
        .route(
            "/api/profiles/{id}/sessions",
            get(list_sessions).post(record_session),
        )
        .route("/api/profiles/{id}/badges", get(list_profile_badges))
        .route("/api/profiles/{id}/reset", post(reset_progress))
        // Observability
        .route("/health", get(health))
        .route("/metrics", get(serve_metrics))
        .with_state(state)
}

// ── Question generation handlers ──────────────────────────────────────

/// Run the full text-to-question pipeline: prompt the model, recover a
/// JSON candidate from the reply, and validate its shape.
async fn generate_question(
    generator: &GenerationClient,
    system: &str,
    user: &str,
) -> Result<QuizQuestion, PipelineError> {
    let start = Instant::now();
    let reply = generator
        .generate(system, user, 0.8, 300)
        .await
        .map_err(PipelineError::Generation)?;
    metrics::GENERATION_DURATION_SECONDS
        .with_label_values(&["quiz-question"])
        .observe(start.elapsed().as_secs_f64());

    let value: Value = parse_safely(&reply).map_err(PipelineError::Parse)?;
    decode_quiz_question(&value).map_err(PipelineError::Validation)
}

async fn quiz_question(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<QuizQuestionRequest>>,
) -> impl IntoResponse {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let mode = req
        .mode
        .as_deref()
        .map(GameMode::from_name)
        .unwrap_or_default();
    let question_number: u32 = headers
        .get("x-question-number")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);

    // Challenge games pin a category from the request; classic games
    // rotate through the catalog to keep sessions varied, drawing the
    // user prompt from the category's own prompt pool.
    let mut prompt_override = None;
    let category = match (mode, req.category.as_deref()) {
        (GameMode::Challenge, Some(name)) => find_category(name),
        (GameMode::Classic, _) => {
            let mut rotation = state.rotation.lock().await;
            let mut rng = rand::thread_rng();
            let cat = rotation.next(&mut rng);
            prompt_override = Some(random_prompt(cat, &mut rng).to_string());
            Some(cat)
        }
        _ => None,
    };

    let generated = match &state.generator {
        Some(generator) => {
            let (system, mut user) = question_prompts(mode, category, question_number);
            if let Some(p) = prompt_override {
                user = p;
            }
            generate_question(generator, &system, &user).await
        }
        None => Err(PipelineError::Generation(GenerationError::Auth)),
    };

    let question = match generated {
        Ok(question) => {
            metrics::QUESTIONS_GENERATED_TOTAL
                .with_label_values(&[mode.as_str()])
                .inc();
            question
        }
        Err(e) => {
            tracing::warn!(kind = e.kind(), "question generation failed, serving fallback");
            e.record();
            metrics::FALLBACKS_SERVED_TOTAL.inc();
            random_fallback()
        }
    };

    (StatusCode::OK, Json(json!(question))).into_response()
}

async fn generate_statement(
    State(state): State<AppState>,
    body: Option<Json<GenerateStatementRequest>>,
) -> impl IntoResponse {
    let prompt = match body.and_then(|Json(r)| r.prompt).filter(|p| !p.trim().is_empty()) {
        Some(p) => p,
        None => return json_error(StatusCode::BAD_REQUEST, "prompt is required").into_response(),
    };

    let generated = match &state.generator {
        Some(generator) => {
            let (system, _) = question_prompts(GameMode::Classic, None, 1);
            generate_question(generator, &system, &prompt).await
        }
        None => Err(PipelineError::Generation(GenerationError::Auth)),
    };

    let question = match generated {
        Ok(question) => question,
        Err(e) => {
            tracing::warn!(kind = e.kind(), "statement generation failed, serving fallback");
            e.record();
            metrics::FALLBACKS_SERVED_TOTAL.inc();
            fixed_fallback()
        }
    };

    (StatusCode::OK, Json(json!(question))).into_response()
}

async fn check_answer(
    State(state): State<AppState>,
    body: Option<Json<CheckAnswerRequest>>,
) -> impl IntoResponse {
    let generator = match &state.generator {
        Some(g) => g.clone(),
        None => {
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Answer checking is not configured",
            )
            .into_response()
        }
    };

    let (statement, user_answer) = match body.map(|Json(r)| r) {
        Some(CheckAnswerRequest {
            statement: Some(statement),
            user_answer: Some(user_answer),
        }) if !statement.trim().is_empty() => (statement, user_answer),
        _ => {
            return json_error(
                StatusCode::BAD_REQUEST,
                "statement and user_answer are required",
            )
            .into_response()
        }
    };

    let start = Instant::now();
    let reply = match generator
        .generate(VERDICT_SYSTEM_PROMPT, &verdict_prompt(&statement, user_answer), 0.3, 200)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(kind = e.kind(), "answer check generation failed: {e}");
            metrics::GENERATION_FAILURES_TOTAL
                .with_label_values(&[e.kind()])
                .inc();
            return json_error(e.status_code(), &e.to_string()).into_response();
        }
    };
    metrics::GENERATION_DURATION_SECONDS
        .with_label_values(&["check-answer"])
        .observe(start.elapsed().as_secs_f64());

    // A garbled verdict is not the player's fault: answer with a retry
    // message instead of an error status.
    let verdict = parse_safely::<Value>(&reply)
        .map_err(|e| {
            metrics::PARSE_FAILURES_TOTAL
                .with_label_values(&[e.kind()])
                .inc();
            tracing::warn!(kind = e.kind(), "unparseable verdict");
        })
        .ok()
        .and_then(|value| decode_answer_check(&value).ok())
        .unwrap_or(AnswerCheck {
            correct: false,
            explanation: RETRY_EXPLANATION.to_string(),
        });

    let outcome = if verdict.explanation == RETRY_EXPLANATION {
        "retry"
    } else if verdict.correct {
        "correct"
    } else {
        "incorrect"
    };
    metrics::ANSWERS_CHECKED_TOTAL
        .with_label_values(&[outcome])
        .inc();

    (StatusCode::OK, Json(json!(verdict))).into_response()
}

// ── Static game data handlers ─────────────────────────────────────────

async fn list_categories() -> impl IntoResponse {
    Json(json!(QUIZ_CATEGORIES))
}

async fn list_modes() -> impl IntoResponse {
    Json(json!(GAME_MODES))
}

async fn list_badges() -> impl IntoResponse {
    let badges: Vec<Value> = BADGES
        .iter()
        .map(|b| {
            json!({
                "id": b.id,
                "name": b.name,
                "description": b.description,
                "icon": b.icon,
            })
        })
        .collect();
    Json(json!(badges))
}

// ── Profile handlers ──────────────────────────────────────────────────

async fn list_profiles(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.list_profiles().await {
        Ok(profiles) => (StatusCode::OK, Json(json!(profiles))).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn create_profile(
    State(state): State<AppState>,
    Json(req): Json<CreateProfileRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "name is required").into_response();
    }
    let avatar = req.avatar.as_deref().unwrap_or("🌱");
    match state.db.create_profile(req.name.trim(), avatar).await {
        Ok(profile) => {
            metrics::PROFILES_CREATED_TOTAL.inc();
            (StatusCode::CREATED, Json(json!(profile))).into_response()
        }
        Err(e) => internal_error(e).into_response(),
    }
}

async fn get_profile(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.db.get_profile(id).await {
        Ok(Some(profile)) => (StatusCode::OK, Json(json!(profile))).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Profile not found").into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return json_error(StatusCode::BAD_REQUEST, "name must not be empty").into_response();
    }
    match state
        .db
        .update_profile(id, req.name.as_deref(), req.avatar.as_deref())
        .await
    {
        Ok(Some(profile)) => (StatusCode::OK, Json(json!(profile))).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Profile not found").into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn delete_profile(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.db.delete_profile(id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => json_error(StatusCode::NOT_FOUND, "Profile not found").into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// Record one answered question; answers newly earned badges alongside
/// the updated profile.
async fn record_answer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<RecordAnswerRequest>,
) -> impl IntoResponse {
    let category = req
        .category
        .as_deref()
        .unwrap_or(crate::question::DEFAULT_CATEGORY);
    let difficulty = req.difficulty.as_deref().unwrap_or("moyen");
    let xp = req.xp.unwrap_or(if req.correct { 10 } else { 0 });

    let profile = match state
        .db
        .record_answer(id, req.correct, category, difficulty, xp)
        .await
    {
        Ok(Some(profile)) => profile,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "Profile not found").into_response(),
        Err(e) => return internal_error(e).into_response(),
    };

    let stats = profile.stats();
    let mut new_badges = Vec::new();
    for badge in earned_badges(&stats) {
        match state.db.unlock_badge(id, badge.id).await {
            Ok(true) => {
                metrics::BADGES_UNLOCKED_TOTAL
                    .with_label_values(&[badge.id])
                    .inc();
                new_badges.push(json!({
                    "id": badge.id,
                    "name": badge.name,
                    "description": badge.description,
                    "icon": badge.icon,
                }));
            }
            Ok(false) => {}
            Err(e) => return internal_error(e).into_response(),
        }
    }

    (
        StatusCode::OK,
        Json(json!({ "profile": profile, "new_badges": new_badges })),
    )
        .into_response()
}

async fn get_profile_stats(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let profile = match state.db.get_profile(id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "Profile not found").into_response(),
        Err(e) => return internal_error(e).into_response(),
    };

    let modes = match state.db.mode_stats(id).await {
        Ok(rows) => rows,
        Err(e) => return internal_error(e).into_response(),
    };
    let categories = match state.db.category_stats(id).await {
        Ok(rows) => rows,
        Err(e) => return internal_error(e).into_response(),
    };
    let difficulties = match state.db.difficulty_stats(id).await {
        Ok(rows) => rows,
        Err(e) => return internal_error(e).into_response(),
    };

    (
        StatusCode::OK,
        Json(json!({
            "profile": profile,
            "modes": modes,
            "categories": categories,
            "difficulties": difficulties,
            "xp_for_next_level": xp_for_next_level(profile.level),
            "xp_progress": xp_progress(profile.xp),
        })),
    )
        .into_response()
}

async fn record_session(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<RecordSessionRequest>,
) -> impl IntoResponse {
    let mode = req
        .mode
        .as_deref()
        .map(GameMode::from_name)
        .unwrap_or_default();
    let categories = serde_json::to_string(&req.categories.unwrap_or_default())
        .unwrap_or_else(|_| "[]".to_string());

    match state
        .db
        .record_session(
            id,
            mode.as_str(),
            req.score,
            req.total_questions,
            req.max_streak,
            req.xp_gained,
            req.duration_seconds.unwrap_or(0),
            &categories,
        )
        .await
    {
        Ok(Some(session)) => (StatusCode::CREATED, Json(json!(session))).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Profile not found").into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn list_sessions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<SessionListParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(50).clamp(1, 50);
    match state.db.recent_sessions(id, limit).await {
        Ok(sessions) => (StatusCode::OK, Json(json!(sessions))).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

async fn list_profile_badges(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.db.list_unlocked_badges(id).await {
        Ok(unlocked) => {
            let badges: Vec<Value> = unlocked
                .iter()
                .map(|u| {
                    let detail = crate::gamification::find_badge(&u.badge_id);
                    json!({
                        "id": u.badge_id,
                        "unlocked_at": u.unlocked_at,
                        "name": detail.map(|b| b.name),
                        "description": detail.map(|b| b.description),
                        "icon": detail.map(|b| b.icon),
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!(badges))).into_response()
        }
        Err(e) => internal_error(e).into_response(),
    }
}

async fn reset_progress(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.db.reset_progress(id).await {
        Ok(true) => match state.db.get_profile(id).await {
            Ok(Some(profile)) => (StatusCode::OK, Json(json!(profile))).into_response(),
            Ok(None) => json_error(StatusCode::NOT_FOUND, "Profile not found").into_response(),
            Err(e) => internal_error(e).into_response(),
        },
        Ok(false) => json_error(StatusCode::NOT_FOUND, "Profile not found").into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

// ── Observability handlers ────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "greengpt-backend" }))
}

async fn serve_metrics() -> impl IntoResponse {
    metrics::gather_metrics()
}
