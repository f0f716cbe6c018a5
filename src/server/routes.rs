use std::collections::HashMap;
use std::convert::Infallible;
use std::path::PathBuf;

use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::Stream;
use hyper::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use super::AppState;
use super::middleware;
use crate::harness::controller::RunError;
use crate::notices::{CapabilityNotice, VoiceNotice};

pub fn build_router(state: AppState, ui_dir: Option<PathBuf>) -> Router {
    let mut router = Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .route("/status", get(status))
        .route("/run", post(trigger_run))
        .route("/output", get(read_output))
        .route("/editor", get(get_editor).put(set_editor))
        .route("/editor/insert", post(insert_entry))
        .route("/catalog", get(list_snippets))
        .route("/catalog/templates", get(list_templates))
        .route("/catalog/assistants", get(list_assistants))
        .route("/events", get(list_events))
        .route("/events/stream", get(stream_events))
        .route("/voice", post(voice_notice))
        .route("/notices", post(capability_notice))
        .route("/backend/health", get(backend_health))
        .route("/blueprint", post(generate_blueprint))
        .route("/sentiment", post(predict_sentiment))
        .fallback(not_found)
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::strip_trailing_slash))
        .layer(CorsLayer::permissive());

    if let Some(dir) = ui_dir {
        router = router.nest_service("/ui", ServeDir::new(dir));
    }
    router
}

async fn not_found(req: axum::extract::Request) -> impl IntoResponse {
    tracing::warn!("unhandled path: {}", req.uri());
    (StatusCode::NOT_FOUND, "Not Found")
}

// --- Harness surfaces ---

async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let telemetry = state.controller.telemetry_snapshot().await;
    let indicators = state.controller.indicators().await;
    Json(json!({
        "telemetry": telemetry,
        "indicators": indicators,
    }))
}

#[tracing::instrument(skip_all)]
async fn trigger_run(State(state): State<AppState>) -> Response {
    let source = state.workspace.snapshot().await;
    match state.controller.trigger(source).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(RunError::Busy) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "a run is already in progress" })),
        )
            .into_response(),
    }
}

async fn read_output(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "output": state.controller.output() }))
}

async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let entries = match params.get("limit").and_then(|l| l.parse::<usize>().ok()) {
        Some(limit) => state.controller.events().recent(limit).await,
        None => state.controller.events().entries().await,
    };
    Json(json!({ "events": entries }))
}

async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.controller.events().subscribe();
    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(entry) => {
                    let data = serde_json::to_string(&entry).unwrap_or_default();
                    yield Ok(Event::default().event("log").data(data));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event stream lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };
    Sse::new(stream)
}

// --- Editor & catalog ---

#[derive(Deserialize)]
struct EditorUpdate {
    source: String,
}

async fn get_editor(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "source": state.workspace.snapshot().await }))
}

async fn set_editor(
    State(state): State<AppState>,
    Json(body): Json<EditorUpdate>,
) -> StatusCode {
    if let Err(e) = state.workspace.set_source(body.source).await {
        tracing::warn!(error = %format!("{e:#}"), "failed to persist draft");
        state.controller.events().record("Draft save failed").await;
    }
    StatusCode::NO_CONTENT
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum EntryKind {
    Snippet,
    Template,
    Assistant,
}

#[derive(Deserialize)]
struct InsertRequest {
    kind: EntryKind,
    title: String,
}

async fn insert_entry(
    State(state): State<AppState>,
    Json(body): Json<InsertRequest>,
) -> Response {
    let (source, message) = match body.kind {
        EntryKind::Snippet => match state.catalog.snippet(&body.title) {
            Some(card) => (
                card.source.clone(),
                format!("Added {} snippet to editor", card.title),
            ),
            None => return unknown_entry(&body.title),
        },
        EntryKind::Template => match state.catalog.template(&body.title) {
            Some(template) => (
                template.source.clone(),
                format!("Loaded {} template", template.title),
            ),
            None => return unknown_entry(&body.title),
        },
        EntryKind::Assistant => match state.catalog.assistant(&body.title) {
            Some(assistant) => (
                assistant.source.clone(),
                format!("Added {} call to editor", assistant.title),
            ),
            None => return unknown_entry(&body.title),
        },
    };

    if let Err(e) = state.workspace.set_source(source).await {
        tracing::warn!(error = %format!("{e:#}"), "failed to persist draft");
        state.controller.events().record("Draft save failed").await;
    }
    state.controller.events().record(message).await;
    StatusCode::NO_CONTENT.into_response()
}

fn unknown_entry(title: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("no catalog entry titled '{title}'") })),
    )
        .into_response()
}

async fn list_snippets(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let query = params.get("q").map(String::as_str).unwrap_or("");
    Json(json!({ "snippets": state.catalog.search(query) }))
}

async fn list_templates(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "templates": state.catalog.templates() }))
}

async fn list_assistants(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "assistants": state.catalog.assistants() }))
}

// --- External collaborators ---

async fn voice_notice(
    State(state): State<AppState>,
    Json(notice): Json<VoiceNotice>,
) -> StatusCode {
    if let VoiceNotice::Transcript { text } = &notice {
        if let Err(e) = state.workspace.set_transcript(text.clone()).await {
            tracing::warn!(error = %format!("{e:#}"), "failed to persist transcript draft");
        }
    }
    state.controller.events().record(notice.message()).await;
    StatusCode::ACCEPTED
}

async fn capability_notice(
    State(state): State<AppState>,
    Json(notice): Json<CapabilityNotice>,
) -> StatusCode {
    state.controller.events().record(notice.message()).await;
    StatusCode::ACCEPTED
}

// --- Backend proxy ---

async fn backend_health(State(state): State<AppState>) -> Response {
    match state.backend.health().await {
        Ok(health) => {
            state
                .controller
                .events()
                .record("Backend responded to health probe")
                .await;
            (StatusCode::OK, Json(health)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "backend health probe failed");
            state
                .controller
                .events()
                .record("Backend health probe failed")
                .await;
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "backend unreachable" })),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
struct BlueprintRequest {
    idea: Option<String>,
}

async fn generate_blueprint(
    State(state): State<AppState>,
    Json(body): Json<BlueprintRequest>,
) -> Response {
    // Fall back to the last voice transcript, the original editor behavior.
    let idea = match body.idea.filter(|idea| !idea.trim().is_empty()) {
        Some(idea) => idea,
        None => state.workspace.last_transcript().await.unwrap_or_default(),
    };

    match state.backend.blueprint(&idea).await {
        Ok(blueprint) => {
            state
                .controller
                .events()
                .record("Blueprint generated from backend")
                .await;
            (StatusCode::OK, Json(blueprint)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "blueprint request failed");
            state
                .controller
                .events()
                .record("Blueprint request failed")
                .await;
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "blueprint generation failed" })),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
struct SentimentRequest {
    text: String,
}

async fn predict_sentiment(
    State(state): State<AppState>,
    Json(body): Json<SentimentRequest>,
) -> Response {
    match state.backend.sentiment(&body.text).await {
        Ok(sentiment) => (StatusCode::OK, Json(sentiment)).into_response(),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "sentiment request failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "sentiment scoring failed" })),
            )
                .into_response()
        }
    }
}
