// HTTP boundary
//
// Thin axum wrapper over the agent: JSON in, JSON out, permissive CORS.
// No decision logic lives here; `Agent::answer` is total, so the chat
// route cannot fail for any well-formed request body.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::info;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use crate::atoms::error::AgentResult;
use crate::atoms::types::{ChatQuestion, ChatResponse};
use crate::engine::agent::Agent;

pub fn router(agent: Arc<Agent>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        .layer(cors)
        .with_state(agent)
}

pub async fn serve(agent: Arc<Agent>, addr: &str) -> AgentResult<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("[server] listening on http://{addr}");
    axum::serve(listener, router(agent)).await?;
    Ok(())
}

async fn chat(State(agent): State<Arc<Agent>>, Json(request): Json<ChatQuestion>) -> Json<ChatResponse> {
    info!("[server] question: {:?}", preview(&request.question));
    Json(agent.answer(&request.question).await)
}

async fn health(State(agent): State<Arc<Agent>>) -> Json<Value> {
    Json(json!({ "status": "ok", "passengers": agent.passenger_count() }))
}

/// First 120 chars of the question for the request log.
fn preview(question: &str) -> String {
    question.chars().take(120).collect()
}
