//! HTTP server implementation using Axum.
//!
//! Clients are identified by the `session_id` cookie. A request without a
//! known cookie gets a fresh session and a `Set-Cookie` header carrying it.

use crate::action::{Action, ActionKind};
use crate::config::SESSION_COOKIE;
use crate::error::Error;
use crate::state::AppState;
use crate::store::SessionHandle;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct ValueResponse {
    message: &'static str,
    value: f64,
}

#[derive(Serialize)]
struct HistoryResponse {
    message: &'static str,
    actions: Vec<Action>,
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // Direct arithmetic on the live accumulator
        .route("/add/:num", get(add))
        .route("/sub/:num", get(sub))
        .route("/multiply/:num", get(multiply))
        .route("/divide/:num", get(divide))
        .route("/clear", get(clear))
        .route("/currentValue", get(current_value))
        // Logged history and replay
        .route("/track/:action/:num", get(track))
        .route("/my_action_history", get(history))
        .route("/compute", get(compute))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server on the given port until `shutdown` resolves.
pub async fn run_server(
    port: u16,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Starting HTTP server on {}", addr);
    serve(listener, state, shutdown).await
}

pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health() -> &'static str {
    "OK"
}

async fn root(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (_, minted) = resolve(&state, &headers).await;
    respond(&state, minted, Ok(Json(MessageResponse { message: "Server is working" })))
}

async fn add(State(state): State<AppState>, headers: HeaderMap, Path(num): Path<String>) -> Response {
    operate(&state, &headers, ActionKind::Add, &num).await
}

async fn sub(State(state): State<AppState>, headers: HeaderMap, Path(num): Path<String>) -> Response {
    operate(&state, &headers, ActionKind::Subtract, &num).await
}

async fn multiply(State(state): State<AppState>, headers: HeaderMap, Path(num): Path<String>) -> Response {
    operate(&state, &headers, ActionKind::Multiply, &num).await
}

async fn divide(State(state): State<AppState>, headers: HeaderMap, Path(num): Path<String>) -> Response {
    operate(&state, &headers, ActionKind::Divide, &num).await
}

async fn clear(State(state): State<AppState>, headers: HeaderMap) -> Response {
    operate(&state, &headers, ActionKind::Clear, "0").await
}

async fn current_value(State(state): State<AppState>, headers: HeaderMap) -> Response {
    operate(&state, &headers, ActionKind::GetCurrentValue, "").await
}

async fn track(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((action, num)): Path<(String, String)>,
) -> Response {
    let (session, minted) = resolve(&state, &headers).await;
    let result = match action.parse::<ActionKind>() {
        Ok(kind) => state.store.log_action(&session, kind, &num).await,
        Err(e) => Err(e),
    };
    respond(
        &state,
        minted,
        result.map(|()| Json(MessageResponse { message: "Action logged" })),
    )
}

async fn history(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (session, minted) = resolve(&state, &headers).await;
    let result = state.store.history(&session).await.map(|actions| {
        let message = if actions.is_empty() {
            "No history was found"
        } else {
            "History found"
        };
        Json(HistoryResponse { message, actions })
    });
    respond(&state, minted, result)
}

async fn compute(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (session, minted) = resolve(&state, &headers).await;
    let result = state.store.compute(&session).await.map(Json);
    respond(&state, minted, result)
}

async fn operate(state: &AppState, headers: &HeaderMap, kind: ActionKind, operand: &str) -> Response {
    let (session, minted) = resolve(state, headers).await;
    let result = state
        .store
        .apply_operation(&session, kind, operand)
        .await
        .map(|value| {
            Json(ValueResponse {
                message: "Operation successful",
                value,
            })
        });
    respond(state, minted, result)
}

/// Resolves the caller's session. Returns the new identifier when one was minted.
async fn resolve(state: &AppState, headers: &HeaderMap) -> (SessionHandle, Option<String>) {
    let (session, is_new) = state.store.resolve(session_cookie(headers)).await;
    let minted = if is_new {
        Some(session.lock().await.id.clone())
    } else {
        None
    };
    (session, minted)
}

fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

fn respond<T: IntoResponse>(state: &AppState, minted: Option<String>, result: Result<T, Error>) -> Response {
    let mut response = match result {
        Ok(body) => body.into_response(),
        Err(e) => error_response(e),
    };

    if let Some(id) = minted {
        let cookie = format!(
            "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE,
            id,
            state.store.config().ttl_secs()
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => error!(error = %e, "Failed to build session cookie"),
        }
    }
    response
}

fn error_response(e: Error) -> Response {
    let status = match &e {
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        Error::SessionNotFound(_) => StatusCode::NOT_FOUND,
        _ => {
            error!(error = %e, "Internal consistency error");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(ErrorResponse { detail: e.to_string() })).into_response()
}
