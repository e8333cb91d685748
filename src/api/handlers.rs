use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

use super::extract::AppJson;
use crate::errors::AppError;
use crate::models::token::{NewToken, Token, TokenStatus};
use crate::notification::TokenEvent;
use crate::suggest::{SuggestionOutcome, SuggestionState};
use crate::view::{TokenQuery, TokenView};
use crate::AppState;

// ── Request DTOs ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TokenStatus,
}

// ── Token Handlers ────────────────────────────────────────────

/// GET /api/v1/tokens — filtered view, newest first
pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Json<TokenView> {
    let store = state.store.read().await;
    let tokens = store.filtered(&query.search, query.status);

    Json(TokenView {
        total: store.len(),
        count: tokens.len(),
        tokens,
    })
}

/// POST /api/v1/tokens — issue a new Pending token
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    AppJson(payload): AppJson<NewToken>,
) -> Result<(StatusCode, Json<Token>), AppError> {
    let token = state.store.write().await.add_token(payload)?;

    state.events.publish(TokenEvent::created(&token));
    // the form resets on submit, so stale suggestions go with it
    state.suggestion_tracker.clear();

    Ok((StatusCode::CREATED, Json(token)))
}

/// GET /api/v1/tokens/:id
pub async fn get_token(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Token>, AppError> {
    let store = state.store.read().await;
    let token = store.get(&id).cloned().ok_or(AppError::TokenNotFound)?;
    Ok(Json(token))
}

/// PATCH /api/v1/tokens/:id/status — unknown ids are a silent no-op
pub async fn update_token_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateStatusRequest>,
) -> Result<StatusCode, AppError> {
    let updated = state
        .store
        .write()
        .await
        .update_status(&id, payload.status)?;

    if let Some(token) = updated {
        state.events.publish(TokenEvent::updated(&token));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/tokens/:id — unknown ids are a silent no-op
pub async fn delete_token(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    let removed = state.store.write().await.delete_token(&id);

    if let Some(token) = removed {
        state.events.publish(TokenEvent::deleted(&token));
    }
    StatusCode::NO_CONTENT
}

/// GET /api/v1/tokens/events — live feed of store notifications (SSE)
pub async fn token_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.events.subscribe()).map(|msg| {
        let event = match msg {
            Ok(event) => {
                let data = serde_json::to_string(&event).unwrap_or_default();
                Event::default().event(event.kind.as_str()).data(data)
            }
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event listener lagged behind");
                Event::default().comment(format!("skipped {} events", skipped))
            }
        };
        Ok(event)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

// ── Suggestion Handlers ───────────────────────────────────────

/// POST /api/v1/suggestions — ask the model; falls back to defaults on failure
pub async fn request_suggestions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuggestionOutcome>, AppError> {
    let pending = state
        .suggestion_tracker
        .try_begin()
        .ok_or(AppError::SuggestionInFlight)?;

    let outcome = state.suggestions.suggest_now().await;
    pending.finish(outcome.clone());

    Ok(Json(outcome))
}

/// GET /api/v1/suggestions/state — current tracker state
pub async fn suggestion_state(State(state): State<Arc<AppState>>) -> Json<SuggestionState> {
    Json(state.suggestion_tracker.current())
}

/// DELETE /api/v1/suggestions — discard shown suggestions or cancel a pending request
pub async fn clear_suggestions(State(state): State<Arc<AppState>>) -> StatusCode {
    state.suggestion_tracker.clear();
    StatusCode::NO_CONTENT
}
