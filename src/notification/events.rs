use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use crate::models::token::Token;

/// Buffered events per subscriber before slow readers start lagging.
const EVENT_BUFFER: usize = 64;

// ── Token Event Types ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenEventKind {
    Created,
    Updated,
    Deleted,
}

impl TokenEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenEventKind::Created => "created",
            TokenEventKind::Updated => "updated",
            TokenEventKind::Deleted => "deleted",
        }
    }
}

/// User-facing notice emitted after a store operation took effect.
#[derive(Debug, Clone, Serialize)]
pub struct TokenEvent {
    pub kind: TokenEventKind,
    /// ISO-8601 timestamp of when the event occurred.
    pub timestamp: String,
    pub title: String,
    pub description: String,
    pub token: Token,
}

impl TokenEvent {
    pub fn created(token: &Token) -> Self {
        Self {
            kind: TokenEventKind::Created,
            timestamp: chrono::Utc::now().to_rfc3339(),
            title: "Token Generated".to_string(),
            description: format!("Token for {} has been created.", token.item_name),
            token: token.clone(),
        }
    }

    pub fn updated(token: &Token) -> Self {
        Self {
            kind: TokenEventKind::Updated,
            timestamp: chrono::Utc::now().to_rfc3339(),
            title: "Token Updated".to_string(),
            description: format!("An order has been marked as {}.", token.status),
            token: token.clone(),
        }
    }

    pub fn deleted(token: &Token) -> Self {
        Self {
            kind: TokenEventKind::Deleted,
            timestamp: chrono::Utc::now().to_rfc3339(),
            title: "Token Deleted".to_string(),
            description: format!("Token for {} has been removed.", token.item_name),
            token: token.clone(),
        }
    }
}

// ── Event Bus ─────────────────────────────────────────────────

/// Fan-out of token events to any number of live listeners.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TokenEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    /// Publishing with nobody listening is not an error.
    pub fn publish(&self, event: TokenEvent) {
        let kind = event.kind;
        match self.tx.send(event) {
            Ok(receivers) => debug!(?kind, receivers, "token event published"),
            Err(_) => debug!(?kind, "token event dropped, no listeners"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TokenEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
