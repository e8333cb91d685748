//! In-memory token store.
//!
//! The store owns the ordered token collection (most recent first) and is the
//! only place it is mutated. Id generation and the clock are injected so tests
//! can substitute deterministic implementations.

pub mod ids;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::models::token::{NewToken, StatusFilter, Token, TokenStatus, ValidationError};
use crate::view;

pub use ids::{Clock, FixedClock, IdGenerator, SequentialIds, SystemClock, UuidGenerator};

/// Attempts at drawing a fresh id before giving up.
const MAX_ID_ATTEMPTS: usize = 8;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("cannot move token {id} from {from} back to {to}")]
    InvalidTransition {
        id: String,
        from: TokenStatus,
        to: TokenStatus,
    },

    #[error("id generator produced {0} colliding ids in a row")]
    IdCollision(usize),
}

pub struct TokenStore {
    tokens: Vec<Token>,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::with_parts(Box::new(UuidGenerator), Box::new(SystemClock))
    }

    pub fn with_parts(ids: Box<dyn IdGenerator>, clock: Box<dyn Clock>) -> Self {
        Self {
            tokens: Vec::new(),
            ids,
            clock,
        }
    }

    /// Validates the input, then prepends a new Pending token.
    pub fn add_token(&mut self, input: NewToken) -> Result<Token, StoreError> {
        let item_name = input.validate()?;
        let id = self.fresh_id()?;

        let token = Token {
            id,
            item_name,
            price: input.price,
            status: TokenStatus::Pending,
            created_at: self.clock.now(),
        };
        self.tokens.insert(0, token.clone());
        tracing::info!(id = %token.id, item = %token.item_name, "token created");
        Ok(token)
    }

    /// Sets the status of `id`. Unknown ids are a no-op and yield `Ok(None)`.
    pub fn update_status(
        &mut self,
        id: &str,
        status: TokenStatus,
    ) -> Result<Option<Token>, StoreError> {
        let Some(token) = self.tokens.iter_mut().find(|t| t.id == id) else {
            tracing::debug!(id, "status update for unknown token ignored");
            return Ok(None);
        };

        if !token.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                from: token.status,
                to: status,
            });
        }

        token.status = status;
        tracing::info!(id, status = %status, "token status updated");
        Ok(Some(token.clone()))
    }

    /// Removes `id` and returns the removed token, or `None` if it was absent.
    pub fn delete_token(&mut self, id: &str) -> Option<Token> {
        let Some(pos) = self.tokens.iter().position(|t| t.id == id) else {
            tracing::debug!(id, "delete for unknown token ignored");
            return None;
        };
        let removed = self.tokens.remove(pos);
        tracing::info!(id, item = %removed.item_name, "token deleted");
        Some(removed)
    }

    pub fn get(&self, id: &str) -> Option<&Token> {
        self.tokens.iter().find(|t| t.id == id)
    }

    pub fn list(&self) -> &[Token] {
        &self.tokens
    }

    pub fn filtered(&self, search: &str, filter: StatusFilter) -> Vec<Token> {
        view::filter_tokens(&self.tokens, search, filter)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Loads the sample counter orders, newest first.
    pub fn seed_demo(&mut self) -> Result<usize, StoreError> {
        let now = self.clock.now();
        let mut samples: Vec<(&str, i64, TokenStatus, DateTime<Utc>)> = vec![
            ("Samosa Chaat", 60, TokenStatus::Served, now - Duration::minutes(5)),
            ("Vegetable Pulao", 90, TokenStatus::Pending, now - Duration::minutes(10)),
            ("Filter Coffee", 30, TokenStatus::Pending, now - Duration::minutes(2)),
            ("Gobi Manchurian", 120, TokenStatus::Served, now - Duration::minutes(25)),
            ("Paneer Butter Masala", 150, TokenStatus::Pending, now - Duration::minutes(1)),
        ];
        // insert oldest first so prepending leaves the newest on top
        samples.sort_by_key(|(_, _, _, created_at)| *created_at);

        for (name, price, status, created_at) in &samples {
            let input = NewToken::new(*name, Decimal::new(*price, 0));
            let item_name = input.validate()?;
            let token = Token {
                id: self.fresh_id()?,
                item_name,
                price: input.price,
                status: *status,
                created_at: *created_at,
            };
            self.tokens.insert(0, token);
        }
        tracing::info!(count = samples.len(), "seeded demo tokens");
        Ok(samples.len())
    }

    fn fresh_id(&self) -> Result<String, StoreError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.next_id();
            if self.get(&id).is_none() {
                return Ok(id);
            }
            tracing::warn!(id = %id, "id generator returned a duplicate, drawing again");
        }
        Err(StoreError::IdCollision(MAX_ID_ATTEMPTS))
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}
