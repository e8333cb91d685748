//! Canteen token service library, shared by the binary and the integration
//! tests in `tests/`.

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod models;
pub mod notification;
pub mod store;
pub mod suggest;
pub mod view;

use tokio::sync::RwLock;

use notification::EventBus;
use store::TokenStore;
use suggest::{SuggestionService, SuggestionTracker};

/// Shared application state passed to handlers.
pub struct AppState {
    /// The only owner of the token collection; every mutation takes the write lock.
    pub store: RwLock<TokenStore>,
    pub events: EventBus,
    pub suggestions: SuggestionService,
    pub suggestion_tracker: SuggestionTracker,
    pub config: config::Config,
}

impl AppState {
    pub fn new(config: config::Config, store: TokenStore, suggestions: SuggestionService) -> Self {
        Self {
            store: RwLock::new(store),
            events: EventBus::new(),
            suggestions,
            suggestion_tracker: SuggestionTracker::new(),
            config,
        }
    }
}
