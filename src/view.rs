//! Filtered view over the token collection.

use serde::{Deserialize, Serialize};

use crate::models::token::{StatusFilter, Token};

/// Query parameters accepted by the list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: StatusFilter,
}

#[derive(Debug, Serialize)]
pub struct TokenView {
    /// Tokens held by the store.
    pub total: usize,
    /// Tokens matching the query.
    pub count: usize,
    pub tokens: Vec<Token>,
}

/// Tokens matching `filter` whose item name contains `search`, ignoring case.
/// Store order is preserved.
pub fn filter_tokens<'a>(tokens: &'a [Token], search: &str, filter: StatusFilter) -> Vec<&'a Token> {
    let needle = search.to_lowercase();
    tokens
        .iter()
        .filter(|t| filter.matches(t.status))
        .filter(|t| t.item_name.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::token::TokenStatus;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn token(id: &str, name: &str, status: TokenStatus) -> Token {
        Token {
            id: id.into(),
            item_name: name.into(),
            price: Decimal::TEN,
            status,
            created_at: Utc::now(),
        }
    }

    fn sample() -> Vec<Token> {
        vec![
            token("1", "Tea", TokenStatus::Pending),
            token("2", "Coffee", TokenStatus::Served),
        ]
    }

    fn names(tokens: Vec<&Token>) -> Vec<&str> {
        tokens.into_iter().map(|t| t.item_name.as_str()).collect()
    }

    #[test]
    fn test_status_filter_selects_pending() {
        let tokens = sample();
        let hits = filter_tokens(&tokens, "", StatusFilter::Only(TokenStatus::Pending));
        assert_eq!(names(hits), vec!["Tea"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let tokens = sample();
        for term in ["cof", "COF", "CoF"] {
            let hits = filter_tokens(&tokens, term, StatusFilter::All);
            assert_eq!(names(hits), vec!["Coffee"], "term {:?}", term);
        }
    }

    #[test]
    fn test_all_and_empty_term_returns_everything_in_order() {
        let tokens = sample();
        let hits = filter_tokens(&tokens, "", StatusFilter::All);
        assert_eq!(names(hits), vec!["Tea", "Coffee"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let tokens = sample();
        let first: Vec<Token> = filter_tokens(&tokens, "e", StatusFilter::Only(TokenStatus::Served))
            .into_iter()
            .cloned()
            .collect();
        let second = filter_tokens(&first, "e", StatusFilter::Only(TokenStatus::Served));
        assert_eq!(second.len(), first.len());
        assert_eq!(names(second), vec!["Coffee"]);
    }

    #[test]
    fn test_filters_combine() {
        let mut tokens = sample();
        tokens.push(token("3", "Cold Coffee", TokenStatus::Pending));
        let hits = filter_tokens(&tokens, "coffee", StatusFilter::Only(TokenStatus::Pending));
        assert_eq!(names(hits), vec!["Cold Coffee"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let tokens = sample();
        assert!(filter_tokens(&tokens, "biryani", StatusFilter::All).is_empty());
    }

    #[test]
    fn test_query_defaults() {
        let q: TokenQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.search, "");
        assert_eq!(q.status, StatusFilter::All);
    }
}
