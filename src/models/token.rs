//! Token model: a single counter order (item, price, status, timestamp).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Minimum number of characters in an item name.
pub const MIN_ITEM_NAME_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenStatus {
    Pending,
    Served,
}

impl TokenStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenStatus::Pending => "Pending",
            TokenStatus::Served => "Served",
        }
    }

    /// Status only moves forward: Pending -> Served. Same-state is allowed.
    pub fn can_transition_to(&self, next: TokenStatus) -> bool {
        !matches!((self, next), (TokenStatus::Served, TokenStatus::Pending))
    }
}

impl std::fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TokenStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(TokenStatus::Pending),
            "served" => Ok(TokenStatus::Served),
            other => Err(format!("unknown token status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: String,
    pub item_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub status: TokenStatus,
    pub created_at: DateTime<Utc>,
}

/// Creation input, validated before the store is touched.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewToken {
    pub item_name: String,
    #[serde(deserialize_with = "numeric_price")]
    pub price: Decimal,
}

/// Accepts JSON numbers only; `"12"` is rejected.
fn numeric_price<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    let raw = f64::deserialize(deserializer)?;
    Decimal::try_from(raw).map_err(serde::de::Error::custom)
}

impl NewToken {
    pub fn new(item_name: impl Into<String>, price: Decimal) -> Self {
        Self {
            item_name: item_name.into(),
            price,
        }
    }

    /// Checks the creation rules and returns the normalised item name.
    pub fn validate(&self) -> Result<String, ValidationError> {
        let name = self.item_name.trim();
        if name.chars().count() < MIN_ITEM_NAME_CHARS {
            return Err(ValidationError::ItemNameTooShort);
        }
        if self.price <= Decimal::ZERO {
            return Err(ValidationError::PriceNotPositive);
        }
        Ok(name.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Item name must be at least 2 characters.")]
    ItemNameTooShort,

    #[error("Price must be a positive number.")]
    PriceNotPositive,
}

/// Status filter for the view layer: `all` or one concrete status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TokenStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: TokenStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        trimmed.parse().map(StatusFilter::Only)
    }
}

impl<'de> Deserialize<'de> for StatusFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_minimal_input() {
        let input = NewToken::new("Tea", Decimal::new(10, 0));
        assert_eq!(input.validate().unwrap(), "Tea");
    }

    #[test]
    fn test_validate_trims_item_name() {
        let input = NewToken::new("  Masala Dosa ", Decimal::new(80, 0));
        assert_eq!(input.validate().unwrap(), "Masala Dosa");
    }

    #[test]
    fn test_validate_rejects_short_names() {
        for name in ["", "x", "  y  "] {
            let input = NewToken::new(name, Decimal::ONE);
            assert_eq!(input.validate(), Err(ValidationError::ItemNameTooShort), "{:?}", name);
        }
    }

    #[test]
    fn test_validate_counts_characters_not_bytes() {
        // two characters, six bytes
        let input = NewToken::new("चा", Decimal::ONE);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive_price() {
        let zero = NewToken::new("Idli", Decimal::ZERO);
        let negative = NewToken::new("Idli", Decimal::new(-5, 0));
        assert_eq!(zero.validate(), Err(ValidationError::PriceNotPositive));
        assert_eq!(negative.validate(), Err(ValidationError::PriceNotPositive));
    }

    #[test]
    fn test_status_transitions_are_one_way() {
        assert!(TokenStatus::Pending.can_transition_to(TokenStatus::Served));
        assert!(TokenStatus::Pending.can_transition_to(TokenStatus::Pending));
        assert!(TokenStatus::Served.can_transition_to(TokenStatus::Served));
        assert!(!TokenStatus::Served.can_transition_to(TokenStatus::Pending));
    }

    #[test]
    fn test_status_filter_parsing() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!("".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "served".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(TokenStatus::Served)
        );
        assert_eq!(
            "Pending".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(TokenStatus::Pending)
        );
        assert!("cooking".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn test_token_serializes_camel_case() {
        let token = Token {
            id: "abc".into(),
            item_name: "Filter Coffee".into(),
            price: Decimal::new(30, 0),
            status: TokenStatus::Pending,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(json["itemName"], "Filter Coffee");
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["price"], 30.0);
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_new_token_accepts_numeric_price() {
        let input: NewToken =
            serde_json::from_str(r#"{"itemName":"Veg Biryani","price":90.5}"#).unwrap();
        assert_eq!(input.price, Decimal::new(905, 1));

        let input: NewToken = serde_json::from_str(r#"{"itemName":"Tea","price":12}"#).unwrap();
        assert_eq!(input.price, Decimal::new(12, 0));
    }

    #[test]
    fn test_new_token_rejects_string_price() {
        assert!(serde_json::from_str::<NewToken>(r#"{"itemName":"Tea","price":"12"}"#).is_err());
        assert!(serde_json::from_str::<NewToken>(r#"{"itemName":"Tea","price":"abc"}"#).is_err());
        assert!(serde_json::from_str::<NewToken>(r#"{"itemName":"Tea"}"#).is_err());
    }
}
