use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A cash card row. `owner` is never written to the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Card {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default, skip_serializing)]
    pub owner: String,
}

impl Card {
    /// A card that has not been stored yet; the store assigns the id.
    pub fn unsaved(amount: Decimal, owner: impl Into<String>) -> Self {
        Self { id: None, amount, owner: owner.into() }
    }

    pub fn with_id(id: i64, amount: Decimal, owner: impl Into<String>) -> Self {
        Self { id: Some(id), amount, owner: owner.into() }
    }
}
