use rust_decimal::Decimal;

use super::models::Card;

/// Cards seeded for local runs and tests.
pub fn demo_cards() -> Vec<Card> {
    vec![
        Card::with_id(99, Decimal::new(12345, 2), "sarah1"),
        Card::with_id(100, Decimal::new(100, 2), "sarah1"),
        Card::with_id(101, Decimal::new(15000, 2), "sarah1"),
        Card::with_id(102, Decimal::new(20000, 2), "kumar2"),
    ]
}
