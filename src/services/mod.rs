pub mod card_service;

pub use card_service::{CardRequest, CardService, Created, ListError, Mutation, AMOUNT_SCALE, CARDS_PATH};
