pub mod fixtures;
pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::InMemoryCardStore;
pub use models::Card;
pub use postgres::PgCardStore;
pub use store::CardStore;
