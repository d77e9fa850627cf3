use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::Card;
use crate::paging::PageRequest;

/// Storage port for cards.
///
/// Every read reachable from a request filters on owner; `delete_by_id` is only
/// called after `exists_by_id_and_owner` has confirmed ownership.
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn find_by_id_and_owner(&self, id: i64, owner: &str) -> Result<Option<Card>, DatabaseError>;

    async fn exists_by_id_and_owner(&self, id: i64, owner: &str) -> Result<bool, DatabaseError>;

    /// One page of the owner's cards, ordered by `page.sort` with ascending id
    /// breaking ties.
    async fn find_page_by_owner(&self, owner: &str, page: &PageRequest) -> Result<Vec<Card>, DatabaseError>;

    /// Insert when `card.id` is `None`, otherwise replace the whole row.
    async fn save(&self, card: Card) -> Result<Card, DatabaseError>;

    async fn delete_by_id(&self, id: i64) -> Result<(), DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
