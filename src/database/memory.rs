use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::Card;
use crate::database::store::CardStore;
use crate::paging::{PageRequest, SortDirection, SortOrder, SortProperty};

/// Process-local card store used for local runs and tests
pub struct InMemoryCardStore {
    state: RwLock<MemoryState>,
}

struct MemoryState {
    cards: BTreeMap<i64, Card>,
    next_id: i64,
}

impl InMemoryCardStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState { cards: BTreeMap::new(), next_id: 1 }),
        }
    }

    /// Build a store pre-populated with cards that already carry ids
    pub fn with_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut store = Self::new();
        let state = store.state.get_mut();
        for card in cards {
            state.insert_seeded(card);
        }
        store
    }

    /// Insert cards keeping their ids. Existing ids are left untouched.
    pub async fn seed(&self, cards: impl IntoIterator<Item = Card>) {
        let mut state = self.state.write().await;
        for card in cards {
            state.insert_seeded(card);
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.cards.len()
    }
}

impl Default for InMemoryCardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryState {
    fn insert_seeded(&mut self, card: Card) {
        let Some(id) = card.id else {
            tracing::warn!("Skipping seed card without id");
            return;
        };
        self.cards.entry(id).or_insert(card);
        self.next_id = self.next_id.max(id + 1);
    }
}

fn compare(a: &Card, b: &Card, orders: &[SortOrder]) -> Ordering {
    for order in orders {
        let ord = match order.property {
            SortProperty::Id => a.id.cmp(&b.id),
            SortProperty::Amount => a.amount.cmp(&b.amount),
        };
        let ord = match order.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.id.cmp(&b.id)
}

#[async_trait]
impl CardStore for InMemoryCardStore {
    async fn find_by_id_and_owner(&self, id: i64, owner: &str) -> Result<Option<Card>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.cards.get(&id).filter(|c| c.owner == owner).cloned())
    }

    async fn exists_by_id_and_owner(&self, id: i64, owner: &str) -> Result<bool, DatabaseError> {
        let state = self.state.read().await;
        Ok(state.cards.get(&id).is_some_and(|c| c.owner == owner))
    }

    async fn find_page_by_owner(&self, owner: &str, page: &PageRequest) -> Result<Vec<Card>, DatabaseError> {
        let state = self.state.read().await;
        let mut owned: Vec<&Card> = state.cards.values().filter(|c| c.owner == owner).collect();
        owned.sort_by(|a, b| compare(a, b, &page.sort));

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        Ok(owned.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn save(&self, mut card: Card) -> Result<Card, DatabaseError> {
        let mut state = self.state.write().await;
        match card.id {
            None => {
                let id = state.next_id;
                state.next_id += 1;
                card.id = Some(id);
                state.cards.insert(id, card.clone());
            }
            Some(id) => {
                let slot = state
                    .cards
                    .get_mut(&id)
                    .ok_or_else(|| DatabaseError::NotFound(format!("card {}", id)))?;
                *slot = card.clone();
            }
        }
        Ok(card)
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), DatabaseError> {
        self.state.write().await.cards.remove(&id);
        Ok(())
    }
}
