use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::auth::Principal;
use crate::database::manager::DatabaseError;
use crate::database::models::Card;
use crate::database::store::CardStore;
use crate::paging::{PageDefaults, PageParams, PagingError};

/// Base path of the card collection
pub const CARDS_PATH: &str = "/cashcards";

/// Amounts are kept to cents, matching the `NUMERIC(19, 2)` column.
pub const AMOUNT_SCALE: u32 = 2;

/// Request body for create and update. Any `id` or `owner` sent by the client
/// is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct CardRequest {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

impl CardRequest {
    /// The amount rounded half away from zero to cents, the way Postgres
    /// rounds on insert, so every store holds the same value.
    pub fn normalized_amount(&self) -> Decimal {
        self.amount
            .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Created {
    pub card: Card,
    pub location: String,
}

/// Result of a write against an existing card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    NoContent,
    NotFound,
}

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error(transparent)]
    Paging(#[from] PagingError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Owner-scoped card operations. Stateless apart from its collaborators.
#[derive(Clone)]
pub struct CardService {
    store: Arc<dyn CardStore>,
    defaults: PageDefaults,
}

impl CardService {
    pub fn new(store: Arc<dyn CardStore>, defaults: PageDefaults) -> Self {
        Self { store, defaults }
    }

    pub fn store(&self) -> &Arc<dyn CardStore> {
        &self.store
    }

    pub fn location_of(id: i64) -> String {
        format!("{}/{}", CARDS_PATH, id)
    }

    /// A card owned by someone else is reported exactly like a missing one.
    pub async fn find(&self, id: i64, principal: &Principal) -> Result<Option<Card>, DatabaseError> {
        let card = self.store.find_by_id_and_owner(id, &principal.name).await?;
        if card.is_none() {
            debug!("card {} not found for {}", id, principal.name);
        }
        Ok(card)
    }

    pub async fn create(&self, request: CardRequest, principal: &Principal) -> Result<Created, DatabaseError> {
        if let Some(ignored) = request.id {
            debug!("ignoring client-supplied id {} on create", ignored);
        }
        let saved = self.store.save(Card::unsaved(request.normalized_amount(), principal.name.clone())).await?;
        let id = saved
            .id
            .ok_or_else(|| DatabaseError::QueryError("store returned a card without an id".to_string()))?;
        debug!("created card {} for {}", id, principal.name);
        Ok(Created { location: Self::location_of(id), card: saved })
    }

    pub async fn list(&self, params: &PageParams, principal: &Principal) -> Result<Vec<Card>, ListError> {
        let page = self.defaults.resolve(params)?;
        debug!(
            "listing cards for {} page={} size={} sort={:?}",
            principal.name, page.page, page.size, page.sort
        );
        Ok(self.store.find_page_by_owner(&principal.name, &page).await?)
    }

    /// Full replacement of the amount; id and owner stay as stored.
    pub async fn update(&self, id: i64, request: CardRequest, principal: &Principal) -> Result<Mutation, DatabaseError> {
        let Some(existing) = self.find(id, principal).await? else {
            return Ok(Mutation::NotFound);
        };
        let replacement = Card {
            id: existing.id,
            amount: request.normalized_amount(),
            owner: principal.name.clone(),
        };
        self.store.save(replacement).await?;
        Ok(Mutation::NoContent)
    }

    pub async fn delete(&self, id: i64, principal: &Principal) -> Result<Mutation, DatabaseError> {
        if !self.store.exists_by_id_and_owner(id, &principal.name).await? {
            debug!("delete of card {} refused for {}", id, principal.name);
            return Ok(Mutation::NotFound);
        }
        self.store.delete_by_id(id).await?;
        Ok(Mutation::NoContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::fixtures::demo_cards;
    use crate::database::memory::InMemoryCardStore;

    fn service() -> CardService {
        CardService::new(Arc::new(InMemoryCardStore::with_cards(demo_cards())), PageDefaults::default())
    }

    fn sarah() -> Principal {
        Principal::new("sarah1", vec!["CARD-OWNER".to_string()])
    }

    fn kumar() -> Principal {
        Principal::new("kumar2", vec!["CARD-OWNER".to_string()])
    }

    fn request(amount: Decimal) -> CardRequest {
        CardRequest { id: None, amount }
    }

    #[tokio::test]
    async fn finds_own_card() {
        let card = service().find(99, &sarah()).await.unwrap().unwrap();
        assert_eq!(card.amount, Decimal::new(12345, 2));
    }

    #[tokio::test]
    async fn foreign_card_looks_missing() {
        let svc = service();
        assert_eq!(svc.find(102, &sarah()).await.unwrap(), None);
        assert_eq!(svc.find(1000, &sarah()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn create_ignores_client_id_and_sets_owner() {
        let svc = service();
        let created = svc
            .create(CardRequest { id: Some(44), amount: Decimal::new(250, 0) }, &sarah())
            .await
            .unwrap();
        let id = created.card.id.unwrap();
        assert_ne!(id, 44);
        assert_eq!(created.location, format!("/cashcards/{}", id));

        let stored = svc.find(id, &sarah()).await.unwrap().unwrap();
        assert_eq!(stored.owner, "sarah1");
        assert_eq!(stored.amount, Decimal::new(250, 0));
    }

    #[tokio::test]
    async fn amounts_are_rounded_to_cents() {
        let svc = service();
        let created = svc.create(request(Decimal::new(1005, 3)), &sarah()).await.unwrap();
        assert_eq!(created.card.amount, Decimal::new(101, 2));

        svc.update(99, request(Decimal::new(-2345, 3)), &sarah()).await.unwrap();
        let card = svc.find(99, &sarah()).await.unwrap().unwrap();
        assert_eq!(card.amount, Decimal::new(-235, 2));

        svc.update(100, request(Decimal::new(19994, 3)), &sarah()).await.unwrap();
        let card = svc.find(100, &sarah()).await.unwrap().unwrap();
        assert_eq!(card.amount, Decimal::new(1999, 2));
    }

    #[tokio::test]
    async fn list_uses_default_sort() {
        let cards = service().list(&PageParams::default(), &sarah()).await.unwrap();
        let ids: Vec<_> = cards.iter().map(|c| c.id.unwrap()).collect();
        assert_eq!(ids, vec![100, 99, 101]);
    }

    #[tokio::test]
    async fn list_rejects_unknown_sort_property() {
        let params = PageParams { sort: vec!["owner".to_string()], ..Default::default() };
        let err = service().list(&params, &sarah()).await.unwrap_err();
        assert!(matches!(err, ListError::Paging(PagingError::UnknownProperty(_))));
    }

    #[tokio::test]
    async fn update_replaces_amount_only() {
        let svc = service();
        let outcome = svc.update(99, request(Decimal::new(1999, 2)), &sarah()).await.unwrap();
        assert_eq!(outcome, Mutation::NoContent);

        let card = svc.find(99, &sarah()).await.unwrap().unwrap();
        assert_eq!(card, Card::with_id(99, Decimal::new(1999, 2), "sarah1"));
    }

    #[tokio::test]
    async fn update_of_foreign_card_changes_nothing() {
        let svc = service();
        let outcome = svc.update(102, request(Decimal::ONE), &sarah()).await.unwrap();
        assert_eq!(outcome, Mutation::NotFound);

        let card = svc.find(102, &kumar()).await.unwrap().unwrap();
        assert_eq!(card.amount, Decimal::new(20000, 2));
    }

    #[tokio::test]
    async fn delete_is_owner_scoped_and_repeatable() {
        let svc = service();
        assert_eq!(svc.delete(102, &sarah()).await.unwrap(), Mutation::NotFound);
        assert!(svc.find(102, &kumar()).await.unwrap().is_some());

        assert_eq!(svc.delete(99, &sarah()).await.unwrap(), Mutation::NoContent);
        assert_eq!(svc.delete(99, &sarah()).await.unwrap(), Mutation::NotFound);
        assert_eq!(svc.find(99, &sarah()).await.unwrap(), None);
    }
}
