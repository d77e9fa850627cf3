use async_trait::async_trait;
use sqlx::PgPool;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::Card;
use crate::database::store::CardStore;
use crate::paging::{PageOrder, PageRequest};

const SCHEMA_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS cash_card (
        id     BIGSERIAL PRIMARY KEY,
        amount NUMERIC(19, 2) NOT NULL DEFAULT 0,
        owner  VARCHAR(256) NOT NULL
    )
"#;

/// Card store backed by the `cash_card` table
pub struct PgCardStore {
    pool: PgPool,
    slow_query_threshold: Option<Duration>,
}

impl PgCardStore {
    pub fn new(pool: PgPool, config: &DatabaseConfig) -> Self {
        let slow_query_threshold = config
            .enable_slow_query_warning
            .then(|| Duration::from_millis(config.slow_query_threshold_ms));
        Self { pool, slow_query_threshold }
    }

    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        info!("cash_card table ready");
        Ok(())
    }

    /// Insert cards with fixed ids, skipping ids that already exist, then move
    /// the id sequence past them so later inserts do not collide.
    pub async fn seed(&self, cards: &[Card]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        for card in cards {
            let Some(id) = card.id else { continue };
            sqlx::query("INSERT INTO cash_card (id, amount, owner) VALUES ($1, $2, $3) ON CONFLICT (id) DO NOTHING")
                .bind(id)
                .bind(card.amount)
                .bind(&card.owner)
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query("SELECT setval(pg_get_serial_sequence('cash_card', 'id'), (SELECT COALESCE(MAX(id), 1) FROM cash_card))")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        info!("Seeded {} demo cards", cards.len());
        Ok(())
    }

    async fn timed<T, F>(&self, label: &'static str, query: F) -> Result<T, DatabaseError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let started = Instant::now();
        let result = query.await;
        let elapsed = started.elapsed();
        debug!("{} took {:?}", label, elapsed);
        if let Some(threshold) = self.slow_query_threshold {
            if elapsed > threshold {
                warn!("Slow query {}: {:?} (threshold {:?})", label, elapsed, threshold);
            }
        }
        result.map_err(DatabaseError::from)
    }
}

#[async_trait]
impl CardStore for PgCardStore {
    async fn find_by_id_and_owner(&self, id: i64, owner: &str) -> Result<Option<Card>, DatabaseError> {
        self.timed(
            "find_by_id_and_owner",
            sqlx::query_as::<_, Card>("SELECT id, amount, owner FROM cash_card WHERE id = $1 AND owner = $2")
                .bind(id)
                .bind(owner)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn exists_by_id_and_owner(&self, id: i64, owner: &str) -> Result<bool, DatabaseError> {
        self.timed(
            "exists_by_id_and_owner",
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM cash_card WHERE id = $1 AND owner = $2)")
                .bind(id)
                .bind(owner)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn find_page_by_owner(&self, owner: &str, page: &PageRequest) -> Result<Vec<Card>, DatabaseError> {
        // Sort columns come from the SortProperty whitelist, never from raw input
        let sql = format!(
            "SELECT id, amount, owner FROM cash_card WHERE owner = $1 {} LIMIT $2 OFFSET $3",
            PageOrder::generate(&page.sort)
        );
        let limit = i64::try_from(page.limit()).map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        let offset = i64::try_from(page.offset()).map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        self.timed(
            "find_page_by_owner",
            sqlx::query_as::<_, Card>(&sql)
                .bind(owner)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn save(&self, card: Card) -> Result<Card, DatabaseError> {
        match card.id {
            None => {
                self.timed(
                    "insert",
                    sqlx::query_as::<_, Card>(
                        "INSERT INTO cash_card (amount, owner) VALUES ($1, $2) RETURNING id, amount, owner",
                    )
                    .bind(card.amount)
                    .bind(&card.owner)
                    .fetch_one(&self.pool),
                )
                .await
            }
            Some(id) => self
                .timed(
                    "update",
                    sqlx::query_as::<_, Card>(
                        "UPDATE cash_card SET amount = $2, owner = $3 WHERE id = $1 RETURNING id, amount, owner",
                    )
                    .bind(id)
                    .bind(card.amount)
                    .bind(&card.owner)
                    .fetch_optional(&self.pool),
                )
                .await?
                .ok_or_else(|| DatabaseError::NotFound(format!("card {}", id))),
        }
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), DatabaseError> {
        self.timed(
            "delete_by_id",
            sqlx::query("DELETE FROM cash_card WHERE id = $1").bind(id).execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
