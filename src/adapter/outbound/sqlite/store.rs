//! SQLite market store implementation.
//!
//! Provides persistent storage for market lifecycle state using SQLite and
//! Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;

use crate::adapter::outbound::sqlite::database::connection::{checkout, run_migrations, DbPool};
use crate::adapter::outbound::sqlite::database::model::MarketRow;
use crate::adapter::outbound::sqlite::database::schema::markets;
use crate::domain::error::DomainError;
use crate::domain::{Market, MarketId, MarketStatus, NewMarket, PoolStats};
use crate::error::{Result, StorageError};
use crate::port::outbound::store::MarketStore;

/// SQLite-backed market store.
pub struct SqliteMarketStore {
    pool: DbPool,
}

/// Result of the upsert transaction.
enum Upsert {
    Written,
    Unchanged,
    Resolved,
}

impl SqliteMarketStore {
    /// Create a new SQLite market store with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn from_row(row: MarketRow) -> Result<Market> {
        let status = row
            .status
            .parse::<MarketStatus>()
            .map_err(|e| StorageError::Corrupt {
                id: row.id.clone(),
                reason: e.to_string(),
            })?;

        let stake = |value: i64, column: &str| {
            u64::try_from(value).map_err(|_| StorageError::Corrupt {
                id: row.id.clone(),
                reason: format!("negative {column}: {value}"),
            })
        };
        let stats = PoolStats {
            total_staked: stake(row.total_staked, "total_staked")?,
            option_a_stakes: stake(row.option_a_stakes, "option_a_stakes")?,
            option_b_stakes: stake(row.option_b_stakes, "option_b_stakes")?,
        };

        Ok(Market {
            id: MarketId::new(row.id),
            deadline: row.deadline,
            threshold: row.threshold,
            metric_type: row.metric_type,
            status,
            description: row.description,
            option_a_label: row.option_a_label,
            option_b_label: row.option_b_label,
            stats,
        })
    }

    fn from_rows(rows: Vec<MarketRow>) -> Result<Vec<Market>> {
        rows.into_iter().map(Self::from_row).collect()
    }
}

#[async_trait]
impl MarketStore for SqliteMarketStore {
    async fn initialize(&self) -> Result<()> {
        run_migrations(&self.pool)
    }

    async fn upsert_market(&self, market: &NewMarket) -> Result<()> {
        let mut conn = checkout(&self.pool)?;
        let now = chrono::Utc::now().timestamp();
        let id = market.id.as_str();

        let outcome = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                let existing: Option<MarketRow> = markets::table
                    .find(id)
                    .select(MarketRow::as_select())
                    .first(conn)
                    .optional()?;

                match existing {
                    Some(row) if row.status == MarketStatus::Resolved.as_str() => {
                        Ok(Upsert::Resolved)
                    }
                    Some(row)
                        if row.deadline == market.deadline
                            && row.threshold == market.threshold
                            && row.metric_type == market.metric_type
                            && row.description == market.description
                            && row.option_a_label == market.option_a_label
                            && row.option_b_label == market.option_b_label =>
                    {
                        Ok(Upsert::Unchanged)
                    }
                    Some(_) => {
                        diesel::update(markets::table.find(id))
                            .set((
                                markets::deadline.eq(market.deadline),
                                markets::threshold.eq(market.threshold),
                                markets::metric_type.eq(&market.metric_type),
                                markets::description.eq(&market.description),
                                markets::option_a_label.eq(&market.option_a_label),
                                markets::option_b_label.eq(&market.option_b_label),
                                markets::updated_at.eq(now),
                            ))
                            .execute(conn)?;
                        Ok(Upsert::Written)
                    }
                    None => {
                        let row = MarketRow {
                            id: id.to_string(),
                            deadline: market.deadline,
                            threshold: market.threshold,
                            status: MarketStatus::Pending.as_str().to_string(),
                            metric_type: market.metric_type.clone(),
                            created_at: now,
                            updated_at: now,
                            resolved_at: None,
                            description: market.description.clone(),
                            option_a_label: market.option_a_label.clone(),
                            option_b_label: market.option_b_label.clone(),
                            total_staked: 0,
                            option_a_stakes: 0,
                            option_b_stakes: 0,
                            stats_synced_at: None,
                        };
                        diesel::insert_into(markets::table)
                            .values(&row)
                            .execute(conn)?;
                        Ok(Upsert::Written)
                    }
                }
            })
            .map_err(|e| StorageError::Query(e.to_string()))?;

        match outcome {
            Upsert::Resolved => Err(DomainError::AlreadyResolved(market.id.clone()).into()),
            Upsert::Written | Upsert::Unchanged => Ok(()),
        }
    }

    async fn get(&self, id: &MarketId) -> Result<Option<Market>> {
        let mut conn = checkout(&self.pool)?;

        let row: Option<MarketRow> = markets::table
            .find(id.as_str())
            .select(MarketRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| StorageError::Query(e.to_string()))?;

        row.map(Self::from_row).transpose()
    }

    async fn list_pending(&self) -> Result<Vec<Market>> {
        let mut conn = checkout(&self.pool)?;

        let rows: Vec<MarketRow> = markets::table
            .filter(markets::status.eq(MarketStatus::Pending.as_str()))
            .order((markets::deadline.asc(), markets::id.asc()))
            .select(MarketRow::as_select())
            .load(&mut conn)
            .map_err(|e| StorageError::Query(e.to_string()))?;

        Self::from_rows(rows)
    }

    async fn list_all(&self) -> Result<Vec<Market>> {
        let mut conn = checkout(&self.pool)?;

        let rows: Vec<MarketRow> = markets::table
            .order((markets::deadline.asc(), markets::id.asc()))
            .select(MarketRow::as_select())
            .load(&mut conn)
            .map_err(|e| StorageError::Query(e.to_string()))?;

        Self::from_rows(rows)
    }

    async fn mark_resolved(&self, id: &MarketId) -> Result<()> {
        let mut conn = checkout(&self.pool)?;
        let now = chrono::Utc::now().timestamp();

        diesel::update(
            markets::table
                .find(id.as_str())
                .filter(markets::status.eq(MarketStatus::Pending.as_str())),
        )
        .set((
            markets::status.eq(MarketStatus::Resolved.as_str()),
            markets::resolved_at.eq(Some(now)),
            markets::updated_at.eq(now),
        ))
        .execute(&mut conn)
        .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(())
    }

    async fn update_stats(&self, id: &MarketId, stats: &PoolStats) -> Result<()> {
        let column = |value: u64, name: &str| {
            i64::try_from(value)
                .map_err(|_| StorageError::Query(format!("{name} {value} exceeds column range")))
        };
        let total_staked = column(stats.total_staked, "total_staked")?;
        let option_a_stakes = column(stats.option_a_stakes, "option_a_stakes")?;
        let option_b_stakes = column(stats.option_b_stakes, "option_b_stakes")?;

        let mut conn = checkout(&self.pool)?;
        let now = chrono::Utc::now().timestamp();

        diesel::update(markets::table.find(id.as_str()))
            .set((
                markets::total_staked.eq(total_staked),
                markets::option_a_stakes.eq(option_a_stakes),
                markets::option_b_stakes.eq(option_b_stakes),
                markets::stats_synced_at.eq(Some(now)),
            ))
            .execute(&mut conn)
            .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::database::connection::create_pool;
    use crate::error::Error;
    use crate::testkit::market;

    async fn setup() -> SqliteMarketStore {
        let pool = create_pool(":memory:").unwrap();
        let store = SqliteMarketStore::new(pool);
        store.initialize().await.unwrap();
        store
    }

    fn raw_rows(store: &SqliteMarketStore) -> Vec<MarketRow> {
        let mut conn = store.pool.get().unwrap();
        markets::table
            .order(markets::id.asc())
            .select(MarketRow::as_select())
            .load(&mut conn)
            .unwrap()
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let store = setup().await;
        store.initialize().await.unwrap();
        store.initialize().await.unwrap();
    }

    #[tokio::test]
    async fn upsert_creates_pending_market() {
        let store = setup().await;
        store.upsert_market(&market("1field", 100, 4.0, "eth_staking_rate")).await.unwrap();

        let m = store.get(&MarketId::from("1field")).await.unwrap().unwrap();
        assert_eq!(m.status, MarketStatus::Pending);
        assert_eq!(m.deadline, 100);
        assert_eq!(m.metric_type, "eth_staking_rate");
    }

    #[tokio::test]
    async fn upsert_replaces_fields_but_not_status() {
        let store = setup().await;
        store.upsert_market(&market("1field", 100, 4.0, "eth_staking_rate")).await.unwrap();
        store.upsert_market(&market("1field", 200, 5.0, "eth_price")).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].deadline, 200);
        assert!((all[0].threshold - 5.0).abs() < f64::EPSILON);
        assert_eq!(all[0].metric_type, "eth_price");
        assert_eq!(all[0].status, MarketStatus::Pending);
    }

    #[tokio::test]
    async fn identical_upsert_leaves_row_unchanged() {
        let store = setup().await;
        let m = market("1field", 100, 4.0, "eth_staking_rate");
        store.upsert_market(&m).await.unwrap();
        let before = raw_rows(&store);

        store.upsert_market(&m).await.unwrap();

        assert_eq!(raw_rows(&store), before);
    }

    #[tokio::test]
    async fn upsert_refuses_resolved_market() {
        let store = setup().await;
        let id = MarketId::from("1field");
        store.upsert_market(&market("1field", 100, 4.0, "eth_staking_rate")).await.unwrap();
        store.mark_resolved(&id).await.unwrap();

        let err = store
            .upsert_market(&market("1field", 999, 1.0, "eth_price"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Domain(DomainError::AlreadyResolved(_))));
        let m = store.get(&id).await.unwrap().unwrap();
        assert_eq!(m.status, MarketStatus::Resolved);
        assert_eq!(m.deadline, 100);
    }

    #[tokio::test]
    async fn list_pending_orders_by_deadline_then_id() {
        let store = setup().await;
        store.upsert_market(&market("b", 200, 1.0, "eth_price")).await.unwrap();
        store.upsert_market(&market("c", 100, 1.0, "eth_price")).await.unwrap();
        store.upsert_market(&market("a", 200, 1.0, "eth_price")).await.unwrap();
        store.upsert_market(&market("d", 50, 1.0, "eth_price")).await.unwrap();
        store.mark_resolved(&MarketId::from("d")).await.unwrap();

        let ids: Vec<String> = store
            .list_pending()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id.to_string())
            .collect();

        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(store.list_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn mark_resolved_is_idempotent() {
        let store = setup().await;
        let id = MarketId::from("1field");
        store.upsert_market(&market("1field", 100, 4.0, "eth_staking_rate")).await.unwrap();

        store.mark_resolved(&id).await.unwrap();
        let first = raw_rows(&store);
        store.mark_resolved(&id).await.unwrap();

        assert_eq!(raw_rows(&store), first);
        assert!(first[0].resolved_at.is_some());
        assert!(store.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mark_resolved_unknown_market_is_noop() {
        let store = setup().await;
        store.mark_resolved(&MarketId::from("missing")).await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_replaces_labels_and_description() {
        let store = setup().await;
        store.upsert_market(&market("1field", 100, 4.0, "eth_price")).await.unwrap();
        let relabelled = market("1field", 100, 4.0, "eth_price")
            .with_description("ETH above 4k?")
            .with_labels("Above", "Below")
            .unwrap();

        store.upsert_market(&relabelled).await.unwrap();

        let m = store.get(&MarketId::from("1field")).await.unwrap().unwrap();
        assert_eq!(m.description, "ETH above 4k?");
        assert_eq!(m.option_a_label, "Above");
        assert_eq!(m.option_b_label, "Below");
    }

    #[tokio::test]
    async fn stats_update_keeps_status_and_survives_upsert() {
        let store = setup().await;
        let id = MarketId::from("1field");
        let stats = PoolStats {
            total_staked: 1_500_000,
            option_a_stakes: 1_000_000,
            option_b_stakes: 500_000,
        };
        store.upsert_market(&market("1field", 100, 4.0, "eth_price")).await.unwrap();
        store.mark_resolved(&id).await.unwrap();

        store.update_stats(&id, &stats).await.unwrap();

        let m = store.get(&id).await.unwrap().unwrap();
        assert_eq!(m.stats, stats);
        assert_eq!(m.status, MarketStatus::Resolved);
        assert!(raw_rows(&store)[0].stats_synced_at.is_some());
    }

    #[tokio::test]
    async fn stats_for_unknown_market_is_noop() {
        let store = setup().await;
        store
            .update_stats(&MarketId::from("missing"), &PoolStats::default())
            .await
            .unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_beyond_column_range_are_refused() {
        let store = setup().await;
        let id = MarketId::from("1field");
        store.upsert_market(&market("1field", 100, 4.0, "eth_price")).await.unwrap();
        let stats = PoolStats {
            total_staked: u64::MAX,
            ..PoolStats::default()
        };

        let err = store.update_stats(&id, &stats).await.unwrap_err();

        assert!(matches!(err, Error::Storage(StorageError::Query(_))));
        assert_eq!(store.get(&id).await.unwrap().unwrap().stats, PoolStats::default());
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = setup().await;
        assert!(store.get(&MarketId::from("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_status_is_corrupt() {
        let store = setup().await;
        store.upsert_market(&market("1field", 100, 4.0, "eth_price")).await.unwrap();
        {
            let mut conn = store.pool.get().unwrap();
            // Bypass the CHECK constraint to simulate a damaged row.
            diesel::sql_query("PRAGMA ignore_check_constraints = ON")
                .execute(&mut conn)
                .unwrap();
            diesel::sql_query("UPDATE markets SET status = 'failed'")
                .execute(&mut conn)
                .unwrap();
        }

        let err = store.list_all().await.unwrap_err();

        assert!(matches!(err, Error::Storage(StorageError::Corrupt { .. })));
        assert!(err.is_fatal());
    }
}
