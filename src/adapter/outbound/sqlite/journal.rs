//! SQLite submission journal.

use async_trait::async_trait;
use diesel::prelude::*;

use crate::adapter::outbound::sqlite::database::connection::{checkout, DbPool};
use crate::adapter::outbound::sqlite::database::model::{
    NewSubmissionAttemptRow, SubmissionAttemptRow,
};
use crate::adapter::outbound::sqlite::database::schema::submission_attempts;
use crate::domain::{
    ExecutionId, MarketId, SubmissionAttempt, SubmissionPhase, TransactionId, WinningOption,
};
use crate::error::{Result, StorageError};
use crate::port::outbound::store::SubmissionJournal;

/// Append-only journal stored next to the markets table.
///
/// Shares the pool with [`SqliteMarketStore`](super::SqliteMarketStore);
/// the store's `initialize` creates both tables.
pub struct SqliteSubmissionJournal {
    pool: DbPool,
}

impl SqliteSubmissionJournal {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn to_row(attempt: &SubmissionAttempt) -> NewSubmissionAttemptRow {
        NewSubmissionAttemptRow {
            market_id: attempt.market_id.to_string(),
            function: attempt.function.clone(),
            winning_option: attempt
                .winning_option
                .map(|option| if option == WinningOption::Yes { 1 } else { 2 }),
            execution_id: attempt.execution_id.to_string(),
            transaction_id: attempt.transaction_id.as_ref().map(ToString::to_string),
            phase: attempt.phase.as_str().to_string(),
            detail: attempt.detail.clone(),
            recorded_at: attempt.recorded_at,
        }
    }

    fn from_row(row: SubmissionAttemptRow) -> Result<SubmissionAttempt> {
        let corrupt = |reason: String| StorageError::Corrupt {
            id: format!("submission_attempts/{}", row.id.unwrap_or_default()),
            reason,
        };

        let phase = row
            .phase
            .parse::<SubmissionPhase>()
            .map_err(|e| corrupt(e.to_string()))?;
        let winning_option = row
            .winning_option
            .map(|index| {
                u64::try_from(index)
                    .map_err(|e| corrupt(e.to_string()))
                    .and_then(|index| {
                        WinningOption::try_from(index).map_err(|e| corrupt(e.to_string()))
                    })
            })
            .transpose()?;

        Ok(SubmissionAttempt {
            market_id: MarketId::new(row.market_id),
            function: row.function,
            winning_option,
            execution_id: ExecutionId::new(row.execution_id),
            transaction_id: row.transaction_id.map(TransactionId::new),
            phase,
            detail: row.detail,
            recorded_at: row.recorded_at,
        })
    }
}

#[async_trait]
impl SubmissionJournal for SqliteSubmissionJournal {
    async fn record(&self, attempt: &SubmissionAttempt) -> Result<()> {
        let row = Self::to_row(attempt);
        let mut conn = checkout(&self.pool)?;

        diesel::insert_into(submission_attempts::table)
            .values(&row)
            .execute(&mut conn)
            .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(())
    }

    async fn latest(
        &self,
        market_id: &MarketId,
        function: &str,
    ) -> Result<Option<SubmissionAttempt>> {
        let mut conn = checkout(&self.pool)?;

        let row: Option<SubmissionAttemptRow> = submission_attempts::table
            .filter(submission_attempts::market_id.eq(market_id.as_str()))
            .filter(submission_attempts::function.eq(function))
            .order(submission_attempts::id.desc())
            .select(SubmissionAttemptRow::as_select())
            .first(&mut conn)
            .optional()
            .map_err(|e| StorageError::Query(e.to_string()))?;

        row.map(Self::from_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
    use crate::domain::{CREATE_POOL, RESOLVE_POOL};

    fn setup() -> SqliteSubmissionJournal {
        let pool = create_pool(":memory:").unwrap();
        run_migrations(&pool).unwrap();
        SqliteSubmissionJournal::new(pool)
    }

    fn attempt(market: &str, function: &str, phase: SubmissionPhase) -> SubmissionAttempt {
        SubmissionAttempt {
            market_id: MarketId::from(market),
            function: function.to_string(),
            winning_option: Some(WinningOption::No),
            execution_id: ExecutionId::new("au1exec"),
            transaction_id: None,
            phase,
            detail: None,
            recorded_at: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn latest_returns_most_recent_phase() {
        let journal = setup();
        let proved = attempt("1field", RESOLVE_POOL, SubmissionPhase::Proved);
        journal.record(&proved).await.unwrap();
        let broadcasting = proved
            .advance(SubmissionPhase::Broadcasting, 1_700_000_001)
            .with_transaction(TransactionId::new("at1tx"));
        journal.record(&broadcasting).await.unwrap();

        let latest = journal
            .latest(&MarketId::from("1field"), RESOLVE_POOL)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(latest, broadcasting);
    }

    #[tokio::test]
    async fn latest_is_scoped_by_market_and_function() {
        let journal = setup();
        journal
            .record(&attempt("1field", CREATE_POOL, SubmissionPhase::Accepted))
            .await
            .unwrap();
        journal
            .record(&attempt("2field", RESOLVE_POOL, SubmissionPhase::Rejected))
            .await
            .unwrap();

        let id = MarketId::from("1field");
        assert!(journal.latest(&id, RESOLVE_POOL).await.unwrap().is_none());
        let created = journal.latest(&id, CREATE_POOL).await.unwrap().unwrap();
        assert_eq!(created.phase, SubmissionPhase::Accepted);
    }

    #[tokio::test]
    async fn detail_and_missing_option_survive_storage() {
        let journal = setup();
        let mut rejected = attempt("1field", CREATE_POOL, SubmissionPhase::Rejected)
            .with_detail("status 500");
        rejected.winning_option = None;
        journal.record(&rejected).await.unwrap();

        let latest = journal
            .latest(&MarketId::from("1field"), CREATE_POOL)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(latest.detail.as_deref(), Some("status 500"));
        assert_eq!(latest.winning_option, None);
    }
}
