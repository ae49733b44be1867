//! File-backed SQLite databases that vanish with the test.

use std::path::PathBuf;
use std::sync::Arc;

use market_oracle::adapter::outbound::sqlite::database::connection::{create_pool, DbPool};
use market_oracle::adapter::outbound::sqlite::{SqliteMarketStore, SqliteSubmissionJournal};
use market_oracle::port::outbound::store::MarketStore;
use tempfile::TempDir;

/// Temporary SQLite database for integration tests.
pub struct TempDb {
    dir: TempDir,
    pool: DbPool,
}

impl TempDb {
    pub async fn create() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let pool = create_pool(&Self::url_in(&dir)).expect("create sqlite pool");
        let db = Self { dir, pool };
        db.store().initialize().await.expect("run migrations");
        db
    }

    fn url_in(dir: &TempDir) -> String {
        dir.path().join("oracle.db").display().to_string()
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("oracle.db")
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Fresh pool over the same file, as a restarted process would open.
    pub fn reopen(&self) -> DbPool {
        create_pool(&Self::url_in(&self.dir)).expect("reopen sqlite pool")
    }

    pub fn store(&self) -> Arc<SqliteMarketStore> {
        Arc::new(SqliteMarketStore::new(self.pool.clone()))
    }

    pub fn journal(&self) -> Arc<SqliteSubmissionJournal> {
        Arc::new(SqliteSubmissionJournal::new(self.pool.clone()))
    }
}
