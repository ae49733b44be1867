//! Database model types for Diesel ORM.

use diesel::prelude::*;

use super::schema::{markets, submission_attempts};

/// Database row for a market.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = markets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MarketRow {
    pub id: String,
    pub deadline: i64,
    pub threshold: f64,
    pub status: String,
    pub metric_type: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub resolved_at: Option<i64>,
    pub description: String,
    pub option_a_label: String,
    pub option_b_label: String,
    pub total_staked: i64,
    pub option_a_stakes: i64,
    pub option_b_stakes: i64,
    pub stats_synced_at: Option<i64>,
}

/// Database row for a submission attempt (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = submission_attempts)]
pub struct NewSubmissionAttemptRow {
    pub market_id: String,
    pub function: String,
    pub winning_option: Option<i32>,
    pub execution_id: String,
    pub transaction_id: Option<String>,
    pub phase: String,
    pub detail: Option<String>,
    pub recorded_at: i64,
}

/// Database row for a submission attempt (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = submission_attempts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SubmissionAttemptRow {
    pub id: Option<i32>,
    pub market_id: String,
    pub function: String,
    pub winning_option: Option<i32>,
    pub execution_id: String,
    pub transaction_id: Option<String>,
    pub phase: String,
    pub detail: Option<String>,
    pub recorded_at: i64,
}
