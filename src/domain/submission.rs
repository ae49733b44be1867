//! Submission attempt journal entries.
//!
//! Each attempt to push a call through the ledger leaves a trail of phase
//! records. The latest record for a market tells the worker whether a
//! previous attempt may already have landed on-chain.

use std::fmt;
use std::str::FromStr;

use super::error::DomainError;
use super::id::{ExecutionId, MarketId, TransactionId};
use super::outcome::WinningOption;

/// Furthest phase an attempt reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionPhase {
    /// Execution and fee proved; nothing sent yet.
    Proved,
    /// Transaction handed to the broadcast endpoint; outcome unknown.
    Broadcasting,
    /// Broadcast endpoint accepted the transaction.
    Accepted,
    /// Broadcast endpoint refused the transaction.
    Rejected,
}

impl SubmissionPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proved => "proved",
            Self::Broadcasting => "broadcasting",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for SubmissionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionPhase {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proved" => Ok(Self::Proved),
            "broadcasting" => Ok(Self::Broadcasting),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            other => Err(DomainError::UnknownPhase(other.to_string())),
        }
    }
}

/// One journal record.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionAttempt {
    pub market_id: MarketId,
    /// Program function the attempt called.
    pub function: String,
    /// Present for resolution attempts.
    pub winning_option: Option<WinningOption>,
    pub execution_id: ExecutionId,
    /// Known once the transaction has been assembled.
    pub transaction_id: Option<TransactionId>,
    pub phase: SubmissionPhase,
    pub detail: Option<String>,
    /// Unix seconds.
    pub recorded_at: i64,
}

impl SubmissionAttempt {
    /// Same attempt advanced to a later phase.
    #[must_use]
    pub fn advance(&self, phase: SubmissionPhase, recorded_at: i64) -> Self {
        Self {
            phase,
            recorded_at,
            detail: None,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_transaction(mut self, id: TransactionId) -> Self {
        self.transaction_id = Some(id);
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_round_trips_through_text() {
        for phase in [
            SubmissionPhase::Proved,
            SubmissionPhase::Broadcasting,
            SubmissionPhase::Accepted,
            SubmissionPhase::Rejected,
        ] {
            assert_eq!(phase.as_str().parse::<SubmissionPhase>().unwrap(), phase);
        }
        assert!("sent".parse::<SubmissionPhase>().is_err());
    }

    #[test]
    fn advance_keeps_identity_and_clears_detail() {
        let attempt = SubmissionAttempt {
            market_id: MarketId::from("m1"),
            function: "resolve_pool".into(),
            winning_option: Some(WinningOption::Yes),
            execution_id: ExecutionId::from("au1exec"),
            transaction_id: None,
            phase: SubmissionPhase::Proved,
            detail: Some("note".into()),
            recorded_at: 10,
        }
        .with_transaction(TransactionId::from("at1tx"));

        let next = attempt.advance(SubmissionPhase::Accepted, 11);
        assert_eq!(next.execution_id, attempt.execution_id);
        assert_eq!(next.transaction_id, Some(TransactionId::from("at1tx")));
        assert_eq!(next.phase, SubmissionPhase::Accepted);
        assert_eq!(next.detail, None);
        assert_eq!(next.recorded_at, 11);
    }
}
