//! Oracle domain types: markets, outcomes, and on-chain call encoding.
//!
//! Nothing in here performs I/O. Ports and adapters depend on these types,
//! never the other way round.

pub mod call;
pub mod error;
pub mod field;
pub mod id;
pub mod market;
pub mod outcome;
pub mod pool;
pub mod submission;

pub use call::{Locator, ProgramCall, CREATE_POOL, RESOLVE_POOL};
pub use field::FieldLiteral;
pub use id::{ExecutionId, MarketId, TransactionId};
pub use market::{Market, MarketStatus, NewMarket, DEFAULT_OPTION_A, DEFAULT_OPTION_B};
pub use outcome::{winning_option, Observation, WinningOption};
pub use pool::PoolStats;
pub use submission::{SubmissionAttempt, SubmissionPhase};
