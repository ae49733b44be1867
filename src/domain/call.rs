//! On-chain function calls issued by the oracle.

use super::field::{u64_literal, FieldLiteral};
use super::outcome::WinningOption;

/// Program function that settles a pool.
pub const RESOLVE_POOL: &str = "resolve_pool";

/// Program function that opens a pool.
pub const CREATE_POOL: &str = "create_pool";

/// A typed call to a program function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramCall {
    pub program_id: String,
    pub function: String,
    pub inputs: Vec<String>,
}

impl ProgramCall {
    /// `resolve_pool(pool_id, winning_option)`.
    #[must_use]
    pub fn resolve_pool(program_id: &str, pool: &FieldLiteral, option: WinningOption) -> Self {
        Self {
            program_id: program_id.to_string(),
            function: RESOLVE_POOL.to_string(),
            inputs: vec![pool.to_string(), u64_literal(option.index())],
        }
    }

    /// `create_pool(title, description, options, deadline)`.
    ///
    /// Description and option labels are zero placeholders; labels live
    /// off-chain.
    #[must_use]
    pub fn create_pool(program_id: &str, title: &FieldLiteral, deadline: u64) -> Self {
        let zero = FieldLiteral::zero();
        Self {
            program_id: program_id.to_string(),
            function: CREATE_POOL.to_string(),
            inputs: vec![
                title.to_string(),
                zero.to_string(),
                format!("[{zero}, {zero}]"),
                u64_literal(deadline),
            ],
        }
    }

    /// Locator naming the proved function.
    #[must_use]
    pub fn locator(&self) -> Locator {
        Locator {
            program_id: self.program_id.clone(),
            function: self.function.clone(),
        }
    }
}

/// `program/function` pair used when proving an execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub program_id: String,
    pub function: String,
}
