use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("ledger not configured: {0}")]
    LedgerUnavailable(String),
}

/// Persistence failures. These are fatal to the enclosing operation.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database connection failed: {0}")]
    Connection(String),

    #[error("database query failed: {0}")]
    Query(String),

    #[error("database migration failed: {0}")]
    Migration(String),

    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

/// Failures reported by a metric provider.
///
/// The scheduler treats every variant as "retry next cycle".
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("{provider} request failed: {message}")]
    Http {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} reported an error: {message}")]
    Status {
        provider: &'static str,
        message: String,
    },

    #[error("malformed {provider} payload: {reason}")]
    Malformed {
        provider: &'static str,
        reason: String,
    },

    #[error("{0} is not set")]
    MissingApiKey(&'static str),
}

/// Failures from the ledger client while authorizing, executing or proving.
#[derive(Error, Debug, Clone)]
pub enum LedgerError {
    #[error("credential rejected: {0}")]
    Credential(String),

    #[error("authorization failed: {0}")]
    Authorization(String),

    #[error("execution failed: {0}")]
    Execution(String),

    #[error("proof generation failed: {0}")]
    Proof(String),

    #[error("fee authorization failed: {0}")]
    Fee(String),

    #[error("transaction assembly failed: {0}")]
    Transaction(String),

    #[error("execution timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("ledger transport error: {0}")]
    Transport(String),
}

/// Transport-level failures talking to the broadcast endpoint.
#[derive(Error, Debug, Clone)]
pub enum BroadcastError {
    #[error("broadcast transport failed: {0}")]
    Transport(String),

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("malformed node response from {url}: {reason}")]
    Malformed { url: String, reason: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error("earlier submission unverified: {0}")]
    InDoubt(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for failures the worker must not continue past.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_errors_are_fatal() {
        let err: Error = StorageError::Query("disk I/O error".into()).into();
        assert!(err.is_fatal());
    }

    #[test]
    fn provider_errors_are_not_fatal() {
        let err: Error = ProviderError::MissingApiKey("ETHERSCAN_API_KEY").into();
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "ETHERSCAN_API_KEY is not set");
    }

    #[test]
    fn config_error_message_names_field() {
        let err: Error = ConfigError::InvalidValue {
            field: "poll_interval_secs",
            reason: "must be greater than 0".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "invalid value for poll_interval_secs: must be greater than 0"
        );
    }
}
