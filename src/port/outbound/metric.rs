//! Metric provider port.

use async_trait::async_trait;

use crate::error::ProviderError;

/// A source that reduces one or more external calls to a single number.
///
/// Network errors, malformed payloads and error envelopes all surface as
/// [`ProviderError`]; implementations never panic on bad input.
#[async_trait]
pub trait MetricProvider: Send + Sync {
    /// Metric type name this provider answers for.
    fn name(&self) -> &str;

    /// Take one observation.
    async fn fetch_value(&self) -> Result<f64, ProviderError>;
}
