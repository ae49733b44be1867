//! Shared HTTP plumbing for metric providers.

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::ProviderError;

/// Thin JSON GET client with a per-request timeout.
#[derive(Clone)]
pub struct MetricHttp {
    http: HttpClient,
}

impl MetricHttp {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(concat!("market-oracle/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });
        Self { http }
    }

    /// GET `url` and decode the body as JSON. Non-2xx statuses are errors.
    ///
    /// # Errors
    /// [`ProviderError::Http`] for transport and status failures,
    /// [`ProviderError::Malformed`] for undecodable bodies.
    pub async fn get_json(&self, provider: &'static str, url: &Url) -> Result<Value, ProviderError> {
        debug!(provider, host = url.host_str().unwrap_or_default(), path = url.path(), "Fetching metric source");
        let http_error = |err: reqwest::Error| ProviderError::Http {
            provider,
            message: err.without_url().to_string(),
        };

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?;

        response.json::<Value>().await.map_err(|err| ProviderError::Malformed {
            provider,
            reason: err.without_url().to_string(),
        })
    }
}

/// Build `base` with query parameters appended.
///
/// # Errors
/// [`ProviderError::Malformed`] when `base` is not a URL.
pub fn endpoint(
    provider: &'static str,
    base: &str,
    path: &str,
    params: &[(&str, &str)],
) -> Result<Url, ProviderError> {
    let joined = if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
    };
    let mut url = Url::parse(&joined).map_err(|e| ProviderError::Malformed {
        provider,
        reason: format!("invalid endpoint {joined}: {e}"),
    })?;
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params);
    }
    Ok(url)
}

/// Read a finite number that may be encoded as a JSON number or string.
///
/// # Errors
/// [`ProviderError::Malformed`] naming `what` when absent or not numeric.
pub fn number(provider: &'static str, value: Option<&Value>, what: &str) -> Result<f64, ProviderError> {
    let malformed = |reason: String| ProviderError::Malformed { provider, reason };
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
        None => return Err(malformed(format!("missing {what}"))),
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(malformed(format!("{what} is not a number"))),
    }
}

/// Extract `message` or `result` text from a status envelope.
pub(crate) fn envelope_message(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .or_else(|| body.get("result").and_then(Value::as_str))
        .unwrap_or("no message")
        .to_string()
}
