//! Fake metric providers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::ProviderError;
use crate::port::outbound::metric::MetricProvider;

/// Always returns the same value.
pub struct FixedMetric {
    name: String,
    value: Mutex<f64>,
    calls: AtomicU32,
}

impl FixedMetric {
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value: Mutex::new(value),
            calls: AtomicU32::new(0),
        }
    }

    /// Change the value returned by later fetches.
    pub fn set(&self, value: f64) {
        *self.value.lock() = value;
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricProvider for FixedMetric {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_value(&self) -> Result<f64, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(*self.value.lock())
    }
}

/// Always fails as if the upstream were down.
pub struct FailingMetric {
    name: String,
    calls: AtomicU32,
}

impl FailingMetric {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricProvider for FailingMetric {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_value(&self) -> Result<f64, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::Http {
            provider: "fake",
            message: "connection refused".into(),
        })
    }
}

/// Pops one scripted result per fetch; fails once the script runs out.
pub struct ScriptedMetric {
    name: String,
    script: Mutex<VecDeque<Result<f64, ProviderError>>>,
    calls: AtomicU32,
}

impl ScriptedMetric {
    pub fn new(name: &str, script: Vec<Result<f64, ProviderError>>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(script.into()),
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricProvider for ScriptedMetric {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_value(&self) -> Result<f64, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProviderError::Malformed {
                    provider: "fake",
                    reason: "script exhausted".into(),
                })
            })
    }
}
