//! Poll loop settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::scheduler::SchedulerConfig;

/// Worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Seconds between poll cycles.
    pub poll_interval_secs: u64,
    /// Consecutive failed cycles before a market raises an alert.
    pub failure_alert_threshold: u32,
    /// Mirror on-chain stake totals into the database each cycle.
    /// Needs `ledger.node_url`.
    pub sync_stats: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            failure_alert_threshold: 10,
            sync_stats: true,
        }
    }
}

impl WorkerConfig {
    #[must_use]
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            failure_alert_threshold: self.failure_alert_threshold,
        }
    }
}
