//! Canonical test configurations.
//!
//! Single source of truth for settings used across tests.

use std::time::Duration;

use crate::application::scheduler::SchedulerConfig;
use crate::application::submitter::SubmitterSettings;
use crate::port::outbound::ledger::Credential;

/// Fully configured submitter with the production fee constants.
pub fn submitter_settings() -> SubmitterSettings {
    SubmitterSettings {
        program_id: "prediction.aleo".into(),
        query_endpoint: Some("http://127.0.0.1:3030".into()),
        credential: Some(Credential::new("APrivateKey1zkpTest")),
        resolve_fee: 100_000,
        create_fee: 500_000,
        execution_timeout: Duration::from_secs(30),
    }
}

/// Scheduler config with no waiting and a low alert threshold.
pub fn scheduler(failure_alert_threshold: u32) -> SchedulerConfig {
    SchedulerConfig {
        poll_interval: Duration::from_millis(10),
        failure_alert_threshold,
    }
}
