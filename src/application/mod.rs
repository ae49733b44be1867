//! Application services: resolution orchestration over the ports.

pub mod metric;
pub mod operator;
pub mod scheduler;
pub mod submitter;
