//! CLI module graph.

pub mod command;
pub mod config;
pub mod create;
pub mod dispatch;
pub mod markets;
pub mod metrics;
pub mod output;
pub mod paths;
pub mod resolve;
pub mod run;
