//! Runtime layer for the clarification monitor.
//!
//! Holds the last-notified state, decides which records changed, delivers
//! notifications and drives the polling loop.

pub mod detector;
pub mod notifier;
pub mod orchestrator;
pub mod source;
pub mod store;

pub use monitor_core as core;
pub use monitor_data as data;
