//! Data acquisition layer for the clarification monitor.
//!
//! Owns the authenticated HTTP session against the contest site and turns
//! the fetched clarification board into [`ClarificationRecord`]s.
//!
//! [`ClarificationRecord`]: monitor_core::models::ClarificationRecord

pub mod client;
pub mod extractor;

pub use monitor_core as core;
