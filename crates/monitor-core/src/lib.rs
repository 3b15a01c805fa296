//! Core types for the clarification monitor.
//!
//! Holds the clarification data model, the error taxonomy shared by every
//! crate, configuration loading and the notification templates.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{MonitorError, Result};
pub use models::{Change, ChangeKind, ClarificationRecord};
