//! # Alert consumers.
//!
//! This module provides the [`Consume`] trait and the built-in consumers.
//!
//! ## Built-in consumers
//! - [`AlertHistory`] records alerts in memory (tests, assertions)
//! - `LogWriter` forwards alerts to `tracing` (requires the `logging` feature)

mod consumer;
mod history;
#[cfg(feature = "logging")]
mod log;

pub use consumer::Consume;
pub use history::{AlertHistory, HistoryMismatch};
#[cfg(feature = "logging")]
pub use log::LogWriter;
