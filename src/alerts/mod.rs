//! Alerts: data model and bounded delivery channel.
//!
//! This module groups the alert **data model** and the **channel** used to
//! hand alerts from producers to the dispatcher.
//!
//! ## Contents
//! - [`AlertKind`], [`Alert`], [`PanicPayload`] classification and payload of one observed problem
//! - [`AlertChannel`], [`Delivery`] bounded queue with timeout/close-aware best-effort emit
//!
//! ## Quick reference
//! - **Producers**: `core::supervisor` (panic, non-compliance), `core::monitor` (tolerance).
//! - **Consumer**: `core::dispatcher` (single loop, forwards to [`Consume`](crate::Consume)).

mod alert;
mod channel;

pub use alert::{Alert, AlertKind, PanicPayload};
pub use channel::{AlertChannel, Delivery};
