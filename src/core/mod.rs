//! Engine core: supervision, aggregation and delivery.
//!
//! The only public API from this module is [`Engine`] (with [`EngineBuilder`]),
//! plus the small value types it hands out.
//!
//! Internal modules:
//! - [`engine`]: composition root, lifecycle and public operations;
//! - [`supervisor`]: per-invocation panic capture and teardown race;
//! - [`monitor`]: periodic tolerance evaluation;
//! - [`dispatcher`]: single loop forwarding alerts to the consumer;
//! - [`lifecycle`]: one-shot `Created → Watching → Closed` flag and close gate;
//! - [`counter`]: shared atomic error counter.

mod builder;
mod counter;
mod dispatcher;
mod engine;
mod lifecycle;
mod monitor;
mod supervisor;

pub use builder::EngineBuilder;
pub use engine::Engine;
pub use lifecycle::LifecycleState;
pub use supervisor::{Supervision, SupervisionState};
