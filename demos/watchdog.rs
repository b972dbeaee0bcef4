//! # Example: watchdog
//!
//! Supervises three kinds of tasks and prints every alert through `LogWriter`:
//! - a compliant worker that stops when its token is cancelled (no alert);
//! - a stubborn worker that ignores cancellation (`CancellationNonCompliant`);
//! - a worker that panics (`PanicDetected`).
//!
//! Two errors inside one tolerance window also trip `ToleranceExceeded`.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► Engine::new(cfg, LogWriter) + watch()
//!   ├─► supervise compliant / stubborn / panicking
//!   ├─► sleep 100ms, cancel token
//!   │     ├─► compliant returns                → silent
//!   │     ├─► stubborn outlives teardown timeout → CancellationNonCompliant
//!   │     └─► (panic already reported)          → PanicDetected
//!   ├─► next tolerance tick: errors >= cap     → ToleranceExceeded
//!   └─► close() + closed()
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example watchdog --features logging
//! ```

use std::{sync::Arc, time::Duration};

use taskwarden::{Config, Consume, Engine, LogWriter};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // 1. Configure and start the watchdog
    let cfg = Config::default()
        .with_teardown_timeout(Duration::from_millis(100))
        .with_tolerance_window(Duration::from_millis(250));
    let consumer: Arc<dyn Consume> = Arc::new(LogWriter::new());
    let engine = Engine::new(cfg, consumer)?;
    engine.watch()?;

    let token = CancellationToken::new();

    // 2. Compliant: exits as soon as the token is cancelled
    engine.supervise_fn(token.clone(), "compliant", |ctx: CancellationToken| async move {
        loop {
            tokio::select! {
                _ = ctx.cancelled() => return,
                _ = tokio::time::sleep(Duration::from_millis(20)) => {}
            }
        }
    });

    // 3. Stubborn: ignores its token for two seconds
    let stubborn = engine.supervise_fn(token.clone(), "stubborn", |_ctx: CancellationToken| async {
        tokio::time::sleep(Duration::from_secs(2)).await;
    });

    // 4. Panicking: fails right away
    engine.supervise_fn(token.clone(), "panicking", |_ctx: CancellationToken| async {
        panic!("lost connection to upstream");
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    token.cancel();

    let outcome = stubborn.settled().await;
    tracing::info!(task = stubborn.task(), ?outcome, "stubborn task settled");

    // 5. Let the tolerance monitor tick, then shut down
    tokio::time::sleep(Duration::from_millis(500)).await;
    engine.close();
    engine.closed().await;

    Ok(())
}
