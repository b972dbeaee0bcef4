use std::sync::Arc;

use super::engine::Engine;
use crate::{config::Config, consumers::Consume, error::ConfigError};

/// Builder for constructing an [`Engine`].
pub struct EngineBuilder {
    cfg: Config,
    consumer: Option<Arc<dyn Consume>>,
}

impl EngineBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            consumer: None,
        }
    }

    /// Sets the consumer that receives every delivered alert.
    pub fn with_consumer(mut self, consumer: Arc<dyn Consume>) -> Self {
        self.consumer = Some(consumer);
        self
    }

    /// Validates the configuration and builds the engine.
    ///
    /// Nothing is spawned here; background loops start with [`Engine::watch`].
    pub fn build(self) -> Result<Engine, ConfigError> {
        self.cfg.validate()?;
        let consumer = self.consumer.ok_or(ConfigError::MissingConsumer)?;
        Engine::new_internal(self.cfg, consumer)
    }
}
