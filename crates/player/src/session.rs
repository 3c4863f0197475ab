// Session: owner of the shared output context

use crate::player::{PcmPlayer, PlayerConfig};
use lingo_core::Result;
use lingo_renderer_api::{ContextFactory, OutputContext, OutputSpec};
use once_cell::sync::OnceCell;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionConfig {
    pub output: OutputSpec,
    pub player: PlayerConfig,
}

/// Creates the output context on first use and hands the same context to
/// every player it creates
pub struct Session {
    config: SessionConfig,
    factory: Arc<dyn ContextFactory>,
    context: OnceCell<OutputContext>,
}

impl Session {
    pub fn new(factory: Arc<dyn ContextFactory>) -> Self {
        Self::with_config(factory, SessionConfig::default())
    }

    pub fn with_config(factory: Arc<dyn ContextFactory>, config: SessionConfig) -> Self {
        Self {
            config,
            factory,
            context: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The session's output context, created on the first call
    /// A failed creation is not cached; the next call tries again
    pub fn output_context(&self) -> Result<OutputContext> {
        self.context
            .get_or_try_init(|| {
                log::info!(
                    "Creating output context ({}Hz, suspended={})",
                    self.config.output.sample_rate,
                    self.config.output.start_suspended
                );
                self.factory.create_context(self.config.output)
            })
            .cloned()
    }

    pub fn create_player(&self) -> Result<PcmPlayer> {
        let context = self.output_context()?;
        Ok(PcmPlayer::new(context, self.config.player))
    }
}
