//! User-facing bot lifecycle: create, start, stop, remove

use std::sync::Arc;
use tracing::{info, warn};

use crate::bot::{BotConfig, BotStatus};
use crate::error::BotResult;
use crate::events::BotEvent;
use crate::runner::BotRuntime;
use crate::scheduler::BotScheduler;
use crate::store::{Persistence, StateStore};

pub struct BotManager {
    state: Arc<dyn StateStore>,
    persistence: Arc<dyn Persistence>,
    scheduler: BotScheduler,
}

impl BotManager {
    pub fn new(runtime: Arc<BotRuntime>) -> Self {
        Self {
            state: runtime.state().clone(),
            persistence: runtime.persistence().clone(),
            scheduler: BotScheduler::new(runtime),
        }
    }

    /// Validates, persists and registers a bot. It starts inactive.
    pub async fn create_bot(&self, config: BotConfig) -> BotResult<BotStatus> {
        config.validate()?;
        self.persistence.create_bot(&config).await?;
        self.register(config).await
    }

    async fn register(&self, config: BotConfig) -> BotResult<BotStatus> {
        let id = config.id.clone();
        info!(bot_id = %id, chain = %config.chain, "Registered bot {}", config.name);
        self.state.register_bot(config).await?;
        self.state.get_status(&id).await
    }

    /// Registers bots already held by persistence and restarts the active ones.
    pub async fn load_persisted(&self) -> BotResult<usize> {
        let records = self.persistence.list_bots().await?;
        let mut loaded = 0;
        for record in records {
            if let Err(e) = record.config.validate() {
                warn!(bot_id = %record.id, "Ignoring persisted bot: {}", e);
                continue;
            }
            if self.state.get_bot(&record.id).await.is_ok() {
                continue;
            }
            self.register(record.config).await?;
            if record.is_active {
                self.scheduler.start(&record.id).await?;
            }
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Stops the bot's schedule first, then forgets it.
    pub async fn remove_bot(&self, bot_id: &str) -> BotResult<()> {
        self.scheduler.forget(bot_id).await?;
        self.state.remove_bot(bot_id).await?;
        info!(bot_id, "Removed bot");
        Ok(())
    }

    pub async fn start_bot(&self, bot_id: &str) -> BotResult<BotStatus> {
        if self.scheduler.start(bot_id).await? {
            self.mirror_active(bot_id, true).await;
        }
        self.state.get_status(bot_id).await
    }

    pub async fn stop_bot(&self, bot_id: &str) -> BotResult<BotStatus> {
        if self.scheduler.stop(bot_id).await? {
            self.mirror_active(bot_id, false).await;
        }
        self.state.get_status(bot_id).await
    }

    async fn mirror_active(&self, bot_id: &str, active: bool) {
        if let Err(e) = self.persistence.set_bot_active(bot_id, active).await {
            self.state
                .append_event(BotEvent::warning(
                    bot_id,
                    format!("Could not persist active flag: {}", e),
                ))
                .await;
        }
    }

    pub async fn list(&self) -> Vec<(BotConfig, BotStatus)> {
        let mut bots = Vec::new();
        for config in self.state.list_bots().await {
            if let Ok(status) = self.state.get_status(&config.id).await {
                bots.push((config, status));
            }
        }
        bots
    }

    pub async fn status(&self, bot_id: &str) -> BotResult<BotStatus> {
        self.state.get_status(bot_id).await
    }

    pub async fn is_running(&self, bot_id: &str) -> bool {
        self.scheduler.is_running(bot_id).await
    }

    pub async fn events(&self) -> Vec<BotEvent> {
        self.state.events().await
    }

    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
    }
}
