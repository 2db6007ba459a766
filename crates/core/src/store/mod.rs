//! Bot state: the engine's narrow state store and the remote persistence contract

pub mod journal;
pub mod persistence;
#[cfg(feature = "http")]
pub mod rest;

pub use journal::TradeJournal;
pub use persistence::{BotRecord, OfflinePersistence, Persistence, TokenAnalysisRecord, WatchlistEntry};
#[cfg(feature = "http")]
pub use rest::RestPersistence;

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::bot::{BotConfig, BotStatus, Trade};
use crate::error::{BotError, BotResult};
use crate::events::{BotEvent, EventLog};

/// What a running bot reads and writes between cycles
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Stores the config alongside a fresh, inactive status.
    async fn register_bot(&self, config: BotConfig) -> BotResult<()>;

    async fn remove_bot(&self, bot_id: &str) -> BotResult<()>;

    async fn get_bot(&self, bot_id: &str) -> BotResult<BotConfig>;

    async fn list_bots(&self) -> Vec<BotConfig>;

    async fn get_status(&self, bot_id: &str) -> BotResult<BotStatus>;

    /// Replaces the trading fields of a status. The active flag is left as stored.
    async fn update_status(&self, status: BotStatus) -> BotResult<()>;

    async fn set_active(&self, bot_id: &str, active: bool) -> BotResult<()>;

    /// Adds an open trade. Fails rather than exceed the bot's open-trade limit.
    async fn append_trade(&self, bot_id: &str, trade: Trade) -> BotResult<()>;

    async fn append_event(&self, event: BotEvent);

    /// Newest first
    async fn events(&self) -> Vec<BotEvent>;
}

fn unknown_bot(bot_id: &str) -> BotError {
    BotError::Store(format!("unknown bot {}", bot_id))
}

/// In-process store used by the engine
pub struct MemoryStateStore {
    bots: RwLock<HashMap<String, BotConfig>>,
    statuses: RwLock<HashMap<String, BotStatus>>,
    events: RwLock<EventLog>,
}

impl MemoryStateStore {
    pub fn new(event_history_limit: usize) -> Self {
        Self {
            bots: RwLock::new(HashMap::new()),
            statuses: RwLock::new(HashMap::new()),
            events: RwLock::new(EventLog::new(event_history_limit)),
        }
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self {
            bots: RwLock::new(HashMap::new()),
            statuses: RwLock::new(HashMap::new()),
            events: RwLock::new(EventLog::default()),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn register_bot(&self, config: BotConfig) -> BotResult<()> {
        let id = config.id.clone();
        let mut bots = self.bots.write().await;
        if bots.contains_key(&id) {
            return Err(BotError::Store(format!("bot {} already exists", id)));
        }
        bots.insert(id.clone(), config);
        self.statuses
            .write()
            .await
            .insert(id.clone(), BotStatus::new(id));
        Ok(())
    }

    async fn remove_bot(&self, bot_id: &str) -> BotResult<()> {
        self.bots
            .write()
            .await
            .remove(bot_id)
            .ok_or_else(|| unknown_bot(bot_id))?;
        self.statuses.write().await.remove(bot_id);
        Ok(())
    }

    async fn get_bot(&self, bot_id: &str) -> BotResult<BotConfig> {
        self.bots
            .read()
            .await
            .get(bot_id)
            .cloned()
            .ok_or_else(|| unknown_bot(bot_id))
    }

    async fn list_bots(&self) -> Vec<BotConfig> {
        let mut bots: Vec<_> = self.bots.read().await.values().cloned().collect();
        bots.sort_by(|a, b| a.id.cmp(&b.id));
        bots
    }

    async fn get_status(&self, bot_id: &str) -> BotResult<BotStatus> {
        self.statuses
            .read()
            .await
            .get(bot_id)
            .cloned()
            .ok_or_else(|| unknown_bot(bot_id))
    }

    async fn update_status(&self, status: BotStatus) -> BotResult<()> {
        let max_open = self.get_bot(&status.id).await?.risk_management.max_open_trades;
        if status.open_trades.len() > max_open {
            return Err(BotError::Store(format!(
                "bot {} would hold {} open trades (max {})",
                status.id,
                status.open_trades.len(),
                max_open
            )));
        }
        let mut statuses = self.statuses.write().await;
        let slot = statuses
            .get_mut(&status.id)
            .ok_or_else(|| unknown_bot(&status.id))?;
        let active = slot.is_active;
        *slot = status;
        slot.is_active = active;
        Ok(())
    }

    async fn set_active(&self, bot_id: &str, active: bool) -> BotResult<()> {
        let mut statuses = self.statuses.write().await;
        let status = statuses.get_mut(bot_id).ok_or_else(|| unknown_bot(bot_id))?;
        status.is_active = active;
        status.last_updated = chrono::Utc::now();
        Ok(())
    }

    async fn append_trade(&self, bot_id: &str, trade: Trade) -> BotResult<()> {
        let max_open = self.get_bot(bot_id).await?.risk_management.max_open_trades;
        let mut statuses = self.statuses.write().await;
        let status = statuses.get_mut(bot_id).ok_or_else(|| unknown_bot(bot_id))?;
        if status.open_trades.len() >= max_open {
            return Err(BotError::Store(format!(
                "bot {} already holds {} open trades",
                bot_id, max_open
            )));
        }
        status.open_trades.push(trade);
        status.refresh_aggregates();
        Ok(())
    }

    async fn append_event(&self, event: BotEvent) {
        event.trace();
        self.events.write().await.push(event);
    }

    async fn events(&self) -> Vec<BotEvent> {
        self.events.read().await.recent()
    }
}
