//! Append-only audit trail of bot activity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_EVENT_HISTORY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BotEventKind {
    PriceUpdate,
    TradeExecuted,
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotEvent {
    pub kind: BotEventKind,
    pub bot_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl BotEvent {
    pub fn new(kind: BotEventKind, bot_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind,
            bot_id: bot_id.map(str::to_string),
            timestamp: Utc::now(),
            message: message.into(),
            data: None,
        }
    }

    pub fn error(bot_id: &str, message: impl Into<String>) -> Self {
        Self::new(BotEventKind::Error, Some(bot_id), message)
    }

    pub fn warning(bot_id: &str, message: impl Into<String>) -> Self {
        Self::new(BotEventKind::Warning, Some(bot_id), message)
    }

    pub fn trade_executed(bot_id: &str, message: impl Into<String>) -> Self {
        Self::new(BotEventKind::TradeExecuted, Some(bot_id), message)
    }

    pub fn price_update(bot_id: &str, message: impl Into<String>) -> Self {
        Self::new(BotEventKind::PriceUpdate, Some(bot_id), message)
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Mirrors the event to the operator log at the matching level.
    pub fn trace(&self) {
        let bot = self.bot_id.as_deref().unwrap_or("-");
        match self.kind {
            BotEventKind::Error => tracing::error!(bot_id = bot, "{}", self.message),
            BotEventKind::Warning => tracing::warn!(bot_id = bot, "{}", self.message),
            BotEventKind::TradeExecuted => tracing::info!(bot_id = bot, "{}", self.message),
            BotEventKind::PriceUpdate => tracing::debug!(bot_id = bot, "{}", self.message),
        }
    }
}

/// Bounded event history, newest first. Oldest entries are pruned on insert.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<BotEvent>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, event: BotEvent) {
        self.events.push_front(event);
        self.events.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Snapshot, newest first
    pub fn recent(&self) -> Vec<BotEvent> {
        self.events.iter().cloned().collect()
    }

    pub fn for_bot(&self, bot_id: &str) -> Vec<BotEvent> {
        self.events
            .iter()
            .filter(|e| e.bot_id.as_deref() == Some(bot_id))
            .cloned()
            .collect()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_HISTORY)
    }
}
