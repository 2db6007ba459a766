//! Remote persistence contract and the offline fallback

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::RwLock;

use super::journal::TradeJournal;
use crate::bot::{BotConfig, Trade};
use crate::error::{BotError, BotResult};
use crate::types::{Chain, RiskLevel, RiskMetrics, SocialSnapshot, TokenAnalysis};

/// Token analyses returned by [`Persistence::list_token_analyses`]
pub const RECENT_ANALYSES_LIMIT: usize = 50;
/// Trades kept in memory by the offline backend. The journal holds the full history.
pub const OFFLINE_TRADE_LIMIT: usize = 1_000;

/// A persisted bot row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotRecord {
    pub id: String,
    pub is_active: bool,
    pub config: BotConfig,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub token_address: String,
    pub chain: Chain,
    pub symbol: String,
    pub name: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAnalysisRecord {
    pub token_address: String,
    pub chain: Chain,
    pub market_cap: Decimal,
    pub price: Decimal,
    pub volume_24h: Decimal,
    pub social_metrics: SocialSnapshot,
    pub risk_metrics: RiskMetrics,
    pub risk_level: RiskLevel,
    pub buy_signal: bool,
    pub analysis_points: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

impl From<&TokenAnalysis> for TokenAnalysisRecord {
    fn from(analysis: &TokenAnalysis) -> Self {
        let token = &analysis.token;
        Self {
            token_address: token.address.clone(),
            chain: token.chain,
            market_cap: token.market_cap,
            price: token.price,
            volume_24h: token.volume_24h,
            social_metrics: token.social.clone(),
            risk_metrics: token.risk.clone(),
            risk_level: analysis.risk_level,
            buy_signal: analysis.buy_signal,
            analysis_points: analysis.analysis.clone(),
            analyzed_at: analysis.analyzed_at,
        }
    }
}

/// Request/response CRUD against the durable store
#[async_trait]
pub trait Persistence: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn create_bot(&self, config: &BotConfig) -> BotResult<BotRecord>;

    /// Newest first
    async fn list_bots(&self) -> BotResult<Vec<BotRecord>>;

    async fn set_bot_active(&self, bot_id: &str, active: bool) -> BotResult<()>;

    async fn record_trade(&self, bot_id: &str, trade: &Trade) -> BotResult<()>;

    async fn add_to_watchlist(&self, entry: &WatchlistEntry) -> BotResult<()>;

    /// Newest first
    async fn list_watchlist(&self) -> BotResult<Vec<WatchlistEntry>>;

    async fn remove_from_watchlist(&self, token_address: &str) -> BotResult<()>;

    async fn save_token_analysis(&self, analysis: &TokenAnalysis) -> BotResult<()>;

    /// The most recent [`RECENT_ANALYSES_LIMIT`] analyses, newest first
    async fn list_token_analyses(&self) -> BotResult<Vec<TokenAnalysisRecord>>;
}

#[derive(Default)]
struct OfflineTables {
    bots: Vec<BotRecord>,
    /// Oldest first
    trades: VecDeque<(String, Trade)>,
    watchlist: Vec<WatchlistEntry>,
    /// Newest first
    analyses: VecDeque<TokenAnalysisRecord>,
}

/// In-memory persistence for demo mode, optionally journaling trades to disk
#[derive(Default)]
pub struct OfflinePersistence {
    tables: RwLock<OfflineTables>,
    journal: Option<TradeJournal>,
}

impl OfflinePersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: TradeJournal) -> Self {
        Self {
            tables: RwLock::default(),
            journal: Some(journal),
        }
    }

    pub async fn trades_for(&self, bot_id: &str) -> Vec<Trade> {
        self.tables
            .read()
            .await
            .trades
            .iter()
            .filter(|(id, _)| id == bot_id)
            .map(|(_, trade)| trade.clone())
            .collect()
    }
}

#[async_trait]
impl Persistence for OfflinePersistence {
    fn backend(&self) -> &'static str {
        "offline"
    }

    async fn create_bot(&self, config: &BotConfig) -> BotResult<BotRecord> {
        let mut tables = self.tables.write().await;
        if tables.bots.iter().any(|b| b.id == config.id) {
            return Err(BotError::Store(format!("bot {} already exists", config.id)));
        }
        let record = BotRecord {
            id: config.id.clone(),
            is_active: false,
            config: config.clone(),
            created_at: Utc::now(),
        };
        tables.bots.push(record.clone());
        Ok(record)
    }

    async fn list_bots(&self) -> BotResult<Vec<BotRecord>> {
        let mut bots = self.tables.read().await.bots.clone();
        bots.reverse();
        Ok(bots)
    }

    async fn set_bot_active(&self, bot_id: &str, active: bool) -> BotResult<()> {
        let mut tables = self.tables.write().await;
        let record = tables
            .bots
            .iter_mut()
            .find(|b| b.id == bot_id)
            .ok_or_else(|| BotError::Store(format!("unknown bot {}", bot_id)))?;
        record.is_active = active;
        Ok(())
    }

    async fn record_trade(&self, bot_id: &str, trade: &Trade) -> BotResult<()> {
        if let Some(journal) = &self.journal {
            journal.record(bot_id, trade)?;
        }
        let mut tables = self.tables.write().await;
        tables.trades.push_back((bot_id.to_string(), trade.clone()));
        if tables.trades.len() > OFFLINE_TRADE_LIMIT {
            tables.trades.pop_front();
        }
        Ok(())
    }

    async fn add_to_watchlist(&self, entry: &WatchlistEntry) -> BotResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .watchlist
            .retain(|e| !(e.token_address == entry.token_address && e.chain == entry.chain));
        tables.watchlist.push(entry.clone());
        Ok(())
    }

    async fn list_watchlist(&self) -> BotResult<Vec<WatchlistEntry>> {
        let mut entries = self.tables.read().await.watchlist.clone();
        entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(entries)
    }

    async fn remove_from_watchlist(&self, token_address: &str) -> BotResult<()> {
        self.tables
            .write()
            .await
            .watchlist
            .retain(|e| e.token_address != token_address);
        Ok(())
    }

    async fn save_token_analysis(&self, analysis: &TokenAnalysis) -> BotResult<()> {
        let mut tables = self.tables.write().await;
        tables.analyses.push_front(TokenAnalysisRecord::from(analysis));
        tables.analyses.truncate(RECENT_ANALYSES_LIMIT);
        Ok(())
    }

    async fn list_token_analyses(&self) -> BotResult<Vec<TokenAnalysisRecord>> {
        let tables = self.tables.read().await;
        let mut analyses: Vec<_> = tables.analyses.iter().cloned().collect();
        analyses.sort_by(|a, b| b.analyzed_at.cmp(&a.analyzed_at));
        Ok(analyses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{open_trade, sample_analysis, sample_config};

    #[tokio::test]
    async fn test_bot_lifecycle() {
        let store = OfflinePersistence::new();
        let created = store.create_bot(&sample_config(Chain::Eth)).await.unwrap();
        assert!(!created.is_active);
        assert!(store.create_bot(&sample_config(Chain::Eth)).await.is_err());

        store.set_bot_active("bot-eth", true).await.unwrap();
        let bots = store.list_bots().await.unwrap();
        assert!(bots[0].is_active);
        assert!(store.set_bot_active("missing", true).await.is_err());
    }

    #[tokio::test]
    async fn test_analyses_capped_at_fifty() {
        let store = OfflinePersistence::new();
        let analysis = sample_analysis(Chain::Sol);
        for _ in 0..60 {
            store.save_token_analysis(&analysis).await.unwrap();
        }
        let recent = store.list_token_analyses().await.unwrap();
        assert_eq!(recent.len(), RECENT_ANALYSES_LIMIT);
        assert_eq!(recent[0].risk_level, analysis.risk_level);
        assert_eq!(store.tables.read().await.analyses.len(), RECENT_ANALYSES_LIMIT);
    }

    #[tokio::test]
    async fn test_analyses_pruned_on_insert_keeping_newest() {
        let store = OfflinePersistence::new();
        let mut analysis = sample_analysis(Chain::Eth);
        for i in 0..(RECENT_ANALYSES_LIMIT + 5) {
            analysis.token.address = format!("T{}", i);
            store.save_token_analysis(&analysis).await.unwrap();
        }
        let tables = store.tables.read().await;
        assert_eq!(tables.analyses.len(), RECENT_ANALYSES_LIMIT);
        assert_eq!(tables.analyses[0].token_address, format!("T{}", RECENT_ANALYSES_LIMIT + 4));
        assert!(tables.analyses.iter().all(|a| a.token_address != "T0"));
    }

    #[tokio::test]
    async fn test_offline_trades_bounded() {
        let store = OfflinePersistence::new();
        let trade = open_trade(Decimal::ONE, Decimal::ONE, Decimal::ONE);
        for _ in 0..(OFFLINE_TRADE_LIMIT + 10) {
            store.record_trade("a", &trade).await.unwrap();
        }
        assert_eq!(store.trades_for("a").await.len(), OFFLINE_TRADE_LIMIT);
    }

    #[tokio::test]
    async fn test_watchlist_dedupes_and_removes() {
        let store = OfflinePersistence::new();
        let entry = WatchlistEntry {
            token_address: "0x00000000000000000000000000000000000000a1".into(),
            chain: Chain::Eth,
            symbol: "PEPE".into(),
            name: "Pepe".into(),
            added_at: Utc::now(),
        };
        store.add_to_watchlist(&entry).await.unwrap();
        store.add_to_watchlist(&entry).await.unwrap();
        assert_eq!(store.list_watchlist().await.unwrap().len(), 1);

        store.remove_from_watchlist(&entry.token_address).await.unwrap();
        assert!(store.list_watchlist().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trades_recorded_per_bot() {
        let store = OfflinePersistence::new();
        let trade = open_trade(Decimal::ONE, Decimal::ONE, Decimal::ONE);
        store.record_trade("a", &trade).await.unwrap();
        store.record_trade("b", &trade).await.unwrap();
        assert_eq!(store.trades_for("a").await.len(), 1);
    }
}
