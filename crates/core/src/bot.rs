//! Bot configuration, runtime status and trade records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Chain;

/// Immutable bot configuration. Field names follow the camelCase bot definition files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    pub id: String,
    pub name: String,
    pub chain: Chain,
    pub trading_pair: TradingPairHint,
    pub trading_strategy: TradingStrategy,
    pub risk_management: RiskManagement,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingPairHint {
    pub token_in: String,
    pub token_out: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingStrategy {
    pub entry_price: Decimal,
    pub take_profit_percentage: Decimal,
    pub stop_loss_percentage: Decimal,
    pub max_slippage_percentage: Decimal,
    pub trade_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskManagement {
    pub max_investment_per_trade: Decimal,
    pub daily_loss_limit: Decimal,
    pub max_open_trades: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringConfig {
    /// Seconds between cycles
    pub price_check_interval: u64,
    pub social_metrics_threshold: SocialThreshold,
    #[serde(default)]
    pub technical_indicators: TechnicalIndicators,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialThreshold {
    pub min_twitter_followers: u64,
    #[serde(default)]
    pub min_telegram_members: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    #[serde(default)]
    pub rsi: Option<RsiThresholds>,
    #[serde(default)]
    pub macd: Option<MacdSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiThresholds {
    pub period: u32,
    pub overbought: Decimal,
    pub oversold: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdSettings {
    pub enable: bool,
}

impl BotConfig {
    pub fn cycle_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.monitoring.price_check_interval)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Pending,
    Executed,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// A single position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub token_in: String,
    pub token_out: String,
    /// Address of the traded (non-stable) token, used for price lookups
    pub token_address: String,
    pub amount: Decimal,
    pub entry_price: Decimal,
    pub current_price: Decimal,
    pub timestamp: DateTime<Utc>,
    pub status: TradeStatus,
    pub side: TradeSide,
    /// Transaction id confirmed by the adapter, if any
    pub tx_id: Option<String>,
}

impl Trade {
    /// Unrealized P/L as a percentage of the entry price
    pub fn pl_percentage(&self) -> Decimal {
        if self.entry_price.is_zero() {
            return Decimal::ZERO;
        }
        (self.current_price - self.entry_price) / self.entry_price * Decimal::from(100)
    }

    /// Unrealized P/L in quote currency
    pub fn pl_value(&self) -> Decimal {
        (self.current_price - self.entry_price) * self.amount
    }
}

/// Mutable runtime state of one bot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotStatus {
    pub id: String,
    pub is_active: bool,
    pub current_price: Decimal,
    /// Aggregate P/L percentage over open trades
    pub profit_loss: Decimal,
    pub last_updated: DateTime<Utc>,
    pub open_trades: Vec<Trade>,
}

impl BotStatus {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_active: false,
            current_price: Decimal::ZERO,
            profit_loss: Decimal::ZERO,
            last_updated: Utc::now(),
            open_trades: Vec::new(),
        }
    }

    /// Running P/L across open trades: sum of (current - entry) * amount
    pub fn daily_pl(&self) -> Decimal {
        self.open_trades.iter().map(Trade::pl_value).sum()
    }

    /// Recomputes the aggregate fields after open trades changed.
    pub fn refresh_aggregates(&mut self) {
        let invested: Decimal = self
            .open_trades
            .iter()
            .map(|t| t.entry_price * t.amount)
            .sum();
        self.profit_loss = if invested.is_zero() {
            Decimal::ZERO
        } else {
            self.daily_pl() / invested * Decimal::from(100)
        };
        if let Some(last) = self.open_trades.last() {
            self.current_price = last.current_price;
        }
        self.last_updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(entry: i64, current: i64, amount: i64) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            token_in: "USDT".into(),
            token_out: "PEPE".into(),
            token_address: "0x0000000000000000000000000000000000000001".into(),
            amount: Decimal::from(amount),
            entry_price: Decimal::from(entry),
            current_price: Decimal::from(current),
            timestamp: Utc::now(),
            status: TradeStatus::Executed,
            side: TradeSide::Buy,
            tx_id: None,
        }
    }

    #[test]
    fn test_trade_pl_percentage() {
        assert_eq!(trade(100, 110, 1).pl_percentage(), Decimal::from(10));
        assert_eq!(trade(100, 80, 1).pl_percentage(), Decimal::from(-20));
        assert_eq!(trade(0, 80, 1).pl_percentage(), Decimal::ZERO);
    }

    #[test]
    fn test_daily_pl_sums_open_trades() {
        let mut status = BotStatus::new("bot-1");
        status.open_trades.push(trade(10, 12, 5)); // +10
        status.open_trades.push(trade(10, 7, 2)); // -6
        assert_eq!(status.daily_pl(), Decimal::from(4));
    }

    #[test]
    fn test_refresh_aggregates() {
        let mut status = BotStatus::new("bot-1");
        status.open_trades.push(trade(10, 11, 10));
        status.open_trades.push(trade(10, 9, 10));
        status.open_trades.push(trade(20, 22, 5));
        status.refresh_aggregates();
        // P/L = 10 - 10 + 10 = 10, invested = 100 + 100 + 100
        assert_eq!(status.profit_loss.round_dp(4), Decimal::new(33333, 4));
        assert_eq!(status.current_price, Decimal::from(22));
    }

    #[test]
    fn test_bot_config_parses_camel_case() {
        let json = r#"{
            "id": "bot-1",
            "name": "Sniper",
            "chain": "BSC",
            "tradingPair": { "tokenIn": "USDT", "tokenOut": "CAKE" },
            "tradingStrategy": {
                "entryPrice": "1.0",
                "takeProfitPercentage": "10",
                "stopLossPercentage": "5",
                "maxSlippagePercentage": "1",
                "tradeAmount": "100"
            },
            "riskManagement": {
                "maxInvestmentPerTrade": "500",
                "dailyLossLimit": "200",
                "maxOpenTrades": 3
            },
            "monitoring": {
                "priceCheckInterval": 60,
                "socialMetricsThreshold": { "minTwitterFollowers": 5000 }
            }
        }"#;
        let config: BotConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.chain, Chain::Bsc);
        assert_eq!(config.risk_management.max_open_trades, 3);
        assert_eq!(config.monitoring.social_metrics_threshold.min_telegram_members, None);
        assert!(config.monitoring.technical_indicators.rsi.is_none());
        assert_eq!(config.cycle_interval(), std::time::Duration::from_secs(60));
    }
}
