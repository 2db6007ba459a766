//! Risk-gated trade decisions and position monitoring

use chrono::Utc;
use futures_util::future::join_all;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::bot::{BotConfig, BotStatus, Trade, TradeSide, TradeStatus};
use crate::chain::{ChainAdapter, SwapParams};
use crate::error::AdapterError;
use crate::types::TokenAnalysis;

/// Seconds a submitted swap stays valid
pub const SWAP_DEADLINE_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoBuySignal,
    MaxOpenTrades,
    DailyLossLimit,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            SkipReason::NoBuySignal => "no buy signal",
            SkipReason::MaxOpenTrades => "max open trades reached",
            SkipReason::DailyLossLimit => "daily loss limit reached",
        };
        write!(f, "{}", reason)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    /// A BUY the caller must still execute before recording it
    OpenTrade(Trade),
    Skip(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionAction {
    Hold,
    Close,
}

/// One open trade after its price was refreshed
#[derive(Debug, Clone, PartialEq)]
pub struct PositionCheck {
    pub trade: Trade,
    pub action: PositionAction,
    pub pl_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceFailure {
    pub trade_id: Uuid,
    pub token_address: String,
    pub error: AdapterError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorOutcome {
    pub checks: Vec<PositionCheck>,
    pub failures: Vec<PriceFailure>,
}

impl MonitorOutcome {
    pub fn to_close(&self) -> impl Iterator<Item = &PositionCheck> {
        self.checks.iter().filter(|c| c.action == PositionAction::Close)
    }
}

/// Stateless decision rules. All state lives in the [`BotStatus`] passed in.
#[derive(Debug, Clone, Copy, Default)]
pub struct TradeDecisionEngine;

impl TradeDecisionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Applies the buy-signal, exposure and loss gates in order.
    pub fn evaluate(
        &self,
        config: &BotConfig,
        status: &BotStatus,
        analysis: &TokenAnalysis,
    ) -> DecisionOutcome {
        if !analysis.buy_signal {
            return DecisionOutcome::Skip(SkipReason::NoBuySignal);
        }

        if status.open_trades.len() >= config.risk_management.max_open_trades {
            return DecisionOutcome::Skip(SkipReason::MaxOpenTrades);
        }

        if status.daily_pl() <= -config.risk_management.daily_loss_limit {
            return DecisionOutcome::Skip(SkipReason::DailyLossLimit);
        }

        let token = &analysis.token;
        DecisionOutcome::OpenTrade(Trade {
            id: Uuid::new_v4(),
            token_in: config.chain.quote_asset().symbol.to_string(),
            token_out: token.symbol.clone(),
            token_address: token.address.clone(),
            amount: config.trading_strategy.trade_amount,
            entry_price: token.price,
            current_price: token.price,
            timestamp: Utc::now(),
            status: TradeStatus::Executed,
            side: TradeSide::Buy,
            tx_id: None,
        })
    }

    /// CLOSE when take-profit or stop-loss is reached, both inclusive.
    pub fn position_action(&self, config: &BotConfig, trade: &Trade) -> PositionAction {
        let pl = trade.pl_percentage();
        let strategy = &config.trading_strategy;
        if pl >= strategy.take_profit_percentage || pl <= -strategy.stop_loss_percentage {
            PositionAction::Close
        } else {
            PositionAction::Hold
        }
    }

    /// Refreshes every open trade's price through `adapter` and classifies it.
    /// A failed lookup is reported and leaves the other trades unaffected.
    pub async fn monitor(
        &self,
        config: &BotConfig,
        adapter: &dyn ChainAdapter,
        open_trades: &[Trade],
    ) -> MonitorOutcome {
        let prices = join_all(
            open_trades
                .iter()
                .map(|trade| adapter.get_price(&trade.token_address)),
        )
        .await;

        let mut outcome = MonitorOutcome::default();
        for (trade, price) in open_trades.iter().zip(prices) {
            match price {
                Ok(price) => {
                    let mut trade = trade.clone();
                    trade.current_price = price;
                    let action = self.position_action(config, &trade);
                    outcome.checks.push(PositionCheck {
                        pl_percentage: trade.pl_percentage(),
                        trade,
                        action,
                    });
                }
                Err(error) => outcome.failures.push(PriceFailure {
                    trade_id: trade.id,
                    token_address: trade.token_address.clone(),
                    error,
                }),
            }
        }
        outcome
    }
}

/// The SELL that closes `position` at its refreshed price.
pub fn closing_trade(config: &BotConfig, position: &Trade) -> Trade {
    Trade {
        id: Uuid::new_v4(),
        token_in: position.token_out.clone(),
        token_out: config.chain.quote_asset().symbol.to_string(),
        token_address: position.token_address.clone(),
        amount: position.amount,
        entry_price: position.entry_price,
        current_price: position.current_price,
        timestamp: Utc::now(),
        status: TradeStatus::Executed,
        side: TradeSide::Sell,
        tx_id: None,
    }
}

/// Tokens bought by a position. `Trade::amount` is quote-asset notional.
pub fn token_quantity(trade: &Trade) -> Decimal {
    if trade.entry_price <= Decimal::ZERO {
        return trade.amount;
    }
    trade.amount / trade.entry_price
}

/// Swap parameters for executing `trade` on the bot's chain.
/// A BUY spends quote notional, a SELL spends the tokens the position holds.
pub fn swap_params(config: &BotConfig, trade: &Trade) -> SwapParams {
    let quote = config.chain.quote_asset().address.to_string();
    let (token_in, token_out, amount) = match trade.side {
        TradeSide::Buy => (quote, trade.token_address.clone(), trade.amount),
        TradeSide::Sell => (trade.token_address.clone(), quote, token_quantity(trade)),
    };
    SwapParams {
        token_in,
        token_out,
        amount,
        max_slippage_pct: config.trading_strategy.max_slippage_percentage,
        deadline_secs: SWAP_DEADLINE_SECS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{open_trade, sample_analysis, sample_config, MockAdapter};
    use crate::types::Chain;

    #[test]
    fn test_no_buy_signal_skips_first() {
        let config = sample_config(Chain::Eth);
        let mut analysis = sample_analysis(Chain::Eth);
        analysis.buy_signal = false;
        let engine = TradeDecisionEngine::new();
        assert_eq!(
            engine.evaluate(&config, &BotStatus::new("bot-eth"), &analysis),
            DecisionOutcome::Skip(SkipReason::NoBuySignal)
        );
    }

    #[test]
    fn test_open_trade_uses_analysis_price() {
        let config = sample_config(Chain::Eth);
        let analysis = sample_analysis(Chain::Eth);
        let outcome = TradeDecisionEngine::new().evaluate(&config, &BotStatus::new("bot-eth"), &analysis);
        let DecisionOutcome::OpenTrade(trade) = outcome else {
            panic!("expected OpenTrade, got {:?}", outcome);
        };
        assert_eq!(trade.entry_price, analysis.token.price);
        assert_eq!(trade.current_price, analysis.token.price);
        assert_eq!(trade.amount, config.trading_strategy.trade_amount);
        assert_eq!(trade.side, TradeSide::Buy);
        assert_eq!(trade.token_in, "USDT");
    }

    #[test]
    fn test_loss_limit_boundary_is_inclusive() {
        let config = sample_config(Chain::Eth);
        let limit = config.risk_management.daily_loss_limit;
        let mut status = BotStatus::new("bot-eth");
        // amount 100, down 2.0 per unit => -200 == -limit
        status
            .open_trades
            .push(open_trade(Decimal::from(10), Decimal::from(8), Decimal::from(100)));
        assert_eq!(status.daily_pl(), -limit);

        let outcome = TradeDecisionEngine::new().evaluate(&config, &status, &sample_analysis(Chain::Eth));
        assert_eq!(outcome, DecisionOutcome::Skip(SkipReason::DailyLossLimit));
    }

    #[test]
    fn test_stop_loss_boundary_closes() {
        let config = sample_config(Chain::Eth);
        let engine = TradeDecisionEngine::new();
        let trade = open_trade(Decimal::from(100), Decimal::from(95), Decimal::ONE);
        assert_eq!(engine.position_action(&config, &trade), PositionAction::Close);

        let trade = open_trade(Decimal::from(100), Decimal::new(9501, 2), Decimal::ONE);
        assert_eq!(engine.position_action(&config, &trade), PositionAction::Hold);
    }

    #[tokio::test]
    async fn test_monitor_isolates_price_failures() {
        let config = sample_config(Chain::Bsc);
        let adapter = MockAdapter::new(Chain::Bsc);
        let good = open_trade(Decimal::ONE, Decimal::ONE, Decimal::ONE);
        let mut bad = open_trade(Decimal::ONE, Decimal::ONE, Decimal::ONE);
        bad.token_address = "0x00000000000000000000000000000000000000bb".into();
        adapter.set_price(&good.token_address, Decimal::new(120, 2));
        adapter.fail_price(&bad.token_address);

        let outcome = TradeDecisionEngine::new()
            .monitor(&config, &adapter, &[bad.clone(), good.clone()])
            .await;
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].trade_id, bad.id);
        assert_eq!(outcome.checks.len(), 1);
        assert_eq!(outcome.checks[0].trade.current_price, Decimal::new(120, 2));
        assert_eq!(outcome.checks[0].action, PositionAction::Close);
        assert_eq!(outcome.to_close().count(), 1);
    }

    #[test]
    fn test_swap_params_direction() {
        let config = sample_config(Chain::Sol);
        let buy = open_trade(Decimal::ONE, Decimal::ONE, Decimal::from(5));
        let params = swap_params(&config, &buy);
        assert_eq!(params.token_in, Chain::Sol.quote_asset().address);
        assert_eq!(params.token_out, buy.token_address);

        let sell = closing_trade(&config, &buy);
        let params = swap_params(&config, &sell);
        assert_eq!(params.token_in, buy.token_address);
        assert_eq!(sell.side, TradeSide::Sell);
        assert_eq!(sell.token_out, "USDC");
    }

    #[test]
    fn test_sell_spends_token_quantity() {
        let config = sample_config(Chain::Eth);
        // 100 quote bought at 0.25 => 400 tokens
        let mut position = open_trade(Decimal::new(25, 2), Decimal::new(30, 2), Decimal::from(100));
        let buy = swap_params(&config, &position);
        assert_eq!(buy.amount, Decimal::from(100));

        let sell = swap_params(&config, &closing_trade(&config, &position));
        assert_eq!(sell.amount, Decimal::from(400));

        position.entry_price = Decimal::ZERO;
        assert_eq!(token_quantity(&position), Decimal::from(100));
    }
}
