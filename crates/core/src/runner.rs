//! One bot cycle: discover, decide, execute, monitor

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::bot::{BotConfig, Trade, TradeStatus};
use crate::chain::{AdapterRegistry, ChainAdapter};
use crate::decision::{
    closing_trade, swap_params, DecisionOutcome, PositionAction, TradeDecisionEngine,
};
use crate::discovery::TokenScoringPipeline;
use crate::error::BotResult;
use crate::events::BotEvent;
use crate::store::{Persistence, StateStore};

/// Counters for one completed cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub analysed: usize,
    pub opened: usize,
    pub skipped: usize,
    pub failed: usize,
    pub closed: usize,
    pub held: usize,
}

/// Everything a cycle needs, shared by all bots
pub struct BotRuntime {
    pipeline: TokenScoringPipeline,
    adapters: Arc<AdapterRegistry>,
    engine: TradeDecisionEngine,
    state: Arc<dyn StateStore>,
    persistence: Arc<dyn Persistence>,
}

impl BotRuntime {
    pub fn new(
        pipeline: TokenScoringPipeline,
        adapters: Arc<AdapterRegistry>,
        state: Arc<dyn StateStore>,
        persistence: Arc<dyn Persistence>,
    ) -> Self {
        Self {
            pipeline,
            adapters,
            engine: TradeDecisionEngine::new(),
            state,
            persistence,
        }
    }

    pub fn state(&self) -> &Arc<dyn StateStore> {
        &self.state
    }

    pub fn persistence(&self) -> &Arc<dyn Persistence> {
        &self.persistence
    }

    /// Runs discovery, then every decision, then monitoring, strictly in that order.
    pub async fn run_cycle(&self, bot_id: &str) -> BotResult<CycleSummary> {
        let config = self.state.get_bot(bot_id).await?;
        let adapter = self.adapters.get_adapter(config.chain)?;
        let mut summary = CycleSummary::default();

        let report = self
            .pipeline
            .discover(config.chain, &config.monitoring.social_metrics_threshold)
            .await?;

        if let Some(error) = &report.feed_error {
            self.state
                .append_event(BotEvent::warning(bot_id, format!("Pair feed unavailable: {}", error)))
                .await;
        }
        for issue in &report.skipped {
            self.state
                .append_event(
                    BotEvent::warning(bot_id, format!("Skipped token {}: {}", issue.address, issue.error))
                        .with_data(json!({ "token": issue.address })),
                )
                .await;
        }
        summary.analysed = report.analyses.len();

        for analysis in &report.analyses {
            if let Err(e) = self.persistence.save_token_analysis(analysis).await {
                self.state
                    .append_event(BotEvent::warning(bot_id, format!("Could not persist analysis: {}", e)))
                    .await;
            }

            let status = self.state.get_status(bot_id).await?;
            match self.engine.evaluate(&config, &status, analysis) {
                DecisionOutcome::OpenTrade(trade) => {
                    if self.open_position(&config, adapter.as_ref(), trade).await {
                        summary.opened += 1;
                    } else {
                        summary.failed += 1;
                    }
                }
                DecisionOutcome::Skip(reason) => {
                    debug!(bot_id, token = %analysis.token.symbol, "Skip: {}", reason);
                    summary.skipped += 1;
                }
            }
        }

        self.monitor_positions(&config, adapter.as_ref(), &mut summary)
            .await?;

        info!(
            bot_id,
            "Cycle done: {} analysed, {} opened, {} closed, {} held",
            summary.analysed,
            summary.opened,
            summary.closed,
            summary.held
        );
        Ok(summary)
    }

    /// Executes an approved BUY. Only a confirmed transaction becomes an open trade.
    /// Returns false when no position was added.
    async fn open_position(
        &self,
        config: &BotConfig,
        adapter: &dyn ChainAdapter,
        mut trade: Trade,
    ) -> bool {
        let params = swap_params(config, &trade);
        match adapter.execute(&params).await {
            Ok(tx_id) => {
                trade.tx_id = Some(tx_id.clone());
                trade.status = TradeStatus::Executed;
                if let Err(e) = self.state.append_trade(&config.id, trade.clone()).await {
                    // The swap is on chain; keep its record even though the position is untracked.
                    self.state
                        .append_event(
                            BotEvent::error(
                                &config.id,
                                format!(
                                    "Bought {} in {} but could not track the position: {}",
                                    trade.token_out, tx_id, e
                                ),
                            )
                            .with_data(json!(trade)),
                        )
                        .await;
                    self.persist_trade(&config.id, &trade).await;
                    return false;
                }
                self.state
                    .append_event(
                        BotEvent::trade_executed(
                            &config.id,
                            format!(
                                "Bought {} {} at {} ({})",
                                trade.amount, trade.token_out, trade.entry_price, tx_id
                            ),
                        )
                        .with_data(json!(trade)),
                    )
                    .await;
                self.persist_trade(&config.id, &trade).await;
                true
            }
            Err(e) => {
                trade.status = TradeStatus::Failed;
                self.state
                    .append_event(
                        BotEvent::error(&config.id, format!("Buy of {} failed: {}", trade.token_out, e))
                            .with_data(json!({ "token": trade.token_address })),
                    )
                    .await;
                self.persist_trade(&config.id, &trade).await;
                false
            }
        }
    }

    async fn monitor_positions(
        &self,
        config: &BotConfig,
        adapter: &dyn ChainAdapter,
        summary: &mut CycleSummary,
    ) -> BotResult<()> {
        let mut status = self.state.get_status(&config.id).await?;
        if status.open_trades.is_empty() {
            return Ok(());
        }

        let outcome = self
            .engine
            .monitor(config, adapter, &status.open_trades)
            .await;

        for failure in &outcome.failures {
            self.state
                .append_event(BotEvent::warning(
                    &config.id,
                    format!("Price unavailable for {}: {}", failure.token_address, failure.error),
                ))
                .await;
        }

        let mut remaining = Vec::with_capacity(status.open_trades.len());
        for position in status.open_trades.drain(..) {
            let Some(check) = outcome.checks.iter().find(|c| c.trade.id == position.id) else {
                remaining.push(position);
                continue;
            };

            match check.action {
                PositionAction::Hold => {
                    summary.held += 1;
                    remaining.push(check.trade.clone());
                }
                PositionAction::Close => {
                    if self.close_position(config, adapter, &check.trade).await {
                        summary.closed += 1;
                    } else {
                        remaining.push(check.trade.clone());
                    }
                }
            }
        }

        status.open_trades = remaining;
        status.refresh_aggregates();
        self.state
            .append_event(BotEvent::price_update(
                &config.id,
                format!(
                    "{} open positions, P/L {}%",
                    status.open_trades.len(),
                    status.profit_loss.round_dp(2)
                ),
            ))
            .await;
        self.state.update_status(status).await
    }

    /// Sells a position. On failure the position stays open.
    async fn close_position(&self, config: &BotConfig, adapter: &dyn ChainAdapter, position: &Trade) -> bool {
        let mut sell = closing_trade(config, position);
        match adapter.execute(&swap_params(config, &sell)).await {
            Ok(tx_id) => {
                sell.tx_id = Some(tx_id.clone());
                self.state
                    .append_event(
                        BotEvent::trade_executed(
                            &config.id,
                            format!(
                                "Sold {} {} at {} ({}% P/L, {})",
                                sell.amount,
                                sell.token_in,
                                sell.current_price,
                                position.pl_percentage().round_dp(2),
                                tx_id
                            ),
                        )
                        .with_data(json!(sell)),
                    )
                    .await;
                self.persist_trade(&config.id, &sell).await;
                true
            }
            Err(e) => {
                self.state
                    .append_event(BotEvent::error(
                        &config.id,
                        format!("Sell of {} failed: {}", position.token_out, e),
                    ))
                    .await;
                false
            }
        }
    }

    async fn persist_trade(&self, bot_id: &str, trade: &Trade) {
        if let Err(e) = self.persistence.record_trade(bot_id, trade).await {
            self.state
                .append_event(BotEvent::warning(bot_id, format!("Could not persist trade: {}", e)))
                .await;
        }
    }
}
