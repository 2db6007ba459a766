//! Input validation. Everything here runs before any network call.

use rust_decimal::Decimal;

use crate::bot::BotConfig;
use crate::error::{BotError, BotResult};
use crate::types::{Chain, ChainFamily};

/// Checks that `address` is well formed for `chain`.
pub fn validate_address(chain: Chain, address: &str) -> BotResult<()> {
    match chain.family() {
        ChainFamily::Evm => {
            let hex_part = address
                .strip_prefix("0x")
                .or_else(|| address.strip_prefix("0X"))
                .ok_or_else(|| {
                    BotError::Validation(format!("{} address must start with 0x: {}", chain, address))
                })?;
            if hex_part.len() != 40 {
                return Err(BotError::Validation(format!(
                    "{} address must be 20 bytes: {}",
                    chain, address
                )));
            }
            hex::decode(hex_part).map_err(|e| {
                BotError::Validation(format!("invalid {} address {}: {}", chain, address, e))
            })?;
        }
        ChainFamily::Solana => {
            let bytes = bs58::decode(address).into_vec().map_err(|e| {
                BotError::Validation(format!("invalid {} address {}: {}", chain, address, e))
            })?;
            if bytes.len() != 32 {
                return Err(BotError::Validation(format!(
                    "{} address must be 32 bytes, got {}: {}",
                    chain,
                    bytes.len(),
                    address
                )));
            }
        }
    }
    Ok(())
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> BotResult<()> {
    if condition {
        Ok(())
    } else {
        Err(BotError::Validation(message()))
    }
}

impl BotConfig {
    /// Rejects configurations the engine cannot run safely.
    pub fn validate(&self) -> BotResult<()> {
        let hundred = Decimal::from(100);
        let strategy = &self.trading_strategy;
        let risk = &self.risk_management;

        ensure(!self.id.trim().is_empty(), || "bot id must not be empty".into())?;
        ensure(!self.name.trim().is_empty(), || "bot name must not be empty".into())?;
        ensure(strategy.take_profit_percentage > Decimal::ZERO, || {
            "take profit percentage must be positive".into()
        })?;
        ensure(
            strategy.stop_loss_percentage > Decimal::ZERO && strategy.stop_loss_percentage <= hundred,
            || "stop loss percentage must be within (0, 100]".into(),
        )?;
        ensure(
            strategy.max_slippage_percentage >= Decimal::ZERO
                && strategy.max_slippage_percentage <= hundred,
            || "max slippage percentage must be within [0, 100]".into(),
        )?;
        ensure(strategy.trade_amount > Decimal::ZERO, || {
            "trade amount must be positive".into()
        })?;
        ensure(strategy.trade_amount <= risk.max_investment_per_trade, || {
            format!(
                "trade amount {} exceeds max investment per trade {}",
                strategy.trade_amount, risk.max_investment_per_trade
            )
        })?;
        ensure(risk.max_open_trades >= 1, || {
            "max open trades must be at least 1".into()
        })?;
        ensure(risk.daily_loss_limit >= Decimal::ZERO, || {
            "daily loss limit must not be negative".into()
        })?;
        ensure(self.monitoring.price_check_interval >= 1, || {
            "price check interval must be at least 1 second".into()
        })?;
        Ok(())
    }
}
