//! Constant-product estimates shared by every adapter

use dexscout_core::chain::{Quote, SwapParams};
use dexscout_core::error::{AdapterError, ExecutionFailure};
use dexscout_core::Chain;
use rust_decimal::Decimal;

use crate::price_feed::{PoolSnapshot, PriceFeed};

/// Price of `token` on `chain`. The chain's quote stablecoin is always 1.
/// Stablecoin legs report no pool depth.
pub async fn price_leg(
    feed: &dyn PriceFeed,
    chain: Chain,
    token: &str,
) -> Result<(Decimal, Option<Decimal>), AdapterError> {
    if is_quote_asset(chain, token) {
        return Ok((Decimal::ONE, None));
    }
    let PoolSnapshot {
        price_usd,
        liquidity_usd,
    } = feed.pool(token, chain).await?;
    Ok((price_usd, Some(liquidity_usd)))
}

pub fn is_quote_asset(chain: Chain, token: &str) -> bool {
    let quote = chain.quote_asset();
    chain.same_address(token, quote.address) || token.eq_ignore_ascii_case(quote.symbol)
}

/// Impact in percent of a trade of `size_usd` against a pool of `liquidity_usd`,
/// with half the liquidity on each side.
pub fn price_impact_pct(size_usd: Decimal, liquidity_usd: Decimal) -> Decimal {
    let depth = liquidity_usd / Decimal::TWO + size_usd;
    if depth.is_zero() {
        return Decimal::ZERO;
    }
    size_usd / depth * Decimal::ONE_HUNDRED
}

/// Estimates a swap through a route whose shallowest pool holds `liquidity_usd`.
pub fn estimate(
    params: &SwapParams,
    price_in: Decimal,
    price_out: Decimal,
    liquidity_usd: Option<Decimal>,
    fee_bps: u32,
    route: Vec<String>,
) -> Result<Quote, AdapterError> {
    let no_route = || AdapterError::NoRouteFound {
        token_in: params.token_in.clone(),
        token_out: params.token_out.clone(),
    };
    if price_out <= Decimal::ZERO || price_in <= Decimal::ZERO {
        return Err(no_route());
    }

    let size_usd = params.amount * price_in;
    let price_impact = match liquidity_usd {
        Some(liquidity) if liquidity <= Decimal::ZERO => return Err(no_route()),
        Some(liquidity) => price_impact_pct(size_usd, liquidity),
        None => Decimal::ZERO,
    };

    let fee = Decimal::from(fee_bps) / Decimal::from(10_000);
    let output_amount = params.amount * price_in / price_out
        * (Decimal::ONE - fee)
        * (Decimal::ONE - price_impact / Decimal::ONE_HUNDRED);

    Ok(Quote {
        input_amount: params.amount,
        output_amount,
        price_impact,
        route,
    })
}

/// Rejects swaps that cannot be executed within the caller's tolerance.
pub fn check_executable(params: &SwapParams, quote: &Quote) -> Result<(), AdapterError> {
    if params.amount <= Decimal::ZERO {
        return Err(AdapterError::ExecutionFailed(ExecutionFailure::Rejected(
            "swap amount must be positive".to_string(),
        )));
    }
    if quote.output_amount <= Decimal::ZERO {
        return Err(AdapterError::ExecutionFailed(
            ExecutionFailure::InsufficientLiquidity(format!(
                "{} -> {} yields nothing",
                params.token_in, params.token_out
            )),
        ));
    }
    if quote.price_impact > params.max_slippage_pct {
        return Err(AdapterError::ExecutionFailed(
            ExecutionFailure::SlippageExceeded {
                expected: params.max_slippage_pct,
                actual: quote.price_impact.round_dp(4),
            },
        ));
    }
    Ok(())
}

/// Shallowest of the known pool depths, if any leg has one
pub fn shallowest(depths: &[Option<Decimal>]) -> Option<Decimal> {
    depths.iter().flatten().copied().min()
}
