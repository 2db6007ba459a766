//! Jupiter aggregator on Solana

use async_trait::async_trait;
use dexscout_core::chain::{ChainAdapter, Quote, SwapParams};
use dexscout_core::error::AdapterError;
use dexscout_core::validation::validate_address;
use dexscout_core::Chain;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

use crate::amm;
use crate::paper::TransactionSubmitter;
use crate::price_feed::PriceFeed;

pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Jupiter charges no protocol fee; pool fees are folded into impact.
const JUPITER_FEE_BPS: u32 = 0;
const DEX_NAME: &str = "Jupiter";

pub struct JupiterAdapter {
    feed: Arc<dyn PriceFeed>,
    submitter: Arc<dyn TransactionSubmitter>,
}

fn is_sol(token: &str) -> bool {
    token == SOL_MINT || token.eq_ignore_ascii_case("SOL")
}

impl JupiterAdapter {
    pub fn new(feed: Arc<dyn PriceFeed>, submitter: Arc<dyn TransactionSubmitter>) -> Self {
        Self { feed, submitter }
    }

    /// Direct when one side is SOL, otherwise hops through SOL.
    pub fn route(token_in: &str, token_out: &str) -> Vec<String> {
        if is_sol(token_in) || is_sol(token_out) {
            vec![token_in.to_string(), token_out.to_string()]
        } else {
            vec![
                token_in.to_string(),
                "SOL".to_string(),
                token_out.to_string(),
            ]
        }
    }

    fn check_mint(&self, params: &SwapParams, mint: &str) -> Result<(), AdapterError> {
        if is_sol(mint) || amm::is_quote_asset(Chain::Sol, mint) {
            return Ok(());
        }
        validate_address(Chain::Sol, mint).map_err(|_| AdapterError::NoRouteFound {
            token_in: params.token_in.clone(),
            token_out: params.token_out.clone(),
        })
    }

    async fn leg(&self, mint: &str) -> Result<(Decimal, Option<Decimal>), AdapterError> {
        let mint = if mint.eq_ignore_ascii_case("SOL") { SOL_MINT } else { mint };
        amm::price_leg(self.feed.as_ref(), Chain::Sol, mint).await
    }
}

#[async_trait]
impl ChainAdapter for JupiterAdapter {
    fn chain(&self) -> Chain {
        Chain::Sol
    }

    fn name(&self) -> &str {
        DEX_NAME
    }

    async fn quote(&self, params: &SwapParams) -> Result<Quote, AdapterError> {
        self.check_mint(params, &params.token_in)?;
        self.check_mint(params, &params.token_out)?;

        let ((price_in, depth_in), (price_out, depth_out)) =
            tokio::try_join!(self.leg(&params.token_in), self.leg(&params.token_out))?;

        let route = Self::route(&params.token_in, &params.token_out);
        // The SOL hop is assumed deeper than either token pool.
        amm::estimate(
            params,
            price_in,
            price_out,
            amm::shallowest(&[depth_in, depth_out]),
            JUPITER_FEE_BPS,
            route,
        )
    }

    async fn execute(&self, params: &SwapParams) -> Result<String, AdapterError> {
        let quote = self.quote(params).await?;
        amm::check_executable(params, &quote)?;
        debug!(dex = DEX_NAME, "Submitting swap via {} hops", quote.route.len() - 1);
        self.submitter
            .submit(Chain::Sol, DEX_NAME, params, &quote)
            .await
    }

    async fn get_price(&self, token_address: &str) -> Result<Decimal, AdapterError> {
        if amm::is_quote_asset(Chain::Sol, token_address) {
            return Ok(Decimal::ONE);
        }
        validate_address(Chain::Sol, token_address)
            .map_err(|e| AdapterError::PriceUnavailable(e.to_string()))?;
        Ok(self.feed.pool(token_address, Chain::Sol).await?.price_usd)
    }
}
