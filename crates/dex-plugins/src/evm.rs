//! Router-based DEXes on the EVM chains

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

/// Static description of one DEX deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DexProfile {
    pub name: &'static str,
    pub chain: Chain,
    pub router: &'static str,
    pub fee_bps: u32,
}

pub const UNISWAP_V3: DexProfile = DexProfile {
    name: "Uniswap V3",
    chain: Chain::Eth,
    router: "0xE592427A0AEce92De3Edee1F18E0157C05861564",
    fee_bps: 30,
};

pub const PANCAKESWAP: DexProfile = DexProfile {
    name: "PancakeSwap",
    chain: Chain::Bsc,
    router: "0x10ED43C718714eb63d5aA57B78B54704E256024E",
    fee_bps: 25,
};

pub const TRADER_JOE: DexProfile = DexProfile {
    name: "TraderJoe",
    chain: Chain::Avax,
    router: "0x60aE616a2155Ee3d9A68541Ba4544862310933d4",
    fee_bps: 30,
};

pub struct EvmDexAdapter {
    profile: DexProfile,
    feed: Arc<dyn PriceFeed>,
    submitter: Arc<dyn TransactionSubmitter>,
}

impl EvmDexAdapter {
    pub fn new(
        profile: DexProfile,
        feed: Arc<dyn PriceFeed>,
        submitter: Arc<dyn TransactionSubmitter>,
    ) -> Self {
        Self {
            profile,
            feed,
            submitter,
        }
    }

    pub fn profile(&self) -> &DexProfile {
        &self.profile
    }

    fn check_token(&self, params: &SwapParams, token: &str) -> Result<(), AdapterError> {
        if amm::is_quote_asset(self.profile.chain, token) {
            return Ok(());
        }
        validate_address(self.profile.chain, token).map_err(|_| AdapterError::NoRouteFound {
            token_in: params.token_in.clone(),
            token_out: params.token_out.clone(),
        })
    }
}

#[async_trait]
impl ChainAdapter for EvmDexAdapter {
    fn chain(&self) -> Chain {
        self.profile.chain
    }

    fn name(&self) -> &str {
        self.profile.name
    }

    async fn quote(&self, params: &SwapParams) -> Result<Quote, AdapterError> {
        self.check_token(params, &params.token_in)?;
        self.check_token(params, &params.token_out)?;

        let chain = self.profile.chain;
        let ((price_in, depth_in), (price_out, depth_out)) = tokio::try_join!(
            amm::price_leg(self.feed.as_ref(), chain, &params.token_in),
            amm::price_leg(self.feed.as_ref(), chain, &params.token_out),
        )?;

        amm::estimate(
            params,
            price_in,
            price_out,
            amm::shallowest(&[depth_in, depth_out]),
            self.profile.fee_bps,
            vec![params.token_in.clone(), params.token_out.clone()],
        )
    }

    async fn execute(&self, params: &SwapParams) -> Result<String, AdapterError> {
        let quote = self.quote(params).await?;
        amm::check_executable(params, &quote)?;
        debug!(
            dex = self.profile.name,
            router = self.profile.router,
            "Submitting swap, deadline {}s",
            params.deadline_secs
        );
        self.submitter
            .submit(self.profile.chain, self.profile.name, params, &quote)
            .await
    }

    async fn get_price(&self, token_address: &str) -> Result<Decimal, AdapterError> {
        if amm::is_quote_asset(self.profile.chain, token_address) {
            return Ok(Decimal::ONE);
        }
        validate_address(self.profile.chain, token_address)
            .map_err(|e| AdapterError::PriceUnavailable(e.to_string()))?;
        Ok(self.feed.pool(token_address, self.profile.chain).await?.price_usd)
    }
}
