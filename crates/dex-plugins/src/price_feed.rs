//! Pool price and depth lookups backing the adapters

use async_trait::async_trait;
use dexscout_core::error::AdapterError;
use dexscout_core::providers::dexscreener::DexScreenerClient;
use dexscout_core::Chain;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Price and depth of the deepest pool trading a token
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSnapshot {
    pub price_usd: Decimal,
    pub liquidity_usd: Decimal,
}

#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn pool(&self, token_address: &str, chain: Chain) -> Result<PoolSnapshot, AdapterError>;
}

/// Reads the deepest DexScreener pair for a token
pub struct DexScreenerPriceFeed {
    client: Arc<DexScreenerClient>,
}

impl DexScreenerPriceFeed {
    pub fn new(client: Arc<DexScreenerClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PriceFeed for DexScreenerPriceFeed {
    async fn pool(&self, token_address: &str, chain: Chain) -> Result<PoolSnapshot, AdapterError> {
        let pair = self
            .client
            .best_pair_for_token(token_address, chain)
            .await
            .map_err(|e| AdapterError::PriceUnavailable(format!("{}: {}", token_address, e)))?
            .ok_or_else(|| AdapterError::PriceUnavailable(token_address.to_string()))?;

        if pair.price_usd <= Decimal::ZERO {
            return Err(AdapterError::PriceUnavailable(format!(
                "{}: pool reports no price",
                token_address
            )));
        }

        Ok(PoolSnapshot {
            price_usd: pair.price_usd,
            liquidity_usd: pair.liquidity_usd,
        })
    }
}

/// Fixed pools, for demos and tests
#[derive(Default)]
pub struct StaticPriceFeed {
    pools: RwLock<HashMap<(Chain, String), PoolSnapshot>>,
}

impl StaticPriceFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_pool(&self, chain: Chain, token_address: &str, price_usd: Decimal, liquidity_usd: Decimal) {
        self.pools.write().await.insert(
            (chain, chain.address_key(token_address)),
            PoolSnapshot {
                price_usd,
                liquidity_usd,
            },
        );
    }
}

#[async_trait]
impl PriceFeed for StaticPriceFeed {
    async fn pool(&self, token_address: &str, chain: Chain) -> Result<PoolSnapshot, AdapterError> {
        self.pools
            .read()
            .await
            .get(&(chain, chain.address_key(token_address)))
            .cloned()
            .ok_or_else(|| AdapterError::PriceUnavailable(token_address.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
    const PEPE: &str = "0x6982508145454Ce325dDbE47a25d4ec3d2311933";

    #[tokio::test]
    async fn test_evm_lookup_ignores_case() {
        let feed = StaticPriceFeed::new();
        feed.set_pool(Chain::Eth, PEPE, Decimal::ONE, Decimal::from(1_000)).await;

        let pool = feed.pool(&PEPE.to_ascii_lowercase(), Chain::Eth).await.unwrap();
        assert_eq!(pool.price_usd, Decimal::ONE);
        assert!(feed.pool(PEPE, Chain::Bsc).await.is_err());
    }

    #[tokio::test]
    async fn test_solana_mints_differing_in_case_are_distinct() {
        let feed = StaticPriceFeed::new();
        let shadow = BONK.to_ascii_lowercase();
        feed.set_pool(Chain::Sol, BONK, Decimal::ONE, Decimal::from(1_000)).await;
        feed.set_pool(Chain::Sol, &shadow, Decimal::TWO, Decimal::from(10)).await;

        assert_eq!(feed.pool(BONK, Chain::Sol).await.unwrap().price_usd, Decimal::ONE);
        assert_eq!(feed.pool(&shadow, Chain::Sol).await.unwrap().price_usd, Decimal::TWO);
        assert!(feed.pool(&BONK.to_ascii_uppercase(), Chain::Sol).await.is_err());
    }
}
