//! Chain adapters for the four supported DEXes

pub mod amm;
pub mod evm;
pub mod jupiter;
pub mod paper;
pub mod price_feed;

pub use evm::{DexProfile, EvmDexAdapter, PANCAKESWAP, TRADER_JOE, UNISWAP_V3};
pub use jupiter::JupiterAdapter;
pub use paper::{NoSignerSubmitter, PaperSubmitter, TransactionSubmitter};
pub use price_feed::{DexScreenerPriceFeed, PoolSnapshot, PriceFeed, StaticPriceFeed};

use dexscout_core::AdapterRegistry;
use std::sync::Arc;

/// One adapter per supported chain, sharing a price feed and submitter.
pub fn default_registry(
    feed: Arc<dyn PriceFeed>,
    submitter: Arc<dyn TransactionSubmitter>,
) -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    for profile in [UNISWAP_V3, PANCAKESWAP, TRADER_JOE] {
        registry.register(Arc::new(EvmDexAdapter::new(
            profile,
            feed.clone(),
            submitter.clone(),
        )));
    }
    registry.register(Arc::new(JupiterAdapter::new(feed, submitter)));
    registry
}
