//! Chain adapter contract and the chain-keyed registry
//!
//! An adapter is a stateless capability: quote a swap, execute a swap, price a token.
//! Adapters for different chains are interchangeable behind [`ChainAdapter`] and are
//! selected purely by [`Chain`].

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{AdapterError, BotError, BotResult};
use crate::types::Chain;

/// Parameters of a single swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapParams {
    /// Address of the token being sold
    pub token_in: String,
    /// Address of the token being bought
    pub token_out: String,
    /// Amount of `token_in`, in whole units
    pub amount: Decimal,
    /// Maximum tolerated slippage in percent
    pub max_slippage_pct: Decimal,
    /// Seconds until the swap is no longer valid
    pub deadline_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub input_amount: Decimal,
    pub output_amount: Decimal,
    /// Estimated price impact in percent
    pub price_impact: Decimal,
    pub route: Vec<String>,
}

#[async_trait]
pub trait ChainAdapter: Send + Sync {
    fn chain(&self) -> Chain;

    /// Human readable DEX name
    fn name(&self) -> &str;

    /// Pure computation, no side effects.
    async fn quote(&self, params: &SwapParams) -> Result<Quote, AdapterError>;

    /// Returns a transaction id, or an error with nothing applied.
    async fn execute(&self, params: &SwapParams) -> Result<String, AdapterError>;

    /// Current USD price of a token
    async fn get_price(&self, token_address: &str) -> Result<Decimal, AdapterError>;
}

/// Closed map from chain to adapter
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<Chain, Arc<dyn ChainAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter under its own chain, replacing any previous one.
    pub fn register(&mut self, adapter: Arc<dyn ChainAdapter>) {
        let chain = adapter.chain();
        tracing::info!("🔌 Registered {} adapter for {}", adapter.name(), chain);
        self.adapters.insert(chain, adapter);
    }

    pub fn with(mut self, adapter: Arc<dyn ChainAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get_adapter(&self, chain: Chain) -> BotResult<Arc<dyn ChainAdapter>> {
        self.adapters
            .get(&chain)
            .cloned()
            .ok_or_else(|| BotError::UnsupportedChain(chain.to_string()))
    }

    /// Looks up an adapter from a raw chain tag such as `"SOL"`.
    pub fn get_adapter_by_tag(&self, tag: &str) -> BotResult<Arc<dyn ChainAdapter>> {
        let chain = Chain::from_str(tag)?;
        self.get_adapter(chain)
    }

    pub fn chains(&self) -> Vec<Chain> {
        let mut chains: Vec<_> = self.adapters.keys().copied().collect();
        chains.sort();
        chains
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("chains", &self.chains())
            .finish()
    }
}
