//! Market data provider contracts
//!
//! Pair discovery, token metadata, social metrics and security scoring are external
//! collaborators. The engine only depends on the traits below.

#[cfg(feature = "http")]
pub mod dexscreener;
pub mod retry;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::BotResult;
use crate::types::{Chain, Pair};

#[async_trait]
pub trait PairProvider: Send + Sync {
    /// Recently listed pairs on `chain`
    async fn new_pairs(&self, chain: Chain) -> BotResult<Vec<Pair>>;

    async fn pair_info(&self, pair_address: &str, chain: Chain) -> BotResult<Pair>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Circulating supply in whole tokens, when known
    pub total_supply: Option<Decimal>,
    /// Market cap reported by the provider, when known
    pub market_cap: Option<Decimal>,
}

impl TokenMetadata {
    /// Provider market cap, else supply x price, else zero
    pub fn market_cap_at(&self, price: Decimal) -> Decimal {
        self.market_cap
            .or_else(|| self.total_supply.map(|supply| supply * price))
            .unwrap_or(Decimal::ZERO)
    }
}

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn token_metadata(&self, address: &str, chain: Chain) -> BotResult<TokenMetadata>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialMetrics {
    pub followers: u64,
    pub engagement: f64,
    pub account_age_days: u32,
    pub is_verified: bool,
    #[serde(default)]
    pub telegram_members: Option<u64>,
}

#[async_trait]
pub trait SocialProvider: Send + Sync {
    async fn token_metrics(&self, symbol: &str) -> BotResult<SocialMetrics>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityReport {
    pub is_contract_verified: bool,
    pub liquidity_locked: bool,
    /// 0.0 (safe) to 1.0 (likely honeypot)
    pub honeypot_score: f64,
    pub is_blacklisted: bool,
    pub ownership_renounced: bool,
    pub anti_whale: bool,
}

pub const MAX_HONEYPOT_SCORE: f64 = 0.2;

impl SecurityReport {
    /// Verified contract, locked liquidity, low honeypot score, not blacklisted.
    pub fn passes(&self) -> bool {
        self.is_contract_verified
            && self.liquidity_locked
            && self.honeypot_score < MAX_HONEYPOT_SCORE
            && !self.is_blacklisted
    }
}

#[async_trait]
pub trait SecurityProvider: Send + Sync {
    async fn analyze_token(&self, address: &str, chain: Chain) -> BotResult<SecurityReport>;
}

/// The full set of data sources a discovery cycle reads from
#[derive(Clone)]
pub struct MarketData {
    pub pairs: Arc<dyn PairProvider>,
    pub metadata: Arc<dyn MetadataProvider>,
    pub social: Arc<dyn SocialProvider>,
    pub security: Arc<dyn SecurityProvider>,
}
