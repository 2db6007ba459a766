//! Stand-in social and security providers for demo runs
//!
//! Neither talks to a network. They return fixed baselines so the pipeline
//! can be exercised end to end against live DexScreener pairs.

use async_trait::async_trait;
use dexscout_core::providers::{SecurityProvider, SecurityReport, SocialMetrics, SocialProvider};
use dexscout_core::validation::validate_address;
use dexscout_core::{BotResult, Chain};
use std::collections::HashSet;
use tracing::debug;

/// Same metrics for every symbol
pub struct DemoSocialProvider {
    baseline: SocialMetrics,
}

impl Default for DemoSocialProvider {
    fn default() -> Self {
        Self {
            baseline: SocialMetrics {
                followers: 15_000,
                engagement: 0.05,
                account_age_days: 180,
                is_verified: true,
                telegram_members: None,
            },
        }
    }
}

impl DemoSocialProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SocialProvider for DemoSocialProvider {
    async fn token_metrics(&self, symbol: &str) -> BotResult<SocialMetrics> {
        debug!(symbol, "Serving demo social metrics");
        Ok(self.baseline.clone())
    }
}

const BASELINE_HONEYPOT_SCORE: f64 = 0.1;

/// Address-shape checks plus a local blocklist.
#[derive(Default)]
pub struct HeuristicSecurityProvider {
    // Raw entries; the chain decides whether case matters
    blocklist: HashSet<String>,
}

impl HeuristicSecurityProvider {
    pub fn with_blocklist<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            blocklist: addresses
                .into_iter()
                .map(|a| a.as_ref().trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }
}

#[async_trait]
impl SecurityProvider for HeuristicSecurityProvider {
    async fn analyze_token(&self, address: &str, chain: Chain) -> BotResult<SecurityReport> {
        validate_address(chain, address)?;

        let is_blacklisted = self
            .blocklist
            .iter()
            .any(|blocked| chain.same_address(blocked, address));
        if is_blacklisted {
            debug!(token = address, chain = %chain, "Token is on the local blocklist");
        }

        Ok(SecurityReport {
            is_contract_verified: true,
            liquidity_locked: true,
            honeypot_score: if is_blacklisted {
                1.0
            } else {
                BASELINE_HONEYPOT_SCORE
            },
            is_blacklisted,
            ownership_renounced: false,
            anti_whale: false,
        })
    }
}
