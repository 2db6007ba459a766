//! Token discovery: pair filtering, per-token enrichment, gating and scoring

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::bot::SocialThreshold;
use crate::chain::{AdapterRegistry, ChainAdapter};
use crate::config::DiscoveryPolicy;
use crate::error::{BotError, BotResult};
use crate::providers::retry::{retry_with_backoff, DEFAULT_ATTEMPTS, DEFAULT_BASE_DELAY};
use crate::providers::{MarketData, SecurityReport, SocialMetrics};
use crate::scoring;
use crate::types::{Chain, Pair, RiskMetrics, SocialSnapshot, Token, TokenAnalysis};
use crate::validation::validate_address;

pub const MIN_LIQUIDITY_SCORE: f64 = 0.2;
pub const MAX_LIQUIDITY_SCORE: f64 = 1.0;

/// Liquidity relative to daily volume, clamped to [0.2, 1.0]
pub fn liquidity_score(liquidity_usd: Decimal, volume_24h: Decimal) -> f64 {
    if volume_24h <= Decimal::ZERO {
        return MIN_LIQUIDITY_SCORE;
    }
    (liquidity_usd / volume_24h)
        .to_f64()
        .unwrap_or(MIN_LIQUIDITY_SCORE)
        .clamp(MIN_LIQUIDITY_SCORE, MAX_LIQUIDITY_SCORE)
}

/// A token that was dropped because one of its fetches failed
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryIssue {
    pub address: String,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// In discovery order (descending liquidity)
    pub analyses: Vec<TokenAnalysis>,
    pub skipped: Vec<DiscoveryIssue>,
    /// Set when the pair feed itself failed and the cycle saw no pairs
    pub feed_error: Option<String>,
}

enum Candidate {
    Scored(TokenAnalysis),
    Rejected,
    Failed(DiscoveryIssue),
}

pub struct TokenScoringPipeline {
    market: MarketData,
    adapters: Arc<AdapterRegistry>,
    policy: DiscoveryPolicy,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl TokenScoringPipeline {
    pub fn new(market: MarketData, adapters: Arc<AdapterRegistry>, policy: DiscoveryPolicy) -> Self {
        Self {
            market,
            adapters,
            policy,
            retry_attempts: DEFAULT_ATTEMPTS,
            retry_delay: DEFAULT_BASE_DELAY,
        }
    }

    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    pub fn policy(&self) -> &DiscoveryPolicy {
        &self.policy
    }

    /// Drops stale, shallow and thin pairs, then sorts by liquidity, deepest first.
    pub fn filter_candidates(&self, pairs: Vec<Pair>, now: DateTime<Utc>) -> Vec<Pair> {
        let max_age = chrono::Duration::hours(self.policy.max_pair_age_hours);
        let mut candidates: Vec<Pair> = pairs
            .into_iter()
            .filter(|p| p.age(now) <= max_age)
            .filter(|p| p.liquidity_usd >= self.policy.min_liquidity_usd)
            .filter(|p| p.volume_24h >= self.policy.min_volume_24h_usd)
            .collect();
        candidates.sort_by(|a, b| b.liquidity_usd.cmp(&a.liquidity_usd));
        candidates
    }

    /// Runs one discovery pass for `chain`. Only a missing adapter fails the whole pass.
    pub async fn discover(
        &self,
        chain: Chain,
        threshold: &SocialThreshold,
    ) -> BotResult<DiscoveryReport> {
        let adapter = self.adapters.get_adapter(chain)?;

        let pairs = match self.market.pairs.new_pairs(chain).await {
            Ok(pairs) => pairs,
            Err(e) => {
                warn!(chain = %chain, "Pair feed unavailable, no pairs this cycle: {}", e);
                return Ok(DiscoveryReport {
                    feed_error: Some(e.to_string()),
                    ..Default::default()
                });
            }
        };

        let fetched = pairs.len();
        let candidates = self.filter_candidates(pairs, Utc::now());
        debug!(chain = %chain, "{} of {} pairs passed filters", candidates.len(), fetched);

        let outcomes = join_all(
            candidates
                .iter()
                .map(|pair| self.evaluate_candidate(chain, pair, adapter.as_ref(), threshold)),
        )
        .await;

        let mut report = DiscoveryReport::default();
        for outcome in outcomes {
            match outcome {
                Candidate::Scored(analysis) => report.analyses.push(analysis),
                Candidate::Rejected => {}
                Candidate::Failed(issue) => {
                    warn!(chain = %chain, token = %issue.address, "Skipping token: {}", issue.error);
                    report.skipped.push(issue);
                }
            }
        }

        info!(
            chain = %chain,
            "🔍 Discovery: {} candidates, {} analysed, {} skipped",
            candidates.len(),
            report.analyses.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    async fn evaluate_candidate(
        &self,
        chain: Chain,
        pair: &Pair,
        adapter: &dyn ChainAdapter,
        threshold: &SocialThreshold,
    ) -> Candidate {
        let address = pair.base_token.address.clone();
        let fail = |e: BotError| {
            Candidate::Failed(DiscoveryIssue {
                address: address.clone(),
                error: e.to_string(),
            })
        };

        let token = match self.fetch_token(chain, pair, adapter).await {
            Ok(token) => token,
            Err(e) => return fail(e),
        };

        let (social, security) = tokio::join!(
            self.market.social.token_metrics(&token.symbol),
            self.market.security.analyze_token(&token.address, chain),
        );
        let social = match social {
            Ok(social) => social,
            Err(e) => return fail(e),
        };
        let security = match security {
            Ok(security) => security,
            Err(e) => return fail(e),
        };

        if !passes_social_gate(&social, threshold) {
            debug!(token = %token.symbol, "Rejected by social gate ({} followers)", social.followers);
            return Candidate::Rejected;
        }
        if !security.passes() {
            debug!(token = %token.symbol, "Rejected by security gate");
            return Candidate::Rejected;
        }

        Candidate::Scored(scoring::analyze(enrich(token, &social, &security), Utc::now()))
    }

    /// Checks the address shape, then fetches metadata and price concurrently.
    async fn fetch_token(
        &self,
        chain: Chain,
        pair: &Pair,
        adapter: &dyn ChainAdapter,
    ) -> BotResult<Token> {
        let address = pair.base_token.address.as_str();
        validate_address(chain, address)?;
        let metadata = retry_with_backoff("token metadata", self.retry_attempts, self.retry_delay, || {
            self.market.metadata.token_metadata(address, chain)
        });
        let price = async { adapter.get_price(address).await.map_err(BotError::from) };
        let (metadata, price) = tokio::try_join!(metadata, price)?;

        Ok(Token {
            address: address.to_string(),
            market_cap: metadata.market_cap_at(price),
            name: metadata.name,
            symbol: metadata.symbol,
            decimals: metadata.decimals,
            chain,
            price,
            volume_24h: pair.volume_24h,
            social: SocialSnapshot::default(),
            risk: RiskMetrics {
                liquidity_score: liquidity_score(pair.liquidity_usd, pair.volume_24h),
                contract_audit: false,
                ownership_renounced: false,
                honeypot_risk: 1.0,
            },
        })
    }
}

/// Followers at or above the minimum, and Telegram members too when both sides report them.
pub fn passes_social_gate(social: &SocialMetrics, threshold: &SocialThreshold) -> bool {
    if social.followers < threshold.min_twitter_followers {
        return false;
    }
    match (threshold.min_telegram_members, social.telegram_members) {
        (Some(min), Some(members)) => members >= min,
        _ => true,
    }
}

fn enrich(mut token: Token, social: &SocialMetrics, security: &SecurityReport) -> Token {
    token.social = SocialSnapshot {
        twitter_followers: social.followers,
        telegram_members: social.telegram_members,
    };
    token.risk.contract_audit = security.is_contract_verified;
    token.risk.ownership_renounced = security.ownership_renounced;
    token.risk.honeypot_risk = security.honeypot_score;
    token
}
