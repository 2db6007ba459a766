//! Risk classification and buy-signal policies
//!
//! Scoring starts every token at HIGH and only ever moves towards LOW. Each satisfied
//! rule appends its rationale in evaluation order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::providers::MAX_HONEYPOT_SCORE;
use crate::types::{Chain, ChainFamily, RiskLevel, Token, TokenAnalysis};

pub const SIGNIFICANT_MARKET_CAP_USD: i64 = 1_000_000;
pub const STRONG_SOCIAL_FOLLOWERS: u64 = 10_000;
pub const HIGH_LIQUIDITY_SCORE: f64 = 0.8;
pub const GOOD_VOLUME_USD: i64 = 100_000;
pub const SOLID_LIQUIDITY_SCORE: f64 = 0.5;

/// Additional buy gate applied after a token scores LOW. The two chain families
/// use different thresholds and are kept as separate named policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuySignalPolicy {
    /// EVM chains: social followers above 50,000
    SocialMomentum,
    /// Solana: liquidity score above 0.7 and 24h volume above $50,000
    LiquidityDepth,
}

impl BuySignalPolicy {
    pub const MOMENTUM_FOLLOWERS: u64 = 50_000;
    pub const DEPTH_LIQUIDITY_SCORE: f64 = 0.7;
    pub const DEPTH_VOLUME_USD: i64 = 50_000;

    pub fn for_family(family: ChainFamily) -> Self {
        match family {
            ChainFamily::Evm => BuySignalPolicy::SocialMomentum,
            ChainFamily::Solana => BuySignalPolicy::LiquidityDepth,
        }
    }

    pub fn for_chain(chain: Chain) -> Self {
        Self::for_family(chain.family())
    }

    pub fn allows(&self, token: &Token) -> bool {
        match self {
            BuySignalPolicy::SocialMomentum => {
                token.social.twitter_followers > Self::MOMENTUM_FOLLOWERS
            }
            BuySignalPolicy::LiquidityDepth => {
                token.risk.liquidity_score > Self::DEPTH_LIQUIDITY_SCORE
                    && token.volume_24h > Decimal::from(Self::DEPTH_VOLUME_USD)
            }
        }
    }
}

/// Classifies `token` and returns the final level with the rationale of every rule that fired.
pub fn score_token(token: &Token) -> (RiskLevel, Vec<String>) {
    let mut level = RiskLevel::High;
    let mut rationale = Vec::new();

    if token.market_cap > Decimal::from(SIGNIFICANT_MARKET_CAP_USD) {
        rationale.push("Market cap is significant".to_string());
        level = level.upgrade_to(RiskLevel::Medium);
    }

    if token.social.twitter_followers > STRONG_SOCIAL_FOLLOWERS {
        rationale.push("Strong social presence".to_string());
        level = level.upgrade_to(RiskLevel::Medium);
    }

    if token.risk.liquidity_score > HIGH_LIQUIDITY_SCORE {
        rationale.push("High liquidity score".to_string());
        level = level.upgrade_to(RiskLevel::Low);
    }

    if token.volume_24h > Decimal::from(GOOD_VOLUME_USD)
        && token.risk.liquidity_score > SOLID_LIQUIDITY_SCORE
    {
        rationale.push("Good trading volume".to_string());
        level = level.upgrade_to(RiskLevel::Low);
    }

    if token.risk.contract_audit && token.risk.ownership_renounced {
        rationale.push("Contract is audited and ownership is renounced".to_string());
        level = level.upgrade_to(RiskLevel::Low);
    }

    (level, rationale)
}

/// Scores a token and derives its buy signal under the chain family's policy.
pub fn analyze(token: Token, analyzed_at: DateTime<Utc>) -> TokenAnalysis {
    let (risk_level, analysis) = score_token(&token);
    let buy_signal = risk_level == RiskLevel::Low
        && token.risk.honeypot_risk < MAX_HONEYPOT_SCORE
        && BuySignalPolicy::for_chain(token.chain).allows(&token);

    TokenAnalysis {
        token,
        buy_signal,
        risk_level,
        analysis,
        analyzed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_token;

    #[test]
    fn test_bare_token_stays_high() {
        let mut token = sample_token(Chain::Eth);
        token.market_cap = Decimal::ZERO;
        token.volume_24h = Decimal::ZERO;
        token.social.twitter_followers = 0;
        token.risk.liquidity_score = 0.2;
        token.risk.contract_audit = false;

        let (level, rationale) = score_token(&token);
        assert_eq!(level, RiskLevel::High);
        assert!(rationale.is_empty());
    }

    #[test]
    fn test_rationale_in_rule_order() {
        let mut token = sample_token(Chain::Eth);
        token.market_cap = Decimal::from(2_000_000);
        token.social.twitter_followers = 20_000;
        token.risk.liquidity_score = 0.9;
        token.volume_24h = Decimal::from(200_000);
        token.risk.contract_audit = true;
        token.risk.ownership_renounced = true;

        let (level, rationale) = score_token(&token);
        assert_eq!(level, RiskLevel::Low);
        assert_eq!(
            rationale,
            vec![
                "Market cap is significant",
                "Strong social presence",
                "High liquidity score",
                "Good trading volume",
                "Contract is audited and ownership is renounced",
            ]
        );
    }

    #[test]
    fn test_medium_rule_never_downgrades_low() {
        let mut token = sample_token(Chain::Bsc);
        token.market_cap = Decimal::from(5_000_000);
        token.risk.liquidity_score = 0.95;
        token.risk.contract_audit = false;
        let (level, _) = score_token(&token);
        assert_eq!(level, RiskLevel::Low);
    }

    #[test]
    fn test_evm_buy_signal_needs_followers() {
        let mut token = sample_token(Chain::Eth);
        token.social.twitter_followers = 60_000;
        assert!(analyze(token.clone(), Utc::now()).buy_signal);

        token.social.twitter_followers = 50_000;
        assert!(!analyze(token, Utc::now()).buy_signal);
    }

    #[test]
    fn test_solana_buy_signal_needs_depth() {
        let mut token = sample_token(Chain::Sol);
        token.social.twitter_followers = 0;
        token.risk.liquidity_score = 0.75;
        token.volume_24h = Decimal::from(60_000);
        let analysis = analyze(token.clone(), Utc::now());
        assert_eq!(analysis.risk_level, RiskLevel::Low);
        assert!(analysis.buy_signal);

        token.volume_24h = Decimal::from(50_000);
        assert!(!analyze(token, Utc::now()).buy_signal);
    }

    #[test]
    fn test_honeypot_blocks_buy_signal() {
        let mut token = sample_token(Chain::Eth);
        token.social.twitter_followers = 100_000;
        token.risk.honeypot_risk = 0.25;
        let analysis = analyze(token, Utc::now());
        assert_eq!(analysis.risk_level, RiskLevel::Low);
        assert!(!analysis.buy_signal);
    }

    #[test]
    fn test_policy_by_family() {
        assert_eq!(BuySignalPolicy::for_chain(Chain::Avax), BuySignalPolicy::SocialMomentum);
        assert_eq!(BuySignalPolicy::for_chain(Chain::Sol), BuySignalPolicy::LiquidityDepth);
    }
}
