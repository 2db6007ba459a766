//! Core market types: chains, discovered pairs, token snapshots and analyses

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::BotError;

/// Supported chains. The set is closed; adding one means adding an adapter and a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Chain {
    Eth,
    Bsc,
    Avax,
    Sol,
}

/// Chains grouped by execution model. Buy-signal policy is keyed on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainFamily {
    Evm,
    Solana,
}

/// Stablecoin that every trade on a chain is denominated in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteAsset {
    pub symbol: &'static str,
    pub address: &'static str,
    pub decimals: u8,
}

impl Chain {
    /// Returns all supported chains
    pub fn all() -> &'static [Chain] {
        const ALL: &[Chain] = &[Chain::Eth, Chain::Bsc, Chain::Avax, Chain::Sol];
        ALL
    }

    pub fn family(&self) -> ChainFamily {
        match self {
            Chain::Eth | Chain::Bsc | Chain::Avax => ChainFamily::Evm,
            Chain::Sol => ChainFamily::Solana,
        }
    }

    /// Lookup key for an address. Hex addresses fold case, base58 mints keep it.
    pub fn address_key(&self, address: &str) -> String {
        match self.family() {
            ChainFamily::Evm => address.to_ascii_lowercase(),
            ChainFamily::Solana => address.to_string(),
        }
    }

    pub fn same_address(&self, a: &str, b: &str) -> bool {
        match self.family() {
            ChainFamily::Evm => a.eq_ignore_ascii_case(b),
            ChainFamily::Solana => a == b,
        }
    }

    /// Short tag used in configs and persisted records
    pub fn tag(&self) -> &'static str {
        match self {
            Chain::Eth => "ETH",
            Chain::Bsc => "BSC",
            Chain::Avax => "AVAX",
            Chain::Sol => "SOL",
        }
    }

    /// Chain identifier used by DexScreener
    pub fn dexscreener_id(&self) -> &'static str {
        match self {
            Chain::Eth => "ethereum",
            Chain::Bsc => "bsc",
            Chain::Avax => "avalanche",
            Chain::Sol => "solana",
        }
    }

    pub fn quote_asset(&self) -> QuoteAsset {
        match self {
            Chain::Eth => QuoteAsset {
                symbol: "USDT",
                address: "0xdAC17F958D2ee523a2206206994597C13D831ec7",
                decimals: 6,
            },
            Chain::Bsc => QuoteAsset {
                symbol: "USDT",
                address: "0x55d398326f99059fF775485246999027B3197955",
                decimals: 18,
            },
            Chain::Avax => QuoteAsset {
                symbol: "USDT",
                address: "0x9702230A8Ea53601f5cD2dc00fDBc13d4dF4A8c7",
                decimals: 6,
            },
            Chain::Sol => QuoteAsset {
                symbol: "USDC",
                address: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                decimals: 6,
            },
        }
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for Chain {
    type Err = BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ETH" | "ETHEREUM" => Ok(Chain::Eth),
            "BSC" | "BNB" => Ok(Chain::Bsc),
            "AVAX" | "AVALANCHE" => Ok(Chain::Avax),
            "SOL" | "SOLANA" => Ok(Chain::Sol),
            _ => Err(BotError::UnsupportedChain(s.to_string())),
        }
    }
}

/// One side of a discovered pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairToken {
    pub address: String,
    pub name: String,
    pub symbol: String,
}

/// A newly listed trading pair reported by the discovery feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pair {
    pub address: String,
    pub chain: Chain,
    pub base_token: PairToken,
    pub quote_token: PairToken,
    pub price_usd: Decimal,
    pub liquidity_usd: Decimal,
    pub volume_24h: Decimal,
    /// Pair creation time in epoch milliseconds
    pub created_at_ms: i64,
}

impl Pair {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.created_at_ms).single()
    }

    /// Age of the pair relative to `now`. Pairs stamped in the future report zero.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        let age = chrono::Duration::milliseconds(now.timestamp_millis() - self.created_at_ms);
        age.max(chrono::Duration::zero())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialSnapshot {
    pub twitter_followers: u64,
    pub telegram_members: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// 0.0 (illiquid) to 1.0 (deep)
    pub liquidity_score: f64,
    pub contract_audit: bool,
    pub ownership_renounced: bool,
    /// 0.0 (safe) to 1.0 (likely honeypot)
    pub honeypot_risk: f64,
}

/// Snapshot of a discovered asset, rebuilt on every discovery cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub chain: Chain,
    pub market_cap: Decimal,
    pub price: Decimal,
    pub volume_24h: Decimal,
    pub social: SocialSnapshot,
    pub risk: RiskMetrics,
}

/// Risk classification. Ordered from safest to riskiest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Moves towards `target` only if that is an improvement.
    pub fn upgrade_to(self, target: RiskLevel) -> RiskLevel {
        self.min(target)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        };
        write!(f, "{}", label)
    }
}

/// Buy/no-buy verdict for one token in one discovery cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenAnalysis {
    pub token: Token,
    pub buy_signal: bool,
    pub risk_level: RiskLevel,
    /// Rationale strings in rule-evaluation order
    pub analysis: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}
