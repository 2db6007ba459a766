//! Configuration module for the trading engine

use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;

use crate::events::DEFAULT_EVENT_HISTORY;
use crate::types::Chain;

/// Credentials for the remote persistence backend
#[derive(Debug, Clone, PartialEq)]
pub struct PersistenceConfig {
    pub url: String,
    pub api_key: String,
}

/// Pair filters applied before any per-token fetch
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryPolicy {
    pub min_liquidity_usd: Decimal,
    pub min_volume_24h_usd: Decimal,
    pub max_pair_age_hours: i64,
}

impl Default for DiscoveryPolicy {
    fn default() -> Self {
        Self {
            min_liquidity_usd: Decimal::from(50_000),
            min_volume_24h_usd: Decimal::from(10_000),
            max_pair_age_hours: 24,
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub eth_rpc_url: String,
    pub bsc_rpc_url: String,
    pub avax_rpc_url: String,
    pub sol_rpc_url: String,
    /// `None` runs the engine in offline/demo mode
    pub persistence: Option<PersistenceConfig>,
    pub dexscreener_api_url: String,
    /// Paper trading when true
    pub dry_run: bool,
    /// Bot definitions loaded at startup
    pub bots_file: String,
    pub event_history_limit: usize,
    pub discovery: DiscoveryPolicy,
    /// Token addresses the security check always flags
    pub token_blocklist: Vec<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let persistence = match (env::var("SUPABASE_URL"), env::var("SUPABASE_ANON_KEY")) {
            (Ok(url), Ok(api_key)) if !url.trim().is_empty() && !api_key.trim().is_empty() => {
                Some(PersistenceConfig {
                    url: url.trim_end_matches('/').to_string(),
                    api_key,
                })
            }
            _ => None,
        };

        Self {
            eth_rpc_url: env::var("ETH_RPC_URL").unwrap_or(defaults.eth_rpc_url),
            bsc_rpc_url: env::var("BSC_RPC_URL").unwrap_or(defaults.bsc_rpc_url),
            avax_rpc_url: env::var("AVAX_RPC_URL").unwrap_or(defaults.avax_rpc_url),
            sol_rpc_url: env::var("SOL_RPC_URL").unwrap_or(defaults.sol_rpc_url),
            persistence,
            dexscreener_api_url: env::var("DEXSCREENER_API_URL")
                .unwrap_or(defaults.dexscreener_api_url),
            dry_run: env::var("DRY_RUN")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.dry_run),
            bots_file: env::var("BOTS_FILE").unwrap_or(defaults.bots_file),
            event_history_limit: parse_env("EVENT_HISTORY_LIMIT", defaults.event_history_limit),
            discovery: DiscoveryPolicy {
                min_liquidity_usd: parse_env(
                    "MIN_LIQUIDITY_USD",
                    defaults.discovery.min_liquidity_usd,
                ),
                min_volume_24h_usd: parse_env(
                    "MIN_VOLUME_24H_USD",
                    defaults.discovery.min_volume_24h_usd,
                ),
                max_pair_age_hours: parse_env(
                    "PAIR_MAX_AGE_HOURS",
                    defaults.discovery.max_pair_age_hours,
                ),
            },
            token_blocklist: env::var("TOKEN_BLOCKLIST")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|a| !a.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or(defaults.token_blocklist),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    pub fn rpc_url(&self, chain: Chain) -> &str {
        match chain {
            Chain::Eth => &self.eth_rpc_url,
            Chain::Bsc => &self.bsc_rpc_url,
            Chain::Avax => &self.avax_rpc_url,
            Chain::Sol => &self.sol_rpc_url,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.persistence.is_none()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            eth_rpc_url: "https://eth.llamarpc.com".to_string(),
            bsc_rpc_url: "https://bsc-dataseed.binance.org".to_string(),
            avax_rpc_url: "https://api.avax.network/ext/bc/C/rpc".to_string(),
            sol_rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            persistence: None,
            dexscreener_api_url: "https://api.dexscreener.com/latest".to_string(),
            dry_run: true,
            bots_file: "bots.json".to_string(),
            event_history_limit: DEFAULT_EVENT_HISTORY,
            discovery: DiscoveryPolicy::default(),
            token_blocklist: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

fn parse_env<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
