//! DexScreener API client for pair discovery and token metadata

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

use super::{MetadataProvider, PairProvider, TokenMetadata};
use crate::error::{BotError, BotResult};
use crate::http::create_client;
use crate::types::{Chain, ChainFamily, Pair, PairToken};

const PROVIDER: &str = "dexscreener";
const API_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPair {
    chain_id: String,
    pair_address: String,
    base_token: RawToken,
    quote_token: RawToken,
    price_usd: Option<String>,
    liquidity: Option<RawLiquidity>,
    volume: Option<RawVolume>,
    fdv: Option<f64>,
    market_cap: Option<f64>,
    #[serde(alias = "createdAt")]
    pair_created_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawToken {
    address: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawLiquidity {
    usd: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawVolume {
    h24: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PairsResponse {
    #[serde(default)]
    pairs: Option<Vec<RawPair>>,
    #[serde(default)]
    pair: Option<RawPair>,
}

fn to_decimal(value: Option<f64>) -> Decimal {
    value.and_then(Decimal::from_f64_retain).unwrap_or_default()
}

impl RawPair {
    fn into_pair(self, chain: Chain) -> Pair {
        Pair {
            address: self.pair_address,
            chain,
            base_token: PairToken {
                address: self.base_token.address,
                name: self.base_token.name,
                symbol: self.base_token.symbol,
            },
            quote_token: PairToken {
                address: self.quote_token.address,
                name: self.quote_token.name,
                symbol: self.quote_token.symbol,
            },
            price_usd: self
                .price_usd
                .as_deref()
                .and_then(|p| Decimal::from_str(p).ok())
                .unwrap_or_default(),
            liquidity_usd: to_decimal(self.liquidity.and_then(|l| l.usd)),
            volume_24h: to_decimal(self.volume.and_then(|v| v.h24)),
            created_at_ms: self.pair_created_at.unwrap_or_default(),
        }
    }

    fn reported_market_cap(&self) -> Option<Decimal> {
        self.market_cap
            .or(self.fdv)
            .and_then(Decimal::from_f64_retain)
    }
}

pub struct DexScreenerClient {
    client: Client,
    base_url: String,
}

impl DexScreenerClient {
    pub fn new(base_url: impl Into<String>) -> BotResult<Self> {
        Ok(Self {
            client: create_client(Duration::from_secs(API_TIMEOUT_SECS))?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn fetch(&self, path: &str) -> BotResult<PairsResponse> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Fetching {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BotError::provider(PROVIDER, e.to_string()))?;

        if !response.status().is_success() {
            return Err(BotError::provider(
                PROVIDER,
                format!("{} returned {}", path, response.status()),
            ));
        }

        response
            .json::<PairsResponse>()
            .await
            .map_err(|e| BotError::provider(PROVIDER, format!("invalid response: {}", e)))
    }

    /// Pairs on `chain` where `address` is the base token, deepest first
    async fn pairs_for_token(&self, address: &str, chain: Chain) -> BotResult<Vec<RawPair>> {
        let response = self.fetch(&format!("/dex/tokens/{}", address)).await?;
        let mut pairs: Vec<RawPair> = response
            .pairs
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p.chain_id == chain.dexscreener_id())
            .filter(|p| chain.same_address(&p.base_token.address, address))
            .collect();
        pairs.sort_by(|a, b| {
            let la = a.liquidity.as_ref().and_then(|l| l.usd).unwrap_or_default();
            let lb = b.liquidity.as_ref().and_then(|l| l.usd).unwrap_or_default();
            lb.total_cmp(&la)
        });
        Ok(pairs)
    }

    /// Deepest pair trading `address` on `chain`, used for price lookups.
    pub async fn best_pair_for_token(&self, address: &str, chain: Chain) -> BotResult<Option<Pair>> {
        let pairs = self.pairs_for_token(address, chain).await?;
        Ok(pairs.into_iter().next().map(|p| p.into_pair(chain)))
    }
}

#[async_trait]
impl PairProvider for DexScreenerClient {
    async fn new_pairs(&self, chain: Chain) -> BotResult<Vec<Pair>> {
        let response = self
            .fetch(&format!("/dex/pairs/{}", chain.dexscreener_id()))
            .await?;
        let pairs = response
            .pairs
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p.chain_id == chain.dexscreener_id())
            .map(|p| p.into_pair(chain))
            .collect();
        Ok(pairs)
    }

    async fn pair_info(&self, pair_address: &str, chain: Chain) -> BotResult<Pair> {
        let response = self
            .fetch(&format!("/dex/pairs/{}/{}", chain.dexscreener_id(), pair_address))
            .await?;
        response
            .pair
            .or_else(|| response.pairs.and_then(|pairs| pairs.into_iter().next()))
            .map(|p| p.into_pair(chain))
            .ok_or_else(|| BotError::provider(PROVIDER, format!("pair {} not found", pair_address)))
    }
}

#[async_trait]
impl MetadataProvider for DexScreenerClient {
    async fn token_metadata(&self, address: &str, chain: Chain) -> BotResult<TokenMetadata> {
        let pairs = self.pairs_for_token(address, chain).await?;
        let best = pairs
            .into_iter()
            .next()
            .ok_or_else(|| BotError::provider(PROVIDER, format!("no pairs for token {}", address)))?;

        // DexScreener does not report decimals; use the family's usual precision.
        let decimals = match chain.family() {
            ChainFamily::Evm => 18,
            ChainFamily::Solana => 9,
        };

        Ok(TokenMetadata {
            market_cap: best.reported_market_cap(),
            name: best.base_token.name,
            symbol: best.base_token.symbol,
            decimals,
            total_supply: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "schemaVersion": "1.0.0",
        "pairs": [{
            "chainId": "bsc",
            "dexId": "pancakeswap",
            "pairAddress": "0xpair",
            "baseToken": { "address": "0xbase", "name": "Base Token", "symbol": "BASE" },
            "quoteToken": { "address": "0xquote", "name": "Tether", "symbol": "USDT" },
            "priceUsd": "0.0421",
            "liquidity": { "usd": 81250.5 },
            "volume": { "h24": 15000 },
            "fdv": 2500000,
            "pairCreatedAt": 1700000000000
        }]
    }"#;

    #[test]
    fn test_parse_pairs_response() {
        let response: PairsResponse = serde_json::from_str(SAMPLE).unwrap();
        let raw = response.pairs.unwrap().remove(0);
        assert_eq!(raw.reported_market_cap(), Some(Decimal::from(2_500_000)));

        let pair = raw.into_pair(Chain::Bsc);
        assert_eq!(pair.address, "0xpair");
        assert_eq!(pair.base_token.symbol, "BASE");
        assert_eq!(pair.price_usd, Decimal::new(421, 4));
        assert_eq!(pair.volume_24h, Decimal::from(15_000));
        assert_eq!(pair.created_at_ms, 1_700_000_000_000);
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let json = r#"{ "pair": {
            "chainId": "solana",
            "pairAddress": "p",
            "baseToken": { "address": "b" },
            "quoteToken": { "address": "q" },
            "createdAt": 5
        }}"#;
        let response: PairsResponse = serde_json::from_str(json).unwrap();
        let pair = response.pair.unwrap().into_pair(Chain::Sol);
        assert_eq!(pair.liquidity_usd, Decimal::ZERO);
        assert_eq!(pair.price_usd, Decimal::ZERO);
        assert_eq!(pair.created_at_ms, 5);
    }
}
