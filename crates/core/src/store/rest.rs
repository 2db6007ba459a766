//! PostgREST-style persistence over HTTPS

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::persistence::{
    BotRecord, Persistence, TokenAnalysisRecord, WatchlistEntry, RECENT_ANALYSES_LIMIT,
};
use crate::bot::{BotConfig, Trade};
use crate::config::PersistenceConfig;
use crate::error::{BotError, BotResult};
use crate::http::create_client;
use crate::types::TokenAnalysis;

const REST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct BotRow {
    id: String,
    #[serde(default)]
    is_active: bool,
    config: BotConfig,
    created_at: DateTime<Utc>,
}

pub struct RestPersistence {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestPersistence {
    pub fn new(config: &PersistenceConfig) -> BotResult<Self> {
        Ok(Self {
            client: create_client(Duration::from_secs(REST_TIMEOUT_SECS))?,
            base_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn table(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    async fn check(response: Response, what: &str) -> BotResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(BotError::Store(format!("{} failed with {}: {}", what, status, body)))
    }

    async fn insert(&self, table: &str, row: Value) -> BotResult<Response> {
        let response = self
            .authorized(self.client.post(self.table(table)))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;
        Self::check(response, &format!("insert into {}", table)).await
    }

    async fn select<T: for<'de> Deserialize<'de>>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> BotResult<Vec<T>> {
        let response = self
            .authorized(self.client.get(self.table(table)))
            .query(query)
            .send()
            .await?;
        let response = Self::check(response, &format!("select from {}", table)).await?;
        Ok(response.json::<Vec<T>>().await?)
    }
}

#[async_trait]
impl Persistence for RestPersistence {
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn create_bot(&self, config: &BotConfig) -> BotResult<BotRecord> {
        let row = json!({
            "id": config.id,
            "name": config.name,
            "chain": config.chain,
            "is_active": false,
            "config": config,
            "trading_strategy": config.trading_strategy,
            "risk_management": config.risk_management,
            "monitoring_config": config.monitoring,
        });
        let rows: Vec<BotRow> = self.insert("bots", row).await?.json().await?;
        rows.into_iter()
            .next()
            .map(|r| BotRecord {
                id: r.id,
                is_active: r.is_active,
                config: r.config,
                created_at: r.created_at,
            })
            .ok_or_else(|| BotError::Store("insert into bots returned no row".into()))
    }

    async fn list_bots(&self) -> BotResult<Vec<BotRecord>> {
        let rows: Vec<BotRow> = self
            .select(
                "bots",
                &[
                    ("select", "id,is_active,config,created_at".to_string()),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| BotRecord {
                id: r.id,
                is_active: r.is_active,
                config: r.config,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn set_bot_active(&self, bot_id: &str, active: bool) -> BotResult<()> {
        let response = self
            .authorized(self.client.patch(self.table("bots")))
            .query(&[("id", format!("eq.{}", bot_id))])
            .json(&json!({ "is_active": active }))
            .send()
            .await?;
        Self::check(response, "update bots").await?;
        Ok(())
    }

    async fn record_trade(&self, bot_id: &str, trade: &Trade) -> BotResult<()> {
        let row = json!({
            "bot_id": bot_id,
            "token_in": trade.token_in,
            "token_out": trade.token_out,
            "amount_in": trade.amount,
            "price_in": trade.entry_price,
            "price_out": trade.current_price,
            "status": trade.status,
            "type": trade.side,
            "tx_id": trade.tx_id,
        });
        self.insert("trades", row).await?;
        Ok(())
    }

    async fn add_to_watchlist(&self, entry: &WatchlistEntry) -> BotResult<()> {
        let response = self
            .authorized(self.client.post(format!("{}/rpc/add_to_watchlist", self.base_url)))
            .json(&json!({
                "p_token_address": entry.token_address,
                "p_chain": entry.chain,
                "p_symbol": entry.symbol,
                "p_name": entry.name,
            }))
            .send()
            .await?;
        Self::check(response, "rpc add_to_watchlist").await?;
        Ok(())
    }

    async fn list_watchlist(&self) -> BotResult<Vec<WatchlistEntry>> {
        self.select(
            "watchlist",
            &[
                ("select", "*".to_string()),
                ("order", "added_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn remove_from_watchlist(&self, token_address: &str) -> BotResult<()> {
        let response = self
            .authorized(self.client.delete(self.table("watchlist")))
            .query(&[("token_address", format!("eq.{}", token_address))])
            .send()
            .await?;
        Self::check(response, "delete from watchlist").await?;
        Ok(())
    }

    async fn save_token_analysis(&self, analysis: &TokenAnalysis) -> BotResult<()> {
        let row = serde_json::to_value(TokenAnalysisRecord::from(analysis))?;
        self.insert("token_analyses", row).await?;
        Ok(())
    }

    async fn list_token_analyses(&self) -> BotResult<Vec<TokenAnalysisRecord>> {
        self.select(
            "token_analyses",
            &[
                ("select", "*".to_string()),
                ("order", "analyzed_at.desc".to_string()),
                ("limit", RECENT_ANALYSES_LIMIT.to_string()),
            ],
        )
        .await
    }
}
