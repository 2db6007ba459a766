//! Fixtures and hand-written fakes shared by the unit tests

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::bot::{
    BotConfig, BotStatus, MonitoringConfig, RiskManagement, SocialThreshold, TechnicalIndicators, Trade,
    TradeSide, TradeStatus, TradingPairHint, TradingStrategy,
};
use crate::chain::{AdapterRegistry, ChainAdapter, Quote, SwapParams};
use crate::config::DiscoveryPolicy;
use crate::discovery::TokenScoringPipeline;
use crate::error::{AdapterError, BotError, BotResult, ExecutionFailure};
use crate::events::BotEvent;
use crate::providers::{
    MarketData, MetadataProvider, PairProvider, SecurityProvider, SecurityReport, SocialMetrics,
    SocialProvider, TokenMetadata,
};
use crate::runner::BotRuntime;
use crate::scoring;
use crate::store::{MemoryStateStore, OfflinePersistence, StateStore};
use crate::types::{
    Chain, Pair, PairToken, RiskMetrics, SocialSnapshot, Token, TokenAnalysis,
};

pub const TOKEN_ADDRESS: &str = "0x00000000000000000000000000000000000000a1";
pub const SOL_TOKEN_ADDRESS: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

pub fn bot_id(chain: Chain) -> String {
    format!("bot-{}", chain.tag().to_lowercase())
}

pub fn sample_config(chain: Chain) -> BotConfig {
    BotConfig {
        id: bot_id(chain),
        name: format!("Sniper {}", chain),
        chain,
        trading_pair: TradingPairHint {
            token_in: chain.quote_asset().symbol.to_string(),
            token_out: "PEPE".to_string(),
        },
        trading_strategy: TradingStrategy {
            entry_price: Decimal::ONE,
            take_profit_percentage: Decimal::from(10),
            stop_loss_percentage: Decimal::from(5),
            max_slippage_percentage: Decimal::ONE,
            trade_amount: Decimal::from(100),
        },
        risk_management: RiskManagement {
            max_investment_per_trade: Decimal::from(500),
            daily_loss_limit: Decimal::from(200),
            max_open_trades: 3,
        },
        monitoring: MonitoringConfig {
            price_check_interval: 60,
            social_metrics_threshold: SocialThreshold {
                min_twitter_followers: 1_000,
                min_telegram_members: None,
            },
            technical_indicators: TechnicalIndicators::default(),
        },
    }
}

pub fn sample_token(chain: Chain) -> Token {
    let (address, decimals) = match chain {
        Chain::Sol => (SOL_TOKEN_ADDRESS, 9),
        _ => (TOKEN_ADDRESS, 18),
    };
    Token {
        address: address.to_string(),
        name: "Pepe".to_string(),
        symbol: "PEPE".to_string(),
        decimals,
        chain,
        market_cap: Decimal::from(2_000_000),
        price: Decimal::ONE,
        volume_24h: Decimal::from(200_000),
        social: SocialSnapshot {
            twitter_followers: 60_000,
            telegram_members: None,
        },
        risk: RiskMetrics {
            liquidity_score: 0.9,
            contract_audit: true,
            ownership_renounced: true,
            honeypot_risk: 0.05,
        },
    }
}

/// A LOW-risk analysis carrying a buy signal
pub fn sample_analysis(chain: Chain) -> TokenAnalysis {
    scoring::analyze(sample_token(chain), Utc::now())
}

pub fn open_trade(entry: Decimal, current: Decimal, amount: Decimal) -> Trade {
    Trade {
        id: Uuid::new_v4(),
        token_in: "USDT".to_string(),
        token_out: "PEPE".to_string(),
        token_address: TOKEN_ADDRESS.to_string(),
        amount,
        entry_price: entry,
        current_price: current,
        timestamp: Utc::now(),
        status: TradeStatus::Executed,
        side: TradeSide::Buy,
        tx_id: Some("tx-open".to_string()),
    }
}

/// An ETH pair listed an hour ago
pub fn sample_pair(address: &str, liquidity: i64, volume: i64) -> Pair {
    Pair {
        address: format!("pair-{}", address),
        chain: Chain::Eth,
        base_token: PairToken {
            address: address.to_string(),
            name: "Pepe".to_string(),
            symbol: "PEPE".to_string(),
        },
        quote_token: PairToken {
            address: Chain::Eth.quote_asset().address.to_string(),
            name: "Tether".to_string(),
            symbol: "USDT".to_string(),
        },
        price_usd: Decimal::ONE,
        liquidity_usd: Decimal::from(liquidity),
        volume_24h: Decimal::from(volume),
        created_at_ms: (Utc::now() - chrono::Duration::hours(1)).timestamp_millis(),
    }
}

pub fn sample_social(followers: u64) -> SocialMetrics {
    SocialMetrics {
        followers,
        engagement: 0.05,
        account_age_days: 120,
        is_verified: true,
        telegram_members: Some(5_000),
    }
}

pub fn safe_report() -> SecurityReport {
    SecurityReport {
        is_contract_verified: true,
        liquidity_locked: true,
        honeypot_score: 0.05,
        is_blacklisted: false,
        ownership_renounced: true,
        anti_whale: false,
    }
}

/// Adapter with scripted prices and execution results
pub struct MockAdapter {
    chain: Chain,
    default_price: Decimal,
    prices: Mutex<HashMap<String, Decimal>>,
    failing_prices: Mutex<HashSet<String>>,
    execute_failure: Mutex<Option<ExecutionFailure>>,
    executions: Mutex<Vec<SwapParams>>,
}

impl MockAdapter {
    pub fn new(chain: Chain) -> Self {
        Self {
            chain,
            default_price: Decimal::ONE,
            prices: Mutex::new(HashMap::new()),
            failing_prices: Mutex::new(HashSet::new()),
            execute_failure: Mutex::new(None),
            executions: Mutex::new(Vec::new()),
        }
    }

    pub fn set_price(&self, token: &str, price: Decimal) {
        self.prices.lock().unwrap().insert(token.to_string(), price);
    }

    pub fn fail_price(&self, token: &str) {
        self.failing_prices.lock().unwrap().insert(token.to_string());
    }

    pub fn fail_execution(&self, failure: ExecutionFailure) {
        *self.execute_failure.lock().unwrap() = Some(failure);
    }

    pub fn executions(&self) -> Vec<SwapParams> {
        self.executions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainAdapter for MockAdapter {
    fn chain(&self) -> Chain {
        self.chain
    }

    fn name(&self) -> &str {
        "mock"
    }

    async fn quote(&self, params: &SwapParams) -> Result<Quote, AdapterError> {
        Ok(Quote {
            input_amount: params.amount,
            output_amount: params.amount,
            price_impact: Decimal::ZERO,
            route: vec![params.token_in.clone(), params.token_out.clone()],
        })
    }

    async fn execute(&self, params: &SwapParams) -> Result<String, AdapterError> {
        if let Some(failure) = self.execute_failure.lock().unwrap().clone() {
            return Err(AdapterError::ExecutionFailed(failure));
        }
        let mut executions = self.executions.lock().unwrap();
        executions.push(params.clone());
        Ok(format!("mock-tx-{}", executions.len()))
    }

    async fn get_price(&self, token_address: &str) -> Result<Decimal, AdapterError> {
        if self.failing_prices.lock().unwrap().contains(token_address) {
            return Err(AdapterError::PriceUnavailable(token_address.to_string()));
        }
        Ok(self
            .prices
            .lock()
            .unwrap()
            .get(token_address)
            .copied()
            .unwrap_or(self.default_price))
    }
}

/// All four market data providers backed by fixed data
pub struct FakeMarket {
    pub pairs: Vec<Pair>,
    pub pairs_unavailable: bool,
    pub metadata_failures: HashSet<String>,
    pub social: SocialMetrics,
    pub social_unavailable: bool,
    pub security: SecurityReport,
    pub metadata_calls: AtomicUsize,
    /// How long each pair feed call takes
    pub pairs_delay: Duration,
    pub pair_calls: AtomicUsize,
    pub pairs_in_flight: AtomicUsize,
    pub max_pairs_in_flight: AtomicUsize,
}

impl Default for FakeMarket {
    fn default() -> Self {
        Self {
            pairs: Vec::new(),
            pairs_unavailable: false,
            metadata_failures: HashSet::new(),
            social: sample_social(60_000),
            social_unavailable: false,
            security: safe_report(),
            metadata_calls: AtomicUsize::new(0),
            pairs_delay: Duration::ZERO,
            pair_calls: AtomicUsize::new(0),
            pairs_in_flight: AtomicUsize::new(0),
            max_pairs_in_flight: AtomicUsize::new(0),
        }
    }
}

impl FakeMarket {
    pub fn with_pairs(pairs: Vec<Pair>) -> Self {
        Self {
            pairs,
            ..Default::default()
        }
    }

    pub fn into_market_data(self: Arc<Self>) -> MarketData {
        MarketData {
            pairs: self.clone(),
            metadata: self.clone(),
            social: self.clone(),
            security: self,
        }
    }
}

#[async_trait]
impl PairProvider for FakeMarket {
    async fn new_pairs(&self, chain: Chain) -> BotResult<Vec<Pair>> {
        self.pair_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.pairs_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_pairs_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        if !self.pairs_delay.is_zero() {
            tokio::time::sleep(self.pairs_delay).await;
        }
        self.pairs_in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.pairs_unavailable {
            return Err(BotError::provider("fake", "feed down"));
        }
        Ok(self.pairs.iter().filter(|p| p.chain == chain).cloned().collect())
    }

    async fn pair_info(&self, pair_address: &str, _chain: Chain) -> BotResult<Pair> {
        self.pairs
            .iter()
            .find(|p| p.address == pair_address)
            .cloned()
            .ok_or_else(|| BotError::provider("fake", "unknown pair"))
    }
}

#[async_trait]
impl MetadataProvider for FakeMarket {
    async fn token_metadata(&self, address: &str, _chain: Chain) -> BotResult<TokenMetadata> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if self.metadata_failures.contains(address) {
            return Err(BotError::provider("fake", format!("no metadata for {}", address)));
        }
        let symbol = self
            .pairs
            .iter()
            .find(|p| p.base_token.address == address)
            .map(|p| p.base_token.symbol.clone())
            .unwrap_or_else(|| "TKN".to_string());
        Ok(TokenMetadata {
            name: format!("{} Token", symbol),
            symbol,
            decimals: 18,
            total_supply: None,
            market_cap: Some(Decimal::from(2_000_000)),
        })
    }
}

#[async_trait]
impl SocialProvider for FakeMarket {
    async fn token_metrics(&self, _symbol: &str) -> BotResult<SocialMetrics> {
        if self.social_unavailable {
            return Err(BotError::provider("fake", "social feed down"));
        }
        Ok(self.social.clone())
    }
}

#[async_trait]
impl SecurityProvider for FakeMarket {
    async fn analyze_token(&self, _address: &str, _chain: Chain) -> BotResult<SecurityReport> {
        Ok(self.security.clone())
    }
}

pub fn registry_with(adapter: Arc<MockAdapter>) -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    for chain in Chain::all() {
        if *chain != adapter.chain() {
            registry.register(Arc::new(MockAdapter::new(*chain)));
        }
    }
    registry.register(adapter);
    registry
}

/// Discovery over `market` with mock adapters on every chain and no retry delay
pub fn pipeline(market: FakeMarket) -> TokenScoringPipeline {
    let registry = registry_with(Arc::new(MockAdapter::new(Chain::Eth)));
    TokenScoringPipeline::new(
        Arc::new(market).into_market_data(),
        Arc::new(registry),
        DiscoveryPolicy::default(),
    )
    .with_retry(3, Duration::ZERO)
}

/// Memory store whose `append_trade` can be switched to fail
#[derive(Default)]
pub struct FlakyStateStore {
    inner: MemoryStateStore,
    pub fail_append_trade: AtomicBool,
}

#[async_trait]
impl StateStore for FlakyStateStore {
    async fn register_bot(&self, config: BotConfig) -> BotResult<()> {
        self.inner.register_bot(config).await
    }

    async fn remove_bot(&self, bot_id: &str) -> BotResult<()> {
        self.inner.remove_bot(bot_id).await
    }

    async fn get_bot(&self, bot_id: &str) -> BotResult<BotConfig> {
        self.inner.get_bot(bot_id).await
    }

    async fn list_bots(&self) -> Vec<BotConfig> {
        self.inner.list_bots().await
    }

    async fn get_status(&self, bot_id: &str) -> BotResult<BotStatus> {
        self.inner.get_status(bot_id).await
    }

    async fn update_status(&self, status: BotStatus) -> BotResult<()> {
        self.inner.update_status(status).await
    }

    async fn set_active(&self, bot_id: &str, active: bool) -> BotResult<()> {
        self.inner.set_active(bot_id, active).await
    }

    async fn append_trade(&self, bot_id: &str, trade: Trade) -> BotResult<()> {
        if self.fail_append_trade.load(Ordering::SeqCst) {
            return Err(BotError::Store("store offline".to_string()));
        }
        self.inner.append_trade(bot_id, trade).await
    }

    async fn append_event(&self, event: BotEvent) {
        self.inner.append_event(event).await
    }

    async fn events(&self) -> Vec<BotEvent> {
        self.inner.events().await
    }
}

/// A complete in-memory runtime with handles to every fake
pub struct Harness {
    pub runtime: Arc<BotRuntime>,
    pub adapter: Arc<MockAdapter>,
    pub state: Arc<dyn StateStore>,
    pub persistence: Arc<OfflinePersistence>,
}

impl Harness {
    pub fn new(chain: Chain, market: FakeMarket) -> Self {
        Self::with_market(chain, Arc::new(market))
    }

    /// Keeps a handle on the market for tests that inspect its counters
    pub fn with_market(chain: Chain, market: Arc<FakeMarket>) -> Self {
        Self::with_state(chain, market, Arc::new(MemoryStateStore::default()))
    }

    pub fn with_state(chain: Chain, market: Arc<FakeMarket>, state: Arc<dyn StateStore>) -> Self {
        let adapter = Arc::new(MockAdapter::new(chain));
        let registry = Arc::new(registry_with(adapter.clone()));
        let pipeline = TokenScoringPipeline::new(
            market.into_market_data(),
            registry.clone(),
            DiscoveryPolicy::default(),
        )
        .with_retry(3, Duration::ZERO);
        let persistence = Arc::new(OfflinePersistence::new());
        let runtime = Arc::new(BotRuntime::new(
            pipeline,
            registry,
            state.clone(),
            persistence.clone(),
        ));
        Self {
            runtime,
            adapter,
            state,
            persistence,
        }
    }
}
