//! DexScout trading bot
//!
//! Discovers freshly listed tokens and trades them through per-chain DEX adapters.

use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

mod bots;
mod logging;
mod providers;

use dexscout_core::{
    config::Config,
    discovery::TokenScoringPipeline,
    providers::{dexscreener::DexScreenerClient, MarketData},
    runner::BotRuntime,
    store::{MemoryStateStore, OfflinePersistence, Persistence, RestPersistence, TradeJournal},
    BotManager, Chain, ChainAdapter,
};
use dexscout_dex_plugins::{
    default_registry, DexScreenerPriceFeed, NoSignerSubmitter, PaperSubmitter,
    TransactionSubmitter,
};
use providers::{DemoSocialProvider, HeuristicSecurityProvider};

fn persistence(config: &Config) -> Result<Arc<dyn Persistence>> {
    match &config.persistence {
        Some(remote) => {
            info!("🗄️  Persisting to {}", remote.url);
            Ok(Arc::new(RestPersistence::new(remote)?))
        }
        None => {
            warn!("⚠️  SUPABASE_URL / SUPABASE_ANON_KEY not set, running in offline demo mode");
            let session_id = format!("SESSION-{}", Utc::now().format("%Y%m%d-%H%M%S"));
            let journal_file = if config.dry_run {
                "data/trades-sim.jsonl"
            } else {
                "data/trades-live.jsonl"
            };
            info!("📜 Trades will be journaled to: {}", journal_file);
            Ok(Arc::new(OfflinePersistence::with_journal(TradeJournal::new(
                journal_file,
                &session_id,
                config.dry_run,
            ))))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    logging::setup(std::env::var("LOG_LEVEL").ok().as_deref());

    let config = Config::from_env();

    info!("🚀 DexScout starting...");
    info!("   DexScreener API: {}", config.dexscreener_api_url);
    info!(
        "   Min liquidity: ${} | Min 24h volume: ${} | Max pair age: {}h",
        config.discovery.min_liquidity_usd,
        config.discovery.min_volume_24h_usd,
        config.discovery.max_pair_age_hours
    );

    let submitter: Arc<dyn TransactionSubmitter> = if config.dry_run {
        info!("⚠️  Running in DRY RUN mode - swaps are paper traded");
        Arc::new(PaperSubmitter)
    } else {
        warn!("🔴 LIVE mode requested but no signer is configured, swaps will be rejected");
        Arc::new(NoSignerSubmitter)
    };

    let persistence = persistence(&config)?;

    let dexscreener = Arc::new(
        DexScreenerClient::new(config.dexscreener_api_url.as_str())
            .context("building DexScreener client")?,
    );
    let feed = Arc::new(DexScreenerPriceFeed::new(dexscreener.clone()));
    let adapters = Arc::new(default_registry(feed, submitter));
    for chain in Chain::all() {
        if let Ok(adapter) = adapters.get_adapter(*chain) {
            info!("🔌 {} -> {} (RPC {})", chain, adapter.name(), config.rpc_url(*chain));
        }
    }

    let market = MarketData {
        pairs: dexscreener.clone(),
        metadata: dexscreener,
        social: Arc::new(DemoSocialProvider::new()),
        security: Arc::new(HeuristicSecurityProvider::with_blocklist(
            &config.token_blocklist,
        )),
    };
    let pipeline = TokenScoringPipeline::new(market, adapters.clone(), config.discovery.clone());
    let state = Arc::new(MemoryStateStore::new(config.event_history_limit));
    let runtime = Arc::new(BotRuntime::new(pipeline, adapters, state, persistence));
    let manager = BotManager::new(runtime);

    if !config.is_offline() {
        match manager.load_persisted().await {
            Ok(count) => info!("📥 Restored {} persisted bots", count),
            Err(e) => error!("Failed to restore persisted bots: {}", e),
        }
    }

    let definitions = bots::load(&config.bots_file)?;
    if definitions.is_empty() {
        warn!("No bot definitions found in {}", config.bots_file);
    }
    for definition in definitions {
        let id = definition.id.clone();
        if manager.status(&id).await.is_ok() {
            continue;
        }
        if let Err(e) = manager.create_bot(definition).await {
            error!(bot_id = %id, "Rejected bot definition: {}", e);
            continue;
        }
        if let Err(e) = manager.start_bot(&id).await {
            error!(bot_id = %id, "Failed to start bot: {}", e);
        }
    }

    for (bot, status) in manager.list().await {
        info!(
            bot_id = %bot.id,
            chain = %bot.chain,
            "🤖 {} active={} every {}s",
            bot.name,
            status.is_active,
            bot.monitoring.price_check_interval
        );
    }

    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    info!("🛑 Shutdown requested, stopping bots...");
    manager.shutdown().await;

    for event in manager.events().await.iter().take(10) {
        info!(
            "   [{:?}] {} {}",
            event.kind,
            event.bot_id.as_deref().unwrap_or("-"),
            event.message
        );
    }
    info!("👋 DexScout stopped");
    Ok(())
}
