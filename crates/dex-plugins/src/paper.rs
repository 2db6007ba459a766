//! Transaction submission. Signing and broadcast live behind [`TransactionSubmitter`].

use async_trait::async_trait;
use dexscout_core::chain::{Quote, SwapParams};
use dexscout_core::error::{AdapterError, ExecutionFailure};
use dexscout_core::Chain;
use tracing::info;
use uuid::Uuid;

#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    /// Submits a quoted swap and returns its transaction id.
    async fn submit(
        &self,
        chain: Chain,
        dex: &str,
        params: &SwapParams,
        quote: &Quote,
    ) -> Result<String, AdapterError>;
}

/// Dry-run submitter: logs the swap and mints a paper transaction id
#[derive(Debug, Clone, Copy, Default)]
pub struct PaperSubmitter;

#[async_trait]
impl TransactionSubmitter for PaperSubmitter {
    async fn submit(
        &self,
        chain: Chain,
        dex: &str,
        params: &SwapParams,
        quote: &Quote,
    ) -> Result<String, AdapterError> {
        let tx_id = format!("paper-{}-{}", chain.tag().to_lowercase(), Uuid::new_v4());
        info!(
            chain = %chain,
            "📝 PAPER SWAP on {}: {} {} -> {} {} (impact {}%, route {})",
            dex,
            params.amount,
            params.token_in,
            quote.output_amount.round_dp(6),
            params.token_out,
            quote.price_impact.round_dp(3),
            quote.route.join(" > ")
        );
        Ok(tx_id)
    }
}

/// Live mode without a signer: every swap is rejected
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSignerSubmitter;

#[async_trait]
impl TransactionSubmitter for NoSignerSubmitter {
    async fn submit(
        &self,
        chain: Chain,
        dex: &str,
        _params: &SwapParams,
        _quote: &Quote,
    ) -> Result<String, AdapterError> {
        Err(AdapterError::ExecutionFailed(ExecutionFailure::Rejected(format!(
            "no signer configured for {} on {}",
            dex, chain
        ))))
    }
}
