//! DexScout Core Library
//!
//! Bot execution engine for multi-chain token discovery and automated trading:
//! per-bot scheduling, the discovery and scoring pipeline, risk-gated trade
//! decisions and the chain adapter contract the trading loop runs against.

pub mod bot;
pub mod chain;
pub mod config;
pub mod decision;
pub mod discovery;
pub mod error;
pub mod events;
#[cfg(feature = "http")]
pub mod http;
pub mod manager;
pub mod providers;
pub mod runner;
pub mod scheduler;
pub mod scoring;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
mod testing;

pub use bot::*;
pub use chain::{AdapterRegistry, ChainAdapter, Quote, SwapParams};
pub use error::*;
pub use events::{BotEvent, BotEventKind, EventLog};
pub use manager::BotManager;
pub use types::*;
