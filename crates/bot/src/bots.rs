//! Bot definitions file

use anyhow::{Context, Result};
use dexscout_core::BotConfig;
use serde::Deserialize;
use std::path::Path;

/// Either a bare array or `{ "bots": [...] }`
#[derive(Deserialize)]
#[serde(untagged)]
enum BotsFile {
    List(Vec<BotConfig>),
    Wrapped { bots: Vec<BotConfig> },
}

pub fn parse(json: &str) -> Result<Vec<BotConfig>> {
    let file: BotsFile = serde_json::from_str(json).context("malformed bot definitions")?;
    Ok(match file {
        BotsFile::List(bots) | BotsFile::Wrapped { bots } => bots,
    })
}

/// A missing file means no bots, not an error.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<BotConfig>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse(&json).with_context(|| format!("parsing {}", path.display()))
}
