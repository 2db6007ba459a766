//! Append-only JSONL trade journal

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::bot::Trade;
use crate::error::{BotError, BotResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub recorded_at: String,
    pub session_id: String,
    /// "PAPER" or "LIVE"
    pub mode: String,
    pub bot_id: String,
    pub trade: Trade,
}

pub struct TradeJournal {
    file_path: PathBuf,
    session_id: String,
    dry_run: bool,
}

impl TradeJournal {
    pub fn new(file_path: impl AsRef<Path>, session_id: &str, dry_run: bool) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        if let Some(parent) = file_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!("Could not create journal directory {}: {}", parent.display(), e);
            }
        }

        Self {
            file_path,
            session_id: session_id.to_string(),
            dry_run,
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn record(&self, bot_id: &str, trade: &Trade) -> BotResult<()> {
        let entry = JournalEntry {
            recorded_at: Utc::now().to_rfc3339(),
            session_id: self.session_id.clone(),
            mode: if self.dry_run { "PAPER" } else { "LIVE" }.to_string(),
            bot_id: bot_id.to_string(),
            trade: trade.clone(),
        };
        let json = serde_json::to_string(&entry)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .map_err(|e| {
                BotError::Store(format!("open journal {}: {}", self.file_path.display(), e))
            })?;
        writeln!(file, "{}", json)
            .map_err(|e| BotError::Store(format!("write journal: {}", e)))
    }

    /// Reads every entry back, skipping lines that fail to parse.
    pub fn entries(&self) -> BotResult<Vec<JournalEntry>> {
        if !self.file_path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.file_path)
            .map_err(|e| BotError::Store(format!("read journal: {}", e)))?;
        Ok(content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}
