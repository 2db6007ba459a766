//! Per-bot recurring cycles with explicit cancellation

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::{BotError, BotResult};
use crate::events::BotEvent;
use crate::runner::BotRuntime;

/// One-shot cancellation flag that can also be awaited
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

struct BotHandle {
    cancel: Arc<CancelToken>,
    task: JoinHandle<()>,
}

/// Held across every cycle of one bot, so a restarted schedule waits for a
/// cycle still draining from the previous one.
type CycleLock = Arc<Mutex<()>>;

/// Owns the mapping from bot id to its running cycle
pub struct BotScheduler {
    runtime: Arc<BotRuntime>,
    handles: Mutex<HashMap<String, BotHandle>>,
    cycle_locks: Mutex<HashMap<String, CycleLock>>,
}

impl BotScheduler {
    pub fn new(runtime: Arc<BotRuntime>) -> Self {
        Self {
            runtime,
            handles: Mutex::new(HashMap::new()),
            cycle_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn cycle_lock(&self, bot_id: &str) -> CycleLock {
        self.cycle_locks
            .lock()
            .await
            .entry(bot_id.to_string())
            .or_default()
            .clone()
    }

    pub fn runtime(&self) -> &Arc<BotRuntime> {
        &self.runtime
    }

    /// Starts the bot's schedule. Returns false if it was already running.
    pub async fn start(&self, bot_id: &str) -> BotResult<bool> {
        let mut handles = self.handles.lock().await;
        if let Some(handle) = handles.get(bot_id) {
            if !handle.task.is_finished() {
                debug!(bot_id, "Start ignored, bot already running");
                return Ok(false);
            }
        }

        let config = self.runtime.state().get_bot(bot_id).await?;
        let interval = config.cycle_interval();
        if interval.is_zero() {
            return Err(BotError::Validation(format!(
                "bot {} has a zero price check interval",
                bot_id
            )));
        }
        self.runtime.state().set_active(bot_id, true).await?;

        let cancel = Arc::new(CancelToken::new());
        let task = tokio::spawn(run_schedule(
            self.runtime.clone(),
            bot_id.to_string(),
            interval,
            cancel.clone(),
            self.cycle_lock(bot_id).await,
        ));
        handles.insert(bot_id.to_string(), BotHandle { cancel, task });

        info!(bot_id, "▶️ Bot started, cycle every {}s", interval.as_secs());
        Ok(true)
    }

    /// Stops the bot's schedule. Returns false if it was not running.
    /// A cycle already in flight finishes, but no further cycle starts.
    pub async fn stop(&self, bot_id: &str) -> BotResult<bool> {
        let Some(handle) = self.handles.lock().await.remove(bot_id) else {
            debug!(bot_id, "Stop ignored, bot not running");
            return Ok(false);
        };
        handle.cancel.cancel();
        self.runtime.state().set_active(bot_id, false).await?;
        info!(bot_id, "⏹️ Bot stopped");
        Ok(true)
    }

    /// Stops the bot and drops its cycle lock unless a cycle still holds it.
    pub async fn forget(&self, bot_id: &str) -> BotResult<()> {
        self.stop(bot_id).await?;
        let mut locks = self.cycle_locks.lock().await;
        if locks.get(bot_id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(bot_id);
        }
        Ok(())
    }

    pub async fn is_running(&self, bot_id: &str) -> bool {
        self.handles
            .lock()
            .await
            .get(bot_id)
            .map(|h| !h.task.is_finished())
            .unwrap_or(false)
    }

    pub async fn running(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.handles.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Stops every bot and waits for in-flight cycles to finish.
    pub async fn shutdown(&self) {
        let handles: Vec<(String, BotHandle)> = self.handles.lock().await.drain().collect();
        for (bot_id, handle) in handles {
            handle.cancel.cancel();
            if let Err(e) = handle.task.await {
                tracing::warn!(bot_id = %bot_id, "Bot task ended abnormally: {}", e);
            }
            if let Err(e) = self.runtime.state().set_active(&bot_id, false).await {
                debug!(bot_id = %bot_id, "Could not mark bot inactive: {}", e);
            }
        }
        info!("All bots stopped");
    }
}

impl Drop for BotScheduler {
    fn drop(&mut self) {
        for handle in self.handles.get_mut().values() {
            handle.cancel.cancel();
        }
    }
}

/// First cycle fires one interval after start, then every interval.
async fn run_schedule(
    runtime: Arc<BotRuntime>,
    bot_id: String,
    interval: Duration,
    cancel: Arc<CancelToken>,
    cycle_lock: CycleLock,
) {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let _cycle = cycle_lock.lock().await;
        if cancel.is_cancelled() {
            break;
        }
        match runtime.run_cycle(&bot_id).await {
            Ok(summary) => debug!(bot_id = %bot_id, "{:?}", summary),
            Err(e) => {
                let error = BotError::Cycle(e.to_string());
                runtime
                    .state()
                    .append_event(BotEvent::error(&bot_id, error.to_string()))
                    .await;
            }
        }
    }
    debug!(bot_id = %bot_id, "Schedule ended");
}
