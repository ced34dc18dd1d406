//! Cursor-driven update poller: sleep, fetch with the current cursor as offset,
//! decode, hand off to the router, advance the cursor. Fetch failures skip the
//! cycle without touching the cursor; stop is cooperative and takes effect at
//! the next loop boundary.

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use botgate_core::{decode_update, GetUpdatesArgs, Result};
use tracing::{error, info, warn};

use crate::config::PollConfig;
use crate::router::UpdateRouter;
use crate::transport::Transport;

/// Repeatedly fetches update batches and feeds them to the router.
pub struct UpdatePoller {
    transport: Arc<dyn Transport>,
    router: UpdateRouter,
    config: PollConfig,
    webhook: bool,
    /// One plus the highest update id ever observed. Never decreases.
    cursor: AtomicI64,
    running: AtomicBool,
    /// Bumped on every start. Each loop captures its own generation and exits
    /// when a newer one exists, so stop-then-start can never leave the
    /// superseded loop fetching alongside its replacement.
    generation: AtomicU64,
}

impl UpdatePoller {
    pub fn new(
        transport: Arc<dyn Transport>,
        router: UpdateRouter,
        config: PollConfig,
        webhook: bool,
    ) -> Self {
        Self {
            transport,
            router,
            config,
            webhook,
            cursor: AtomicI64::new(0),
            running: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Current cursor value, i.e. the offset the next fetch will use.
    pub fn cursor(&self) -> i64 {
        self.cursor.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Starts the polling loop on its own task. Fails with
    /// `ConfigurationConflict` on a webhook-configured interface and
    /// `AlreadyRunning` when the loop is already active.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        if self.webhook {
            return Err(botgate_core::BotError::ConfigurationConflict);
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(botgate_core::BotError::AlreadyRunning);
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let poller = Arc::clone(self);
        tokio::spawn(async move {
            poller.run(generation).await;
        });
        Ok(())
    }

    /// Requests a cooperative stop, consumed at the next loop boundary. An
    /// in-flight fetch and already-spawned routing tasks are not interrupted.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    async fn run(&self, generation: u64) {
        info!(
            generation,
            interval_ms = self.config.interval.as_millis() as u64,
            "update polling started"
        );
        loop {
            tokio::time::sleep(self.config.interval).await;
            // A restart between this loop's boundaries flips `running` back to
            // true; the generation check keeps the superseded loop from riding
            // on the new one's flag.
            if !self.running.load(Ordering::SeqCst)
                || self.generation.load(Ordering::SeqCst) != generation
            {
                break;
            }

            let args = GetUpdatesArgs {
                offset: self.cursor.load(Ordering::SeqCst),
                limit: self.config.limit,
                timeout: self.config.timeout,
                allowed_updates: self.config.allowed_updates.clone(),
            };
            let batch = match self.transport.fetch_updates(&args).await {
                Ok(batch) => batch,
                Err(e) => {
                    // Implicit retry: next cycle refetches from the same offset.
                    warn!(error = %e, offset = args.offset, "fetching updates failed, cycle skipped");
                    continue;
                }
            };

            for value in batch {
                let update = match decode_update(&value) {
                    Ok(update) => update,
                    Err(e) => {
                        error!(error = %e, "skipping undecodable update");
                        // Still move past the item when its id is readable, or
                        // the next fetch would return the same poison entry.
                        if let Some(id) = value.get("update_id").and_then(|v| v.as_i64()) {
                            self.cursor.fetch_max(id + 1, Ordering::SeqCst);
                        }
                        continue;
                    }
                };
                let next = update.id + 1;
                self.router.route(update);
                // Advance per item, not per batch: a slow routing task cannot
                // hold the cursor back.
                self.cursor.fetch_max(next, Ordering::SeqCst);
            }
        }
        info!(generation, cursor = self.cursor(), "update polling stopped");
    }
}
