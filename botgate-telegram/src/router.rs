//! Dispatch router: one independent routing task per update. Each consumer leg
//! (global queues, chat queues, pending waiters, handler chain) is attempted
//! regardless of what the others do; failures are logged and contained here,
//! never surfaced to the poller.

use std::sync::Arc;

use botgate_core::Update;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::registry::ConsumerRegistry;

/// Routes decoded updates to every interested consumer.
#[derive(Clone)]
pub struct UpdateRouter {
    registry: Arc<ConsumerRegistry>,
}

impl UpdateRouter {
    pub fn new(registry: Arc<ConsumerRegistry>) -> Self {
        Self { registry }
    }

    /// Spawns an independent task routing this update. A slow or hanging
    /// consumer delays only its own update's task, never the poller or the
    /// routing of other updates. The handle is returned so tests can await
    /// completion; production callers drop it.
    pub fn route(&self, update: Update) -> JoinHandle<()> {
        let router = self.clone();
        tokio::spawn(async move {
            router.deliver(update).await;
        })
    }

    async fn deliver(&self, update: Update) {
        let update_id = update.id;
        let chat_id = update.chat_id();
        let snapshot = self.registry.snapshot(chat_id).await;

        // Global queues get every update unconditionally.
        for tx in &snapshot.global {
            if tx.send(update.clone()).is_err() {
                debug!(update_id, "global subscriber dropped its receiver");
            }
        }

        if let Some(chat) = chat_id {
            for tx in &snapshot.chat_feed {
                if tx.send((chat, update.clone())).is_err() {
                    debug!(update_id, chat_id = chat, "chat feed subscriber dropped");
                }
            }
            for tx in &snapshot.chat {
                if tx.send(update.clone()).is_err() {
                    debug!(update_id, chat_id = chat, "chat subscriber dropped");
                }
            }

            // Every matching waiter is removed before its handle fires, so a
            // later update can never re-resolve it.
            let waiters = self.registry.take_matching_pending(chat, &update).await;
            for sender in waiters {
                if sender.send(update.clone()).is_err() {
                    debug!(update_id, chat_id = chat, "pending waiter gone before fulfillment");
                } else {
                    info!(update_id, chat_id = chat, "pending request fulfilled");
                }
            }
        }

        // Chain evaluation isolates its own per-entry failures; a panic inside
        // an action is additionally confined to this task by the spawn above.
        let outcome = snapshot.chain.dispatch(&update).await;
        debug!(update_id, outcome = ?outcome, "update routed");
    }
}
