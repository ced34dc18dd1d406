//! Consumer registry: handler chain entries, global and chat-scoped subscriber
//! queues, and pending one-shot request/response waiters. All mutations serialize
//! on a single write lock; routing reads a consistent snapshot per update and
//! fulfills pendings under the write lock so an entry resolves at most once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use botgate_core::{BotError, Result, Update};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::debug;
use update_chain::{ChainEntry, HandlerChain, HandlerId, UpdateAction, UpdateFilter};

/// Identity of a subscriber queue, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// One-shot waiter: acceptance predicate plus its single-use completion handle.
struct PendingEntry {
    filter: UpdateFilter,
    sender: oneshot::Sender<Update>,
}

#[derive(Default)]
struct RegistryInner {
    chain: HandlerChain,
    global: Vec<(SubscriptionId, mpsc::UnboundedSender<Update>)>,
    chat_feed: Vec<(SubscriptionId, mpsc::UnboundedSender<(i64, Update)>)>,
    chats: HashMap<i64, Vec<(SubscriptionId, mpsc::UnboundedSender<Update>)>>,
    pending: HashMap<(i64, i64), PendingEntry>,
}

/// What a routing pass works against: the chain and queue senders as they were
/// when routing for the update began. Registrations made afterwards are not
/// observed by that pass.
pub(crate) struct RouteSnapshot {
    pub chain: HandlerChain,
    pub global: Vec<mpsc::UnboundedSender<Update>>,
    pub chat_feed: Vec<mpsc::UnboundedSender<(i64, Update)>>,
    pub chat: Vec<mpsc::UnboundedSender<Update>>,
}

/// Thread-safe store of every registered consumer.
pub struct ConsumerRegistry {
    inner: RwLock<RegistryInner>,
    next_handler: AtomicU64,
    next_subscription: AtomicU64,
}

impl ConsumerRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
            next_handler: AtomicU64::new(1),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Appends a chain entry; entries keep registration order.
    pub async fn register_handler(
        &self,
        filter: UpdateFilter,
        action: Arc<dyn UpdateAction>,
    ) -> HandlerId {
        let id = HandlerId(self.next_handler.fetch_add(1, Ordering::SeqCst));
        let mut inner = self.inner.write().await;
        inner.chain.push(ChainEntry { id, filter, action });
        debug!(handler_id = id.0, chain_len = inner.chain.len(), "handler registered");
        id
    }

    /// Removes a chain entry by id. Returns false when no such entry exists.
    pub async fn unregister_handler(&self, id: HandlerId) -> bool {
        let mut inner = self.inner.write().await;
        inner.chain.remove(id)
    }

    /// Registers a queue receiving every update.
    pub async fn subscribe_global(&self) -> (SubscriptionId, mpsc::UnboundedReceiver<Update>) {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.write().await.global.push((id, tx));
        (id, rx)
    }

    /// Registers a queue receiving every chat-attributed update as `(chat, update)`.
    pub async fn subscribe_chat_feed(
        &self,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<(i64, Update)>) {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.write().await.chat_feed.push((id, tx));
        (id, rx)
    }

    /// Registers a queue receiving every update for one chat. A second
    /// subscription on the same chat is independent of the first.
    pub async fn subscribe_chat(
        &self,
        chat_id: i64,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<Update>) {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .write()
            .await
            .chats
            .entry(chat_id)
            .or_default()
            .push((id, tx));
        (id, rx)
    }

    /// Removes one chat-scoped subscription. Returns false when no such
    /// subscription exists.
    pub async fn unsubscribe_chat(&self, chat_id: i64, id: SubscriptionId) -> bool {
        let mut inner = self.inner.write().await;
        let Some(subs) = inner.chats.get_mut(&chat_id) else {
            return false;
        };
        let before = subs.len();
        subs.retain(|(sub_id, _)| *sub_id != id);
        let removed = subs.len() != before;
        if subs.is_empty() {
            inner.chats.remove(&chat_id);
        }
        removed
    }

    /// Registers a one-shot waiter for the next update in `chat_id` accepted by
    /// `filter`. Fails with [`BotError::DuplicateRequest`] when the
    /// `(chat, request id)` key is already pending; the registry is unchanged
    /// on failure.
    pub async fn register_pending(
        &self,
        chat_id: i64,
        request_id: i64,
        filter: UpdateFilter,
    ) -> Result<oneshot::Receiver<Update>> {
        use std::collections::hash_map::Entry;
        let mut inner = self.inner.write().await;
        match inner.pending.entry((chat_id, request_id)) {
            Entry::Occupied(_) => Err(BotError::DuplicateRequest {
                chat_id,
                request_id,
            }),
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                slot.insert(PendingEntry { filter, sender: tx });
                Ok(rx)
            }
        }
    }

    /// Removes a pending waiter without invoking its handle (caller-driven
    /// timeout or teardown). Returns false when the entry already resolved.
    pub async fn cancel_pending(&self, chat_id: i64, request_id: i64) -> bool {
        self.inner
            .write()
            .await
            .pending
            .remove(&(chat_id, request_id))
            .is_some()
    }

    /// Number of pending waiters across all chats.
    pub async fn pending_len(&self) -> usize {
        self.inner.read().await.pending.len()
    }

    /// Snapshot for one routing pass. Chain entries and queue senders are
    /// cloned under the read lock; pendings are handled separately in
    /// [`Self::take_matching_pending`].
    pub(crate) async fn snapshot(&self, chat_id: Option<i64>) -> RouteSnapshot {
        let inner = self.inner.read().await;
        RouteSnapshot {
            chain: inner.chain.clone(),
            global: inner.global.iter().map(|(_, tx)| tx.clone()).collect(),
            chat_feed: inner.chat_feed.iter().map(|(_, tx)| tx.clone()).collect(),
            chat: chat_id
                .and_then(|id| inner.chats.get(&id))
                .map(|subs| subs.iter().map(|(_, tx)| tx.clone()).collect())
                .unwrap_or_default(),
        }
    }

    /// Removes and returns the completion handles of every pending waiter for
    /// `chat_id` whose predicate accepts the update. Removal happens under the
    /// write lock, so two updates matching the same entry nearly simultaneously
    /// cannot both claim it.
    pub(crate) async fn take_matching_pending(
        &self,
        chat_id: i64,
        update: &Update,
    ) -> Vec<oneshot::Sender<Update>> {
        let mut inner = self.inner.write().await;
        let matched: Vec<(i64, i64)> = inner
            .pending
            .iter()
            .filter(|((chat, _), entry)| *chat == chat_id && entry.filter.matches(update))
            .map(|(key, _)| *key)
            .collect();
        matched
            .into_iter()
            .filter_map(|key| inner.pending.remove(&key))
            .map(|entry| entry.sender)
            .collect()
    }
}

impl Default for ConsumerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
