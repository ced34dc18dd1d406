//! The facade application code talks to: construction (guarded to one instance
//! per process), polling control, subscriber and handler registration, awaiting
//! a correlated update, and the representative outbound calls.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use botgate_core::{BotError, Message, Result, SendMessageArgs, Update, User};
use tokio::sync::mpsc;
use tracing::{debug, info};
use update_chain::{HandlerId, UpdateAction, UpdateFilter};

use crate::config::BotConfig;
use crate::poller::UpdatePoller;
use crate::registry::{ConsumerRegistry, SubscriptionId};
use crate::router::UpdateRouter;
use crate::transport::{HttpTransport, Transport};

/// One interface per process: cursor and registry are process-wide state, and a
/// second poller against the same credential would race the first.
static INTERFACE_CREATED: AtomicBool = AtomicBool::new(false);

/// The bot gateway. Owns the registry, router and poller for one credential.
pub struct BotInterface {
    transport: Arc<dyn Transport>,
    registry: Arc<ConsumerRegistry>,
    poller: Arc<UpdatePoller>,
    next_request_id: AtomicI64,
}

impl BotInterface {
    /// Creates the interface with the production HTTP transport.
    pub fn create(config: BotConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(
            config.bot_token.clone(),
            config.api_url.clone(),
        ));
        Self::with_transport(config, transport)
    }

    /// Creates the interface with a caller-supplied transport (tests, proxies).
    /// Fails with [`BotError::InterfaceAlreadyCreated`] on a second
    /// construction attempt in the same process.
    pub fn with_transport(config: BotConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        if INTERFACE_CREATED.swap(true, Ordering::SeqCst) {
            return Err(BotError::InterfaceAlreadyCreated);
        }
        let registry = Arc::new(ConsumerRegistry::new());
        let router = UpdateRouter::new(Arc::clone(&registry));
        let poller = Arc::new(UpdatePoller::new(
            Arc::clone(&transport),
            router,
            config.poll.clone(),
            config.webhook,
        ));
        info!(webhook = config.webhook, "bot interface created");
        Ok(Self {
            transport,
            registry,
            poller,
            next_request_id: AtomicI64::new(1),
        })
    }

    /// Starts the update polling loop.
    pub fn start_polling(&self) -> Result<()> {
        self.poller.start()
    }

    /// Cooperatively stops the polling loop. Pending requests and handler
    /// registrations are untouched; cancel and unregister them explicitly.
    pub fn stop_polling(&self) {
        self.poller.stop();
    }

    /// Current delivery cursor (one plus the highest update id observed).
    pub fn cursor(&self) -> i64 {
        self.poller.cursor()
    }

    /// The registry, for lower-level registration control (explicit request
    /// ids, subscription bookkeeping).
    pub fn registry(&self) -> &Arc<ConsumerRegistry> {
        &self.registry
    }

    /// A queue receiving every update. Each call registers an independent
    /// subscriber.
    pub async fn global_updates(&self) -> mpsc::UnboundedReceiver<Update> {
        self.registry.subscribe_global().await.1
    }

    /// A queue receiving every chat-attributed update as `(chat, update)`.
    pub async fn chat_updates(&self) -> mpsc::UnboundedReceiver<(i64, Update)> {
        self.registry.subscribe_chat_feed().await.1
    }

    /// A queue receiving every update for one chat.
    pub async fn subscribe_chat(
        &self,
        chat_id: i64,
    ) -> (SubscriptionId, mpsc::UnboundedReceiver<Update>) {
        self.registry.subscribe_chat(chat_id).await
    }

    pub async fn unsubscribe_chat(&self, chat_id: i64, id: SubscriptionId) -> bool {
        self.registry.unsubscribe_chat(chat_id, id).await
    }

    /// Registers a predicate-guarded action on the handler chain.
    pub async fn register_handler(
        &self,
        filter: UpdateFilter,
        action: Arc<dyn UpdateAction>,
    ) -> HandlerId {
        self.registry.register_handler(filter, action).await
    }

    pub async fn unregister_handler(&self, id: HandlerId) -> bool {
        self.registry.unregister_handler(id).await
    }

    /// Waits for the next update in `chat_id` accepted by `filter`, up to
    /// `timeout`. The one-shot waiter is removed on fulfillment and cancelled
    /// on timeout, so it can never fire twice or leak. A cancellation from
    /// elsewhere (via [`ConsumerRegistry::cancel_pending`]) surfaces as
    /// [`BotError::RequestCancelled`] rather than a timeout.
    pub async fn await_next_update(
        &self,
        chat_id: i64,
        filter: UpdateFilter,
        timeout: Duration,
    ) -> Result<Update> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        let receiver = self
            .registry
            .register_pending(chat_id, request_id, filter)
            .await?;
        match tokio::time::timeout(timeout, receiver).await {
            Ok(Ok(update)) => Ok(update),
            Ok(Err(_)) => {
                // Sender dropped without sending: cancelled from elsewhere.
                debug!(chat_id, request_id, "pending request cancelled before fulfillment");
                Err(BotError::RequestCancelled)
            }
            Err(_) => {
                self.registry.cancel_pending(chat_id, request_id).await;
                Err(BotError::RequestTimeout)
            }
        }
    }

    /// `getMe`: the bot's own identity.
    pub async fn get_me(&self) -> Result<User> {
        let result = self
            .transport
            .call_method("getMe", serde_json::Value::Null)
            .await?;
        serde_json::from_value(result).map_err(BotError::from)
    }

    /// `sendMessage`: sends text to a chat, optionally as a reply.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_to_message_id: Option<i64>,
    ) -> Result<Message> {
        let args = SendMessageArgs {
            chat_id,
            text: text.to_string(),
            reply_to_message_id,
        };
        let result = self
            .transport
            .call_method("sendMessage", serde_json::to_value(&args)?)
            .await?;
        serde_json::from_value(result).map_err(BotError::from)
    }
}
