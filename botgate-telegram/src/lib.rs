//! # botgate-telegram
//!
//! Telegram Bot API gateway layer: HTTP transport, cursor-driven update polling,
//! the consumer registry, the per-update dispatch router, and the [`BotInterface`]
//! facade application code talks to. Handles only connectivity and update
//! distribution; what handlers do with updates is up to the application.

mod config;
mod interface;
mod poller;
mod registry;
mod router;
mod transport;

pub use config::{BotConfig, PollConfig};
pub use interface::BotInterface;
pub use poller::UpdatePoller;
pub use registry::{ConsumerRegistry, SubscriptionId};
pub use router::UpdateRouter;
pub use transport::{HttpTransport, Transport};
