use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    /// Fetch-level network failure; the poller retries on the next cycle.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The platform explicitly rejected a method call (`ok: false`).
    #[error("Method {method} rejected (code {error_code:?}): {description}")]
    Rejected {
        method: String,
        error_code: Option<i64>,
        description: String,
    },

    /// A consumer action failed during routing; contained at the router boundary.
    #[error("Handler action error: {0}")]
    Action(String),

    /// A pending request with the same (chat, request id) key already exists.
    #[error("Duplicate pending request for chat {chat_id}, request id {request_id}")]
    DuplicateRequest { chat_id: i64, request_id: i64 },

    #[error("Update polling is already running")]
    AlreadyRunning,

    /// Polling was started on an interface configured for webhook delivery.
    #[error("Interface is configured for webhook delivery")]
    ConfigurationConflict,

    /// A bot interface already exists in this process.
    #[error("Bot interface already created")]
    InterfaceAlreadyCreated,

    #[error("Timed out waiting for a matching update")]
    RequestTimeout,

    /// The pending request was cancelled before an update matched it.
    #[error("Pending request cancelled before fulfillment")]
    RequestCancelled,

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BotError>;
