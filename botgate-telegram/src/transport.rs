//! Outbound transport: one trait seam plus the production reqwest implementation.
//! Network failures surface as [`BotError::Transport`]; an `ok: false` envelope
//! surfaces as [`BotError::Rejected`] with the platform's code and description.

use async_trait::async_trait;
use botgate_core::{ApiEnvelope, BotError, GetUpdatesArgs, Result};
use tracing::debug;

/// Outbound call seam. Production uses [`HttpTransport`]; tests substitute a
/// scripted implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches the next ordered batch of raw update payloads.
    async fn fetch_updates(&self, args: &GetUpdatesArgs) -> Result<Vec<serde_json::Value>>;

    /// Calls an arbitrary platform method and returns the raw `result` payload.
    async fn call_method(&self, method: &str, args: serde_json::Value)
        -> Result<serde_json::Value>;
}

/// reqwest-based [`Transport`] speaking the Bot API's JSON POST convention.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

const DEFAULT_API_URL: &str = "https://api.telegram.org";

impl HttpTransport {
    /// Creates a transport for the given token. `api_url` overrides the
    /// platform base URL when set.
    pub fn new(token: String, api_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            token,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch_updates(&self, args: &GetUpdatesArgs) -> Result<Vec<serde_json::Value>> {
        let args = serde_json::to_value(args)?;
        let result = self.call_method("getUpdates", args).await?;
        serde_json::from_value(result).map_err(BotError::from)
    }

    async fn call_method(
        &self,
        method: &str,
        args: serde_json::Value,
    ) -> Result<serde_json::Value> {
        debug!(method = %method, "calling platform method");
        let response = self
            .client
            .post(self.method_url(method))
            .json(&args)
            .send()
            .await
            .map_err(|e| BotError::Transport(e.to_string()))?;

        let envelope: ApiEnvelope<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| BotError::Transport(e.to_string()))?;

        if !envelope.ok {
            return Err(BotError::Rejected {
                method: method.to_string(),
                error_code: envelope.error_code,
                description: envelope
                    .description
                    .unwrap_or_else(|| "server returned false for \"ok\" field".to_string()),
            });
        }
        Ok(envelope.result.unwrap_or(serde_json::Value::Null))
    }
}
