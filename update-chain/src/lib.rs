//! # Update chain
//!
//! Ordered, predicate-guarded actions evaluated once per update. The first action that
//! reports Consumed ends evaluation for that update; a failing action is logged and the
//! chain moves on, so one bad handler never starves the rest.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use botgate_core::{Result, Update};
use tracing::{debug, error, info, instrument};

/// What an action tells the chain after running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    /// Evaluate the next entry.
    Continue,
    /// Stop evaluating the chain for this update.
    Consumed,
}

/// A single chain action. Runs only when its entry's filter matched the update.
#[async_trait]
pub trait UpdateAction: Send + Sync {
    async fn run(&self, update: &Update) -> Result<ChainOutcome>;
}

/// Identity of a registered chain entry, used for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(pub u64);

/// Predicate policy over updates. Fixed vocabulary plus a `Custom` escape hatch.
#[derive(Clone)]
pub enum UpdateFilter {
    /// Matches every update.
    Any,
    IsMessage,
    IsCallbackQuery,
    /// Message text equals the given string exactly.
    TextEquals(String),
    /// Message text contains the given substring.
    TextContains(String),
    /// Message text starts with `/name` (an `@botname` suffix on the command is accepted).
    Command(String),
    /// Callback-query data equals the given string.
    CallbackDataEquals(String),
    Custom(Arc<dyn Fn(&Update) -> bool + Send + Sync>),
}

impl UpdateFilter {
    pub fn matches(&self, update: &Update) -> bool {
        match self {
            UpdateFilter::Any => true,
            UpdateFilter::IsMessage => update.is_message(),
            UpdateFilter::IsCallbackQuery => update.is_callback_query(),
            UpdateFilter::TextEquals(text) => update.text() == Some(text.as_str()),
            UpdateFilter::TextContains(part) => {
                update.text().map(|t| t.contains(part.as_str())).unwrap_or(false)
            }
            UpdateFilter::Command(name) => match update.text().and_then(|t| t.split_whitespace().next()) {
                // "/cmd" or "/cmd@botname" both address the command.
                Some(first) => first
                    .strip_prefix('/')
                    .map(|rest| rest.split('@').next() == Some(name.as_str()))
                    .unwrap_or(false),
                None => false,
            },
            UpdateFilter::CallbackDataEquals(data) => {
                update.callback_data() == Some(data.as_str())
            }
            UpdateFilter::Custom(f) => f(update),
        }
    }
}

impl fmt::Debug for UpdateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateFilter::Any => write!(f, "Any"),
            UpdateFilter::IsMessage => write!(f, "IsMessage"),
            UpdateFilter::IsCallbackQuery => write!(f, "IsCallbackQuery"),
            UpdateFilter::TextEquals(t) => write!(f, "TextEquals({:?})", t),
            UpdateFilter::TextContains(t) => write!(f, "TextContains({:?})", t),
            UpdateFilter::Command(c) => write!(f, "Command({:?})", c),
            UpdateFilter::CallbackDataEquals(d) => write!(f, "CallbackDataEquals({:?})", d),
            UpdateFilter::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// One registration: filter, action, and the id it was issued under.
#[derive(Clone)]
pub struct ChainEntry {
    pub id: HandlerId,
    pub filter: UpdateFilter,
    pub action: Arc<dyn UpdateAction>,
}

/// Chain of entries in registration order. Cloning is cheap (entries are Arc'd),
/// which is how routing takes its per-update snapshot.
#[derive(Clone, Default)]
pub struct HandlerChain {
    entries: Vec<ChainEntry>,
}

impl HandlerChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an entry (evaluation keeps registration order).
    pub fn push(&mut self, entry: ChainEntry) {
        self.entries.push(entry);
    }

    /// Removes the entry with the given id. Returns false when no such entry exists.
    pub fn remove(&mut self, id: HandlerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evaluates entries in order against the update: filter match → run action.
    /// `Consumed` stops evaluation; an action error is logged and skipped.
    #[instrument(skip(self, update), fields(update_id = update.id))]
    pub async fn dispatch(&self, update: &Update) -> ChainOutcome {
        for entry in &self.entries {
            if !entry.filter.matches(update) {
                continue;
            }
            let name = std::any::type_name_of_val(entry.action.as_ref());
            debug!(handler = %name, filter = ?entry.filter, "step: action matched");
            match entry.action.run(update).await {
                Ok(ChainOutcome::Consumed) => {
                    info!(
                        update_id = update.id,
                        handler = %name,
                        "step: update consumed, chain stopped"
                    );
                    return ChainOutcome::Consumed;
                }
                Ok(ChainOutcome::Continue) => {}
                Err(e) => {
                    error!(
                        error = %e,
                        update_id = update.id,
                        handler = %name,
                        "Handler action failed; continuing with next entry"
                    );
                }
            }
        }
        ChainOutcome::Continue
    }
}

// Unit/integration tests live in tests/chain_test.rs
