//! Core update model: typed updates, the wire shapes they decode from, and the
//! chat identity used to route them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identity as sent by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// Chat (private, group, supergroup or channel) identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub chat_type: String,
    pub title: Option<String>,
    pub username: Option<String>,
}

/// A single message in a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub date: DateTime<Utc>,
    pub chat: Chat,
    pub text: Option<String>,
}

/// A button press on an inline keyboard. `message` is the message the keyboard
/// was attached to, when the platform still has it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// An inline query typed after the bot's username. Carries no chat identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    pub from: User,
    pub query: String,
    pub offset: String,
}

/// A member's standing in a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMember {
    pub status: String,
    pub user: User,
}

/// A change in a member's standing (join, leave, promotion, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMemberUpdated {
    pub chat: Chat,
    pub from: User,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub date: DateTime<Utc>,
    pub old_chat_member: ChatMember,
    pub new_chat_member: ChatMember,
}

/// Discriminated update payload. `Unknown` covers kinds this gateway does not
/// model yet; they still flow through the global queue.
#[derive(Debug, Clone)]
pub enum UpdateKind {
    Message(Message),
    EditedMessage(Message),
    ChannelPost(Message),
    CallbackQuery(CallbackQuery),
    InlineQuery(InlineQuery),
    MyChatMember(ChatMemberUpdated),
    ChatMember(ChatMemberUpdated),
    Unknown,
}

/// One inbound event with its platform-wide unique, monotonically increasing id.
/// Immutable once decoded; owned briefly by a routing task, then dropped.
#[derive(Debug, Clone)]
pub struct Update {
    pub id: i64,
    pub kind: UpdateKind,
}

impl Update {
    /// Chat the update belongs to, if it has one (inline queries do not).
    pub fn chat_id(&self) -> Option<i64> {
        match &self.kind {
            UpdateKind::Message(m) | UpdateKind::EditedMessage(m) | UpdateKind::ChannelPost(m) => {
                Some(m.chat.id)
            }
            UpdateKind::CallbackQuery(q) => q.message.as_ref().map(|m| m.chat.id),
            UpdateKind::MyChatMember(u) | UpdateKind::ChatMember(u) => Some(u.chat.id),
            UpdateKind::InlineQuery(_) | UpdateKind::Unknown => None,
        }
    }

    /// Message text, for message-bearing kinds.
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            UpdateKind::Message(m) | UpdateKind::EditedMessage(m) | UpdateKind::ChannelPost(m) => {
                m.text.as_deref()
            }
            _ => None,
        }
    }

    /// Callback payload, for callback-query updates.
    pub fn callback_data(&self) -> Option<&str> {
        match &self.kind {
            UpdateKind::CallbackQuery(q) => q.data.as_deref(),
            _ => None,
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self.kind, UpdateKind::Message(_))
    }

    pub fn is_callback_query(&self) -> bool {
        matches!(self.kind, UpdateKind::CallbackQuery(_))
    }
}

// --- Wire shapes ---

/// One raw `getUpdates` entry: `update_id` plus exactly one payload field.
#[derive(Debug, Clone, Deserialize)]
pub struct RawUpdate {
    pub update_id: i64,
    pub message: Option<Message>,
    pub edited_message: Option<Message>,
    pub channel_post: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
    pub inline_query: Option<InlineQuery>,
    pub my_chat_member: Option<ChatMemberUpdated>,
    pub chat_member: Option<ChatMemberUpdated>,
}

/// The platform's `{ok, result, error_code, description}` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub error_code: Option<i64>,
    pub description: Option<String>,
}

/// Arguments for the `getUpdates` fetch.
#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesArgs {
    pub offset: i64,
    pub limit: u32,
    pub timeout: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<String>>,
}

/// Arguments for the `sendMessage` call.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageArgs {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
}
