//! Decodes one raw `getUpdates` entry into a typed [`Update`].

use crate::error::Result;
use crate::types::{RawUpdate, Update, UpdateKind};

impl From<RawUpdate> for Update {
    fn from(raw: RawUpdate) -> Self {
        let kind = if let Some(m) = raw.message {
            UpdateKind::Message(m)
        } else if let Some(m) = raw.edited_message {
            UpdateKind::EditedMessage(m)
        } else if let Some(m) = raw.channel_post {
            UpdateKind::ChannelPost(m)
        } else if let Some(q) = raw.callback_query {
            UpdateKind::CallbackQuery(q)
        } else if let Some(q) = raw.inline_query {
            UpdateKind::InlineQuery(q)
        } else if let Some(u) = raw.my_chat_member {
            UpdateKind::MyChatMember(u)
        } else if let Some(u) = raw.chat_member {
            UpdateKind::ChatMember(u)
        } else {
            UpdateKind::Unknown
        };
        Update {
            id: raw.update_id,
            kind,
        }
    }
}

/// Decodes one raw batch entry. Fails only when `update_id` is missing or a
/// present payload field is malformed.
pub fn decode_update(value: &serde_json::Value) -> Result<Update> {
    let raw: RawUpdate = serde_json::from_value(value.clone())?;
    Ok(raw.into())
}
