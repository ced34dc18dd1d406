//! Shared test fixtures: typed update builders, raw wire payloads, and a
//! scripted [`Transport`] that replays prepared batches and records the
//! offsets it was asked for.

// Each test binary compiles this module and uses a different subset of it.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use botgate_core::{
    BotError, CallbackQuery, Chat, GetUpdatesArgs, Message, Result, Update, UpdateKind, User,
};
use botgate_telegram::Transport;
use chrono::Utc;
use serde_json::json;

pub fn test_chat(chat_id: i64) -> Chat {
    Chat {
        id: chat_id,
        chat_type: "private".to_string(),
        title: None,
        username: None,
    }
}

pub fn test_user(user_id: i64) -> User {
    User {
        id: user_id,
        is_bot: false,
        first_name: "Test".to_string(),
        last_name: None,
        username: Some("test_user".to_string()),
    }
}

pub fn message_update(id: i64, chat_id: i64, text: &str) -> Update {
    Update {
        id,
        kind: UpdateKind::Message(Message {
            message_id: id * 10,
            from: Some(test_user(9)),
            date: Utc::now(),
            chat: test_chat(chat_id),
            text: Some(text.to_string()),
        }),
    }
}

pub fn callback_update(id: i64, chat_id: i64, data: &str) -> Update {
    Update {
        id,
        kind: UpdateKind::CallbackQuery(CallbackQuery {
            id: format!("cbq{}", id),
            from: test_user(9),
            message: Some(Message {
                message_id: id * 10,
                from: None,
                date: Utc::now(),
                chat: test_chat(chat_id),
                text: None,
            }),
            data: Some(data.to_string()),
        }),
    }
}

/// Raw `getUpdates` entry as the platform would send it.
pub fn raw_message(id: i64, chat_id: i64, text: &str) -> serde_json::Value {
    json!({
        "update_id": id,
        "message": {
            "message_id": id * 10,
            "date": 1700000000,
            "chat": {"id": chat_id, "type": "private"},
            "text": text,
            "from": {"id": 9, "is_bot": false, "first_name": "Test"}
        }
    })
}

/// Scripted transport: pops one prepared batch per fetch (empty once the
/// script runs out) and records every requested offset.
pub struct MockTransport {
    batches: Mutex<VecDeque<Result<Vec<serde_json::Value>>>>,
    offsets: Mutex<Vec<i64>>,
}

impl MockTransport {
    pub fn new(batches: Vec<Result<Vec<serde_json::Value>>>) -> Self {
        Self {
            batches: Mutex::new(batches.into_iter().collect()),
            offsets: Mutex::new(Vec::new()),
        }
    }

    pub fn offsets(&self) -> Vec<i64> {
        self.offsets.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.offsets.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch_updates(&self, args: &GetUpdatesArgs) -> Result<Vec<serde_json::Value>> {
        self.offsets.lock().unwrap().push(args.offset);
        match self.batches.lock().unwrap().pop_front() {
            Some(batch) => batch,
            None => Ok(Vec::new()),
        }
    }

    async fn call_method(
        &self,
        method: &str,
        _args: serde_json::Value,
    ) -> Result<serde_json::Value> {
        Err(BotError::Transport(format!("method {} not scripted", method)))
    }
}
