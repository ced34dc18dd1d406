//! # botgate-core
//!
//! Core types for the bot gateway: the typed [`Update`] model, the raw wire shapes it is
//! decoded from, the [`BotError`] taxonomy, and tracing initialization. Transport-agnostic;
//! used by update-chain and botgate-telegram.

pub mod decode;
pub mod error;
pub mod logger;
pub mod types;

pub use decode::decode_update;
pub use error::{BotError, Result};
pub use logger::init_tracing;
pub use types::{
    ApiEnvelope, CallbackQuery, Chat, ChatMember, ChatMemberUpdated, GetUpdatesArgs, InlineQuery,
    Message, RawUpdate, SendMessageArgs, Update, UpdateKind, User,
};
