//! Handler types and shared dependencies

use std::sync::Arc;

use teloxide::types::Message;

use crate::broadcast::BroadcastManager;
use crate::storage::Roster;
use crate::telegram::messenger::TelegramMessenger;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub roster: Arc<dyn Roster>,
    pub manager: Arc<BroadcastManager>,
    pub messenger: Arc<TelegramMessenger>,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(roster: Arc<dyn Roster>, manager: Arc<BroadcastManager>, messenger: Arc<TelegramMessenger>) -> Self {
        Self {
            roster,
            manager,
            messenger,
        }
    }
}

/// Subscriber info for admin notifications
#[derive(Clone)]
pub struct SubscriberInfo {
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl SubscriberInfo {
    /// Extract subscriber info from a Telegram message
    pub fn from_message(msg: &Message) -> Self {
        Self {
            chat_id: msg.chat.id.0,
            username: msg.from.as_ref().and_then(|u| u.username.clone()),
            first_name: msg.from.as_ref().map(|u| u.first_name.clone()),
        }
    }

    /// Renders the subscriber for admin-facing notices, preferring the
    /// username over the bare chat id.
    pub fn describe(&self) -> String {
        match (&self.username, &self.first_name) {
            (Some(username), _) => format!("{} (@{})", self.chat_id, username),
            (None, Some(first_name)) => format!("{} ({})", self.chat_id, first_name),
            (None, None) => self.chat_id.to_string(),
        }
    }
}
