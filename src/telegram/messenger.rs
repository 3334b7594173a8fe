//! Messaging seam between the broadcast engine and the Telegram client.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId};

use crate::core::error::AppResult;

/// The minimal message surface the broadcast engine needs.
///
/// Production code goes through [`TelegramMessenger`]; tests drive the
/// engine with an in-memory double. Anything implementing this trait can
/// back a broadcast, which also keeps the door open for non-Telegram
/// transports.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends `text` to `chat_id` and returns the id of the new message.
    async fn send_message(&self, chat_id: ChatId, text: &str) -> AppResult<MessageId>;

    /// Replaces the text of a previously sent message.
    async fn edit_message_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> AppResult<()>;
}

/// [`Messenger`] backed by the live Bot API.
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        TelegramMessenger { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> AppResult<MessageId> {
        let message = self.bot.send_message(chat_id, text).await?;
        Ok(message.id)
    }

    async fn edit_message_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> AppResult<()> {
        self.bot.edit_message_text(chat_id, message_id, text).await?;
        Ok(())
    }
}
