//! Mock messenger for broadcast testing
//!
//! Simulates Telegram message delivery with configurable delays and scripted
//! failures, and records every call so tests can assert on ordering,
//! concurrency, and progress edits.

#![allow(dead_code)] // Not every accessor is used by every test binary

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use heraldbot::core::AppResult;
use heraldbot::telegram::Messenger;
use teloxide::types::{ChatId, MessageId};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// Configuration for the mock messenger
#[derive(Debug, Clone, Default)]
pub struct MockMessengerConfig {
    /// Delay applied to every send, simulating network latency
    pub send_delay: Duration,
    /// Chat ids whose sends always fail
    pub fail_sends_to: Vec<i64>,
    /// When set, every edit fails
    pub fail_all_edits: bool,
}

impl MockMessengerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-send delay
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = delay;
        self
    }

    /// Make sends to the given chats fail
    pub fn with_failing_chats(mut self, chat_ids: impl IntoIterator<Item = i64>) -> Self {
        self.fail_sends_to = chat_ids.into_iter().collect();
        self
    }

    /// Make every edit fail
    pub fn with_failing_edits(mut self) -> Self {
        self.fail_all_edits = true;
        self
    }
}

/// Mock messenger that records sends and edits instead of hitting Telegram
pub struct MockMessenger {
    config: MockMessengerConfig,
    sends: Mutex<Vec<(i64, String)>>,
    edits: Mutex<Vec<(i64, i32, String)>>,
    next_message_id: AtomicI32,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockMessenger {
    pub fn new(config: MockMessengerConfig) -> Self {
        Self {
            config,
            sends: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
            next_message_id: AtomicI32::new(1),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_default_config() -> Self {
        Self::new(MockMessengerConfig::default())
    }

    /// All recorded sends as (chat id, text), in completion order
    pub async fn sends(&self) -> Vec<(i64, String)> {
        self.sends.lock().await.clone()
    }

    /// All recorded edits as (chat id, message id, text), in call order
    pub async fn edits(&self) -> Vec<(i64, i32, String)> {
        self.edits.lock().await.clone()
    }

    /// Text of the most recent edit, if any
    pub async fn last_edit_text(&self) -> Option<String> {
        self.edits.lock().await.last().map(|(_, _, text)| text.clone())
    }

    /// Highest number of sends that were ever in flight at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_message(&self, chat_id: ChatId, text: &str) -> AppResult<MessageId> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.config.send_delay.is_zero() {
            sleep(self.config.send_delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.sends.lock().await.push((chat_id.0, text.to_string()));

        if self.config.fail_sends_to.contains(&chat_id.0) {
            return Err(format!("scripted send failure for chat {}", chat_id).into());
        }

        Ok(MessageId(self.next_message_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn edit_message_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> AppResult<()> {
        self.edits.lock().await.push((chat_id.0, message_id.0, text.to_string()));

        if self.config.fail_all_edits {
            return Err(format!("scripted edit failure for chat {}", chat_id).into());
        }

        Ok(())
    }
}
