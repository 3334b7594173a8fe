//! Broadcast roster storage
//!
//! The roster is the set of chats that receive broadcasts. Handlers only see
//! the [`Roster`] trait; the file-backed implementation is what production
//! uses, the in-memory one is for tests.

use std::collections::BTreeSet;
use std::path::PathBuf;

use async_trait::async_trait;
use teloxide::types::ChatId;
use tokio::sync::Mutex;

use crate::core::AppResult;

/// Set of chats subscribed to broadcasts
#[async_trait]
pub trait Roster: Send + Sync {
    /// Adds a chat to the roster. Returns `true` if it was newly added.
    async fn add(&self, chat_id: ChatId) -> AppResult<bool>;

    /// Removes a chat from the roster. Returns `true` if it was present.
    async fn remove(&self, chat_id: ChatId) -> AppResult<bool>;

    /// All subscribed chats in ascending id order.
    async fn chat_ids(&self) -> AppResult<Vec<ChatId>>;

    /// Number of subscribed chats.
    async fn count(&self) -> AppResult<usize>;
}

fn parse_roster(contents: &str) -> BTreeSet<i64> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.parse::<i64>().ok())
        .collect()
}

fn render_roster(entries: &BTreeSet<i64>) -> String {
    let mut out = String::new();
    for id in entries {
        out.push_str(&id.to_string());
        out.push('\n');
    }
    out
}

/// Roster kept only in memory, mainly for tests
#[derive(Default)]
pub struct InMemoryRoster {
    entries: Mutex<BTreeSet<i64>>,
}

impl InMemoryRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a roster pre-populated with the given chat ids
    pub fn with_chat_ids(chat_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            entries: Mutex::new(chat_ids.into_iter().collect()),
        }
    }
}

#[async_trait]
impl Roster for InMemoryRoster {
    async fn add(&self, chat_id: ChatId) -> AppResult<bool> {
        Ok(self.entries.lock().await.insert(chat_id.0))
    }

    async fn remove(&self, chat_id: ChatId) -> AppResult<bool> {
        Ok(self.entries.lock().await.remove(&chat_id.0))
    }

    async fn chat_ids(&self) -> AppResult<Vec<ChatId>> {
        Ok(self.entries.lock().await.iter().map(|id| ChatId(*id)).collect())
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.entries.lock().await.len())
    }
}

/// Roster persisted to a plain text file, one chat id per line
///
/// Every mutation rewrites the whole file through a temp-file rename, so a
/// crash mid-write never leaves a torn roster behind.
pub struct FileRoster {
    path: PathBuf,
    entries: Mutex<BTreeSet<i64>>,
}

impl FileRoster {
    /// Loads the roster from `path`, starting empty when the file is missing.
    pub async fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let entries = match fs_err::tokio::read_to_string(&path).await {
            Ok(contents) => parse_roster(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(e.into()),
        };

        log::info!("Loaded roster from {:?}: {} subscriber(s)", path, entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    async fn persist(&self, entries: &BTreeSet<i64>) -> AppResult<()> {
        let tmp_path = self.path.with_extension("tmp");
        fs_err::tokio::write(&tmp_path, render_roster(entries)).await?;
        fs_err::tokio::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl Roster for FileRoster {
    async fn add(&self, chat_id: ChatId) -> AppResult<bool> {
        let mut entries = self.entries.lock().await;
        if !entries.insert(chat_id.0) {
            return Ok(false);
        }
        self.persist(&entries).await?;
        Ok(true)
    }

    async fn remove(&self, chat_id: ChatId) -> AppResult<bool> {
        let mut entries = self.entries.lock().await;
        if !entries.remove(&chat_id.0) {
            return Ok(false);
        }
        self.persist(&entries).await?;
        Ok(true)
    }

    async fn chat_ids(&self) -> AppResult<Vec<ChatId>> {
        Ok(self.entries.lock().await.iter().map(|id| ChatId(*id)).collect())
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.entries.lock().await.len())
    }
}
