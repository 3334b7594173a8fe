//! Shared state of a single broadcast job.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use teloxide::types::{ChatId, MessageId};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::error::AppError;

/// Identifier of a broadcast job.
///
/// Millisecond wall-clock timestamp at submission, bumped past the
/// previously issued id when two jobs start within the same millisecond.
/// Strictly increasing per manager, which makes ids sort by submission
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    pub(crate) fn new(raw: u64) -> Self {
        JobId(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(JobId)
            .map_err(|_| AppError::Broadcast(format!("invalid job id: {s}")))
    }
}

/// Coarse lifecycle of a job as seen from the outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastJobState {
    /// Registered but never fanned out: the initial status send failed.
    Inert,
    /// Fan-out task attached and not yet done.
    Running,
    /// Every recipient was processed.
    Completed,
    /// Stopped before every recipient was processed.
    Cancelled,
}

impl fmt::Display for BroadcastJobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BroadcastJobState::Inert => "inert",
            BroadcastJobState::Running => "running",
            BroadcastJobState::Completed => "completed",
            BroadcastJobState::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// State shared by everyone involved in one broadcast.
///
/// The job is the synchronization point between three parties: the fan-out
/// task (sole writer of the counters), the progress updater (reader), and
/// admin commands (cancellation, listing). All of them hold it behind an
/// `Arc`.
pub struct BroadcastJob {
    pub job_id: JobId,
    /// Chat that issued the broadcast and hosts the status message.
    pub admin_chat_id: ChatId,
    /// Recipients, fixed at submission.
    pub user_ids: Vec<ChatId>,
    /// Text delivered to every recipient.
    pub text: String,
    sent: AtomicU32,
    failed: AtomicU32,
    status_message: OnceLock<MessageId>,
    cancel_token: CancellationToken,
    done: watch::Sender<bool>,
    task: OnceLock<JoinHandle<()>>,
}

impl BroadcastJob {
    pub fn new(job_id: JobId, admin_chat_id: ChatId, user_ids: Vec<ChatId>, text: String) -> Self {
        let (done, _) = watch::channel(false);
        BroadcastJob {
            job_id,
            admin_chat_id,
            user_ids,
            text,
            sent: AtomicU32::new(0),
            failed: AtomicU32::new(0),
            status_message: OnceLock::new(),
            cancel_token: CancellationToken::new(),
            done,
            task: OnceLock::new(),
        }
    }

    /// Number of recipients this job was submitted with.
    pub fn total(&self) -> usize {
        self.user_ids.len()
    }

    pub fn sent(&self) -> u32 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u32 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Recipients handled so far, delivered and failed together. Each
    /// recipient bumps exactly one of the two counters exactly once, so
    /// this never exceeds [`total`](Self::total).
    pub fn processed(&self) -> u32 {
        self.sent() + self.failed()
    }

    /// Integer percentage of recipients processed, floored.
    pub fn percent_complete(&self) -> u8 {
        let total = self.total() as u64;
        let processed = u64::from(self.processed());
        ((processed * 100) / total.max(1)) as u8
    }

    pub(crate) fn record_sent(&self) {
        self.sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Remembers the status message hosting progress edits. First call
    /// wins; later calls are ignored.
    pub fn set_status_message(&self, message_id: MessageId) {
        let _ = self.status_message.set(message_id);
    }

    pub fn status_message(&self) -> Option<MessageId> {
        self.status_message.get().copied()
    }

    pub(crate) fn attach_task(&self, handle: JoinHandle<()>) {
        let _ = self.task.set(handle);
    }

    fn has_task(&self) -> bool {
        self.task.get().is_some()
    }

    /// Requests cooperative cancellation. Safe at any point in the job's
    /// lifecycle, including before a task is attached, repeatedly, and
    /// after completion.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Resolves once cancellation has been requested.
    pub(crate) async fn cancelled(&self) {
        self.cancel_token.cancelled().await;
    }

    pub(crate) fn mark_done(&self) {
        self.done.send_replace(true);
    }

    /// True once the fan-out task finished its cleanup, final status edit
    /// included.
    pub fn is_finished(&self) -> bool {
        *self.done.borrow()
    }

    /// Waits until the job has fully finished, including the final status
    /// edit. Never resolves for an inert job.
    pub async fn wait(&self) {
        let mut done = self.done.subscribe();
        // Sender lives in self, so the channel cannot close under us.
        let _ = done.wait_for(|finished| *finished).await;
    }

    pub fn state(&self) -> BroadcastJobState {
        if self.is_finished() {
            if self.processed() as usize == self.total() {
                BroadcastJobState::Completed
            } else {
                BroadcastJobState::Cancelled
            }
        } else if self.has_task() {
            BroadcastJobState::Running
        } else {
            BroadcastJobState::Inert
        }
    }
}
