//! Broadcast orchestration: job registry, fan-out runner and progress
//! reporting.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use teloxide::types::ChatId;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::broadcast::job::{BroadcastJob, JobId};
use crate::broadcast::status::BroadcastStatus;
use crate::core::error::{AppError, AppResult};
use crate::core::{config, metrics};
use crate::telegram::messenger::Messenger;

/// Tuning knobs for the fan-out behavior of one manager.
#[derive(Debug, Clone)]
pub struct BroadcastConfig {
    /// Ceiling on concurrent deliveries per job.
    pub max_in_flight: usize,
    /// Pause after each delivery, held inside the concurrency slot.
    pub pacing_delay: Duration,
    /// Cadence of progress-message edits.
    pub progress_interval: Duration,
    /// Deadline per delivery; `None` waits indefinitely.
    pub send_timeout: Option<Duration>,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        BroadcastConfig {
            max_in_flight: config::broadcast::MAX_IN_FLIGHT,
            pacing_delay: config::broadcast::pacing_delay(),
            progress_interval: config::broadcast::progress_edit_interval(),
            send_timeout: Some(config::broadcast::send_timeout()),
        }
    }
}

impl BroadcastConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tightened intervals that exercise pacing and progress edits
    /// quickly. Meant for tests and local runs against mock transports.
    pub fn fast() -> Self {
        BroadcastConfig {
            max_in_flight: config::broadcast::MAX_IN_FLIGHT,
            pacing_delay: Duration::from_millis(2),
            progress_interval: Duration::from_millis(15),
            send_timeout: Some(Duration::from_secs(2)),
        }
    }

    #[must_use]
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    #[must_use]
    pub fn with_pacing_delay(mut self, pacing_delay: Duration) -> Self {
        self.pacing_delay = pacing_delay;
        self
    }

    #[must_use]
    pub fn with_progress_interval(mut self, progress_interval: Duration) -> Self {
        self.progress_interval = progress_interval;
        self
    }

    #[must_use]
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = Some(send_timeout);
        self
    }

    #[must_use]
    pub fn without_send_timeout(mut self) -> Self {
        self.send_timeout = None;
        self
    }
}

/// Registry and runner of broadcast jobs.
///
/// Create one per process and share it behind an `Arc`. Jobs are appended
/// on submission and stay queryable after they finish, until they are
/// dropped explicitly ([`remove_job`](Self::remove_job)) or swept by
/// [`purge_finished`](Self::purge_finished).
pub struct BroadcastManager {
    jobs: Mutex<BTreeMap<JobId, Arc<BroadcastJob>>>,
    last_job_id: AtomicU64,
    config: BroadcastConfig,
}

impl Default for BroadcastManager {
    fn default() -> Self {
        Self::new(BroadcastConfig::default())
    }
}

impl BroadcastManager {
    pub fn new(config: BroadcastConfig) -> Self {
        BroadcastManager {
            jobs: Mutex::new(BTreeMap::new()),
            last_job_id: AtomicU64::new(0),
            config,
        }
    }

    /// Issues the next job id: wall clock in milliseconds, bumped past the
    /// previously issued id when submissions land within the same
    /// millisecond.
    fn next_job_id(&self) -> JobId {
        let now_ms = Utc::now().timestamp_millis().max(0) as u64;
        let mut last = self.last_job_id.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(last + 1);
            match self.last_job_id.compare_exchange_weak(
                last,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return JobId::new(candidate),
                Err(observed) => last = observed,
            }
        }
    }

    /// Submits a broadcast and returns its id as soon as the job is
    /// registered and the status message exists in the admin chat.
    ///
    /// The only failure that surfaces here is the initial status-message
    /// send; the job then stays in the registry without a fan-out task,
    /// visible to `/broadcasts` as inert. Delivery failures to individual
    /// recipients never surface, they are tallied in the job's `failed`
    /// counter instead.
    pub async fn start_broadcast<M>(
        &self,
        messenger: Arc<M>,
        admin_chat_id: ChatId,
        user_ids: Vec<ChatId>,
        text: String,
    ) -> AppResult<JobId>
    where
        M: Messenger + 'static,
    {
        let job_id = self.next_job_id();
        let job = Arc::new(BroadcastJob::new(job_id, admin_chat_id, user_ids, text));
        self.jobs.lock().await.insert(job_id, Arc::clone(&job));

        let banner = BroadcastStatus::Starting { total: job.total() }.to_message();
        let status_message = messenger.send_message(admin_chat_id, &banner).await?;
        job.set_status_message(status_message);

        metrics::BROADCASTS_STARTED_TOTAL.inc();
        metrics::BROADCAST_JOBS_ACTIVE.inc();
        metrics::BROADCAST_RECIPIENTS.observe(job.total() as f64);
        log::info!("🚀 Broadcast {} started: {} recipient(s)", job_id, job.total());

        let handle = tokio::spawn(run_broadcast(messenger, Arc::clone(&job), self.config.clone()));
        job.attach_task(handle);

        Ok(job_id)
    }

    pub async fn get(&self, job_id: JobId) -> Option<Arc<BroadcastJob>> {
        self.jobs.lock().await.get(&job_id).cloned()
    }

    /// Requests cancellation of a job. Returns false when the id is
    /// unknown. Cancelling a finished job is a harmless no-op.
    pub async fn cancel(&self, job_id: JobId) -> bool {
        match self.get(job_id).await {
            Some(job) => {
                job.cancel();
                true
            }
            None => false,
        }
    }

    /// Snapshot of every registered job, oldest first.
    pub async fn jobs(&self) -> Vec<Arc<BroadcastJob>> {
        self.jobs.lock().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.jobs.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.lock().await.is_empty()
    }

    /// Drops a job from the registry. Does not stop a running job; the
    /// fan-out task keeps its own handle on the shared state.
    pub async fn remove_job(&self, job_id: JobId) -> Option<Arc<BroadcastJob>> {
        self.jobs.lock().await.remove(&job_id)
    }

    /// Sweeps finished jobs out of the registry, returning how many were
    /// removed. Running and inert jobs are kept.
    pub async fn purge_finished(&self) -> usize {
        let mut jobs = self.jobs.lock().await;
        let before = jobs.len();
        jobs.retain(|_, job| !job.is_finished());
        before - jobs.len()
    }
}

/// Drives one job to completion: spawns the progress updater, fans out
/// deliveries under the concurrency ceiling, then cleans up no matter
/// whether the fan-out ran dry or the job was cancelled.
async fn run_broadcast<M>(messenger: Arc<M>, job: Arc<BroadcastJob>, config: BroadcastConfig)
where
    M: Messenger + 'static,
{
    let started = Instant::now();

    let updater = tokio::spawn(progress_loop(
        Arc::clone(&messenger),
        Arc::clone(&job),
        config.progress_interval,
    ));

    let pacing_delay = config.pacing_delay;
    let send_timeout = config.send_timeout;
    let fan_out = stream::iter(job.user_ids.clone()).for_each_concurrent(config.max_in_flight, |recipient| {
        let messenger = Arc::clone(&messenger);
        let job = Arc::clone(&job);
        async move {
            deliver_one(messenger.as_ref(), job.as_ref(), recipient, send_timeout).await;
            sleep(pacing_delay).await;
        }
    });

    let was_cancelled = tokio::select! {
        () = fan_out => false,
        () = job.cancelled() => {
            log::info!("Broadcast job {} cancelled", job.job_id);
            true
        }
    };

    // The updater has no cleanup of its own; dropping it mid-sleep is fine.
    updater.abort();
    let _ = updater.await;

    if let Some(message_id) = job.status_message() {
        let banner = BroadcastStatus::Finished {
            sent: job.sent(),
            failed: job.failed(),
        }
        .to_message();
        if let Err(error) = messenger.edit_message_text(job.admin_chat_id, message_id, &banner).await {
            log::debug!("Broadcast job {}: final status edit failed: {}", job.job_id, error);
        }
    }

    let outcome = if was_cancelled { "cancelled" } else { "completed" };
    metrics::record_broadcast_finished(outcome, started.elapsed().as_secs_f64());
    metrics::BROADCAST_JOBS_ACTIVE.dec();
    log::info!(
        "📤 Broadcast job {} {}: {} sent, {} failed of {}",
        job.job_id,
        outcome,
        job.sent(),
        job.failed(),
        job.total()
    );

    job.mark_done();
}

/// Delivers one recipient's copy and records the outcome on the job.
/// Never returns an error; a failed delivery only moves a counter.
async fn deliver_one<M>(messenger: &M, job: &BroadcastJob, recipient: ChatId, send_timeout: Option<Duration>)
where
    M: Messenger,
{
    let outcome = match send_timeout {
        Some(deadline) => match tokio::time::timeout(deadline, messenger.send_message(recipient, &job.text)).await {
            Ok(result) => result.map(|_| ()),
            Err(_) => Err(AppError::SendTimeout(deadline)),
        },
        None => messenger.send_message(recipient, &job.text).await.map(|_| ()),
    };

    match outcome {
        Ok(()) => {
            job.record_sent();
            metrics::record_send_outcome("sent");
        }
        Err(error) => {
            job.record_failed();
            metrics::record_send_outcome("failed");
            log::debug!("Broadcast job {}: delivery to {} failed: {}", job.job_id, recipient, error);
        }
    }
}

/// Edits the status message on a fixed cadence until every recipient is
/// processed. Edit failures are logged and swallowed; the loop never
/// touches the counters.
async fn progress_loop<M>(messenger: Arc<M>, job: Arc<BroadcastJob>, interval: Duration)
where
    M: Messenger,
{
    while (job.processed() as usize) < job.total() {
        if let Some(message_id) = job.status_message() {
            let text = BroadcastStatus::Sending {
                percent: job.percent_complete(),
                sent: job.sent(),
                failed: job.failed(),
            }
            .to_message();
            if let Err(error) = messenger.edit_message_text(job.admin_chat_id, message_id, &text).await {
                log::debug!("Broadcast job {}: progress edit failed: {}", job.job_id, error);
            }
        }
        sleep(interval).await;
    }
}
