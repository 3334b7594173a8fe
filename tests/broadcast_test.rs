//! Integration tests for the broadcast engine
//!
//! These tests drive the real `BroadcastManager` against a scripted mock
//! messenger, so fan-out, pacing, progress edits, and cancellation are
//! exercised without any network traffic.
//! Run with: cargo test --test broadcast_test

mod mocks;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use heraldbot::broadcast::{BroadcastConfig, BroadcastJobState, BroadcastManager, JobId};
use mocks::{MockMessenger, MockMessengerConfig};
use pretty_assertions::assert_eq;
use teloxide::types::ChatId;
use tokio::time::{sleep, timeout};

const ADMIN_CHAT: ChatId = ChatId(1);
const WAIT_LIMIT: Duration = Duration::from_secs(5);

fn recipients(n: i64) -> Vec<ChatId> {
    (0..n).map(|i| ChatId(100 + i)).collect()
}

// ============================================================================
// PART 1: Fan-out and partial-failure accounting
// ============================================================================

#[tokio::test]
async fn test_broadcast_delivers_to_every_recipient() {
    let manager = BroadcastManager::new(BroadcastConfig::fast());
    let messenger = Arc::new(MockMessenger::with_default_config());

    let job_id = manager
        .start_broadcast(Arc::clone(&messenger), ADMIN_CHAT, recipients(3), "hello all".to_string())
        .await
        .unwrap();

    let job = manager.get(job_id).await.unwrap();
    timeout(WAIT_LIMIT, job.wait()).await.unwrap();

    assert_eq!(job.sent(), 3);
    assert_eq!(job.failed(), 0);
    assert_eq!(job.state(), BroadcastJobState::Completed);

    let sends = messenger.sends().await;
    assert_eq!(sends.len(), 4, "status banner plus one send per recipient");
    assert_eq!(sends[0].0, ADMIN_CHAT.0);
    assert_eq!(sends[0].1, "🚀 Starting broadcast for 3 recipients... 0%");

    let mut delivered: Vec<i64> = sends[1..].iter().map(|(chat, _)| *chat).collect();
    delivered.sort_unstable();
    assert_eq!(delivered, vec![100, 101, 102]);
    assert!(sends[1..].iter().all(|(_, text)| text == "hello all"));

    assert_eq!(
        messenger.last_edit_text().await.as_deref(),
        Some("✅ Broadcast finished | sent: 3 | failed: 0")
    );
}

#[tokio::test]
async fn test_failed_recipient_only_moves_a_counter() {
    let manager = BroadcastManager::new(BroadcastConfig::fast());
    let messenger = Arc::new(MockMessenger::new(
        MockMessengerConfig::new().with_failing_chats([101]),
    ));

    let job_id = manager
        .start_broadcast(Arc::clone(&messenger), ADMIN_CHAT, recipients(3), "partial".to_string())
        .await
        .expect("delivery failures must not surface from start_broadcast");

    let job = manager.get(job_id).await.unwrap();
    timeout(WAIT_LIMIT, job.wait()).await.unwrap();

    assert_eq!(job.sent(), 2);
    assert_eq!(job.failed(), 1);
    assert_eq!(job.processed(), 3);
    assert_eq!(job.state(), BroadcastJobState::Completed);
    assert_eq!(
        messenger.last_edit_text().await.as_deref(),
        Some("✅ Broadcast finished | sent: 2 | failed: 1")
    );
}

#[tokio::test]
async fn test_concurrency_stays_under_the_ceiling() {
    let config = BroadcastConfig::fast()
        .with_pacing_delay(Duration::from_millis(2))
        .with_progress_interval(Duration::from_millis(15));
    let manager = BroadcastManager::new(config);
    let messenger = Arc::new(MockMessenger::new(
        MockMessengerConfig::new().with_send_delay(Duration::from_millis(10)),
    ));

    let job_id = manager
        .start_broadcast(Arc::clone(&messenger), ADMIN_CHAT, recipients(20), "load".to_string())
        .await
        .unwrap();

    let job = manager.get(job_id).await.unwrap();
    timeout(WAIT_LIMIT, job.wait()).await.unwrap();

    assert_eq!(job.sent(), 20);
    let max_in_flight = messenger.max_in_flight();
    assert!(max_in_flight <= 8, "ceiling breached: {} sends in flight", max_in_flight);
    assert!(max_in_flight >= 2, "sends never overlapped, got {}", max_in_flight);
}

#[tokio::test]
async fn test_counters_never_overshoot_the_total() {
    let manager = BroadcastManager::new(BroadcastConfig::fast());
    let messenger = Arc::new(MockMessenger::new(
        MockMessengerConfig::new()
            .with_send_delay(Duration::from_millis(5))
            .with_failing_chats([103, 107]),
    ));

    let job_id = manager
        .start_broadcast(Arc::clone(&messenger), ADMIN_CHAT, recipients(20), "invariant".to_string())
        .await
        .unwrap();
    let job = manager.get(job_id).await.unwrap();

    while !job.is_finished() {
        assert!((job.processed() as usize) <= job.total());
        sleep(Duration::from_millis(1)).await;
    }

    assert_eq!(job.processed(), 20);
    assert_eq!(job.sent(), 18);
    assert_eq!(job.failed(), 2);
}

// ============================================================================
// PART 2: Progress reporting
// ============================================================================

#[tokio::test]
async fn test_progress_edits_land_while_sending() {
    let config = BroadcastConfig::fast()
        .with_pacing_delay(Duration::from_millis(2))
        .with_progress_interval(Duration::from_millis(15));
    let manager = BroadcastManager::new(config);
    let messenger = Arc::new(MockMessenger::new(
        MockMessengerConfig::new().with_send_delay(Duration::from_millis(10)),
    ));

    let job_id = manager
        .start_broadcast(Arc::clone(&messenger), ADMIN_CHAT, recipients(20), "progress".to_string())
        .await
        .unwrap();

    let job = manager.get(job_id).await.unwrap();
    timeout(WAIT_LIMIT, job.wait()).await.unwrap();

    let edits = messenger.edits().await;
    assert!(edits.len() >= 2, "expected progress edits plus the final one, got {}", edits.len());
    assert!(edits.iter().all(|(chat, _, _)| *chat == ADMIN_CHAT.0));
    assert!(edits[0].2.starts_with("📤 Sending..."));
    assert_eq!(edits.last().unwrap().2, "✅ Broadcast finished | sent: 20 | failed: 0");
}

#[tokio::test]
async fn test_empty_roster_finishes_with_only_the_final_edit() {
    let manager = BroadcastManager::new(BroadcastConfig::fast());
    let messenger = Arc::new(MockMessenger::with_default_config());

    let job_id = manager
        .start_broadcast(Arc::clone(&messenger), ADMIN_CHAT, Vec::new(), "nobody".to_string())
        .await
        .unwrap();

    let job = manager.get(job_id).await.unwrap();
    timeout(WAIT_LIMIT, job.wait()).await.unwrap();

    assert_eq!(job.state(), BroadcastJobState::Completed);
    assert_eq!(messenger.sends().await.len(), 1, "only the status banner goes out");

    let edits = messenger.edits().await;
    assert_eq!(edits.len(), 1, "no progress cadence for an empty job");
    assert_eq!(edits[0].2, "✅ Broadcast finished | sent: 0 | failed: 0");
}

#[tokio::test]
async fn test_edit_failures_never_disturb_delivery() {
    let manager = BroadcastManager::new(BroadcastConfig::fast());
    let messenger = Arc::new(MockMessenger::new(MockMessengerConfig::new().with_failing_edits()));

    let job_id = manager
        .start_broadcast(Arc::clone(&messenger), ADMIN_CHAT, recipients(5), "quiet".to_string())
        .await
        .unwrap();

    let job = manager.get(job_id).await.unwrap();
    timeout(WAIT_LIMIT, job.wait()).await.unwrap();

    assert_eq!(job.sent(), 5);
    assert_eq!(job.failed(), 0);
    assert_eq!(job.state(), BroadcastJobState::Completed);
}

// ============================================================================
// PART 3: Cancellation and timeouts
// ============================================================================

#[tokio::test]
async fn test_cancel_stops_a_hanging_broadcast() {
    let config = BroadcastConfig::fast().without_send_timeout();
    let manager = BroadcastManager::new(config);
    let messenger = Arc::new(MockMessenger::new(
        MockMessengerConfig::new().with_send_delay(Duration::from_millis(150)),
    ));

    let job_id = manager
        .start_broadcast(Arc::clone(&messenger), ADMIN_CHAT, recipients(5), "stuck".to_string())
        .await
        .unwrap();
    let job = manager.get(job_id).await.unwrap();

    sleep(Duration::from_millis(30)).await;
    assert!(manager.cancel(job_id).await);

    timeout(Duration::from_secs(2), job.wait())
        .await
        .expect("cancellation must release waiters promptly");

    assert_eq!(job.state(), BroadcastJobState::Cancelled);
    assert_eq!(job.sent(), 0);
    assert_eq!(job.failed(), 0);
    assert_eq!(messenger.sends().await.len(), 1, "in-flight sends were abandoned");
    assert_eq!(
        messenger.last_edit_text().await.as_deref(),
        Some("✅ Broadcast finished | sent: 0 | failed: 0")
    );
}

#[tokio::test]
async fn test_cancelling_an_unknown_job_returns_false() {
    let manager = BroadcastManager::new(BroadcastConfig::fast());
    assert!(!manager.cancel(JobId::from_str("12345").unwrap()).await);
}

#[tokio::test]
async fn test_slow_sends_hit_the_per_send_deadline() {
    let config = BroadcastConfig::fast().with_send_timeout(Duration::from_millis(50));
    let manager = BroadcastManager::new(config);
    let messenger = Arc::new(MockMessenger::new(
        MockMessengerConfig::new().with_send_delay(Duration::from_millis(200)),
    ));

    let job_id = manager
        .start_broadcast(Arc::clone(&messenger), ADMIN_CHAT, recipients(2), "slow".to_string())
        .await
        .unwrap();

    let job = manager.get(job_id).await.unwrap();
    timeout(WAIT_LIMIT, job.wait()).await.unwrap();

    assert_eq!(job.sent(), 0);
    assert_eq!(job.failed(), 2);
    assert_eq!(job.state(), BroadcastJobState::Completed);
}

// ============================================================================
// PART 4: Job registry
// ============================================================================

#[tokio::test]
async fn test_registry_keeps_jobs_in_submission_order() {
    let manager = BroadcastManager::new(BroadcastConfig::fast());
    let messenger = Arc::new(MockMessenger::with_default_config());

    let mut ids = Vec::new();
    for text in ["one", "two", "three"] {
        let id = manager
            .start_broadcast(Arc::clone(&messenger), ADMIN_CHAT, Vec::new(), text.to_string())
            .await
            .unwrap();
        ids.push(id);
    }

    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(manager.len().await, 3);

    let listed: Vec<JobId> = manager.jobs().await.iter().map(|job| job.job_id).collect();
    assert_eq!(listed, ids, "snapshot must be oldest first");
}

#[tokio::test]
async fn test_banner_failure_leaves_an_inert_job_behind() {
    let manager = BroadcastManager::new(BroadcastConfig::fast());
    let messenger = Arc::new(MockMessenger::new(
        MockMessengerConfig::new().with_failing_chats([ADMIN_CHAT.0]),
    ));

    let result = manager
        .start_broadcast(Arc::clone(&messenger), ADMIN_CHAT, recipients(3), "doomed".to_string())
        .await;
    assert!(result.is_err(), "banner failure must surface to the caller");

    assert_eq!(manager.len().await, 1, "the job stays registered");
    let job = &manager.jobs().await[0];
    assert_eq!(job.state(), BroadcastJobState::Inert);

    // No fan-out ever starts for an inert job
    sleep(Duration::from_millis(50)).await;
    assert_eq!(messenger.sends().await.len(), 1, "only the failed banner attempt");
    assert_eq!(job.processed(), 0);
}

#[tokio::test]
async fn test_purge_sweeps_only_finished_jobs() {
    let manager = BroadcastManager::new(BroadcastConfig::fast().without_send_timeout());
    let quick_messenger = Arc::new(MockMessenger::with_default_config());
    let slow_messenger = Arc::new(MockMessenger::new(
        MockMessengerConfig::new().with_send_delay(Duration::from_millis(500)),
    ));

    let quick_id = manager
        .start_broadcast(Arc::clone(&quick_messenger), ADMIN_CHAT, recipients(1), "quick".to_string())
        .await
        .unwrap();
    let quick_job = manager.get(quick_id).await.unwrap();
    timeout(WAIT_LIMIT, quick_job.wait()).await.unwrap();

    let slow_id = manager
        .start_broadcast(Arc::clone(&slow_messenger), ADMIN_CHAT, recipients(1), "slow".to_string())
        .await
        .unwrap();

    assert_eq!(manager.purge_finished().await, 1);
    assert_eq!(manager.len().await, 1);
    assert!(manager.get(quick_id).await.is_none());
    assert!(manager.get(slow_id).await.is_some(), "running jobs survive the sweep");

    // Drain the hanging job so the test leaves no task behind
    let slow_job = manager.get(slow_id).await.unwrap();
    manager.cancel(slow_id).await;
    timeout(Duration::from_secs(2), slow_job.wait()).await.unwrap();
    assert_eq!(manager.purge_finished().await, 1);
    assert!(manager.is_empty().await);
}

#[tokio::test]
async fn test_remove_job_evicts_without_stopping_the_broadcast() {
    let manager = BroadcastManager::new(BroadcastConfig::fast());
    let messenger = Arc::new(MockMessenger::new(
        MockMessengerConfig::new().with_send_delay(Duration::from_millis(80)),
    ));

    let job_id = manager
        .start_broadcast(Arc::clone(&messenger), ADMIN_CHAT, recipients(2), "evicted".to_string())
        .await
        .unwrap();

    let removed = manager.remove_job(job_id).await.unwrap();
    assert!(manager.is_empty().await);
    assert!(manager.get(job_id).await.is_none());
    assert!(manager.remove_job(job_id).await.is_none(), "second eviction finds nothing");

    // Eviction only forgets the handle; the fan-out keeps running to completion
    timeout(WAIT_LIMIT, removed.wait()).await.unwrap();
    assert_eq!(removed.sent(), 2);
    assert_eq!(removed.failed(), 0);
    assert_eq!(removed.state(), BroadcastJobState::Completed);
}
