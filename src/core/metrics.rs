//! Metrics collection for the Telegram bot using Prometheus
//!
//! This module provides a centralized metrics registry for tracking:
//! - Broadcast throughput (jobs, per-recipient deliveries, durations)
//! - Registry health (active jobs)
//! - User engagement (command usage, roster size)
//! - Process health (uptime, dispatcher restarts)

// The register_* macros fail only on duplicate registration, which would
// be a programming error in this module.
#![allow(clippy::unwrap_used)]

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter, CounterVec, Gauge, Histogram,
};

// ======================
// BROADCAST METRICS
// ======================

lazy_static! {
    /// Broadcast jobs accepted and fanned out
    pub static ref BROADCASTS_STARTED_TOTAL: Counter = register_counter!(
        "heraldbot_broadcasts_started_total",
        "Total number of broadcast jobs started"
    )
    .unwrap();

    /// Broadcast jobs that reached their final status edit
    /// Labels: outcome (completed/cancelled)
    pub static ref BROADCASTS_FINISHED_TOTAL: CounterVec = register_counter_vec!(
        "heraldbot_broadcasts_finished_total",
        "Total number of broadcast jobs finished",
        &["outcome"]
    )
    .unwrap();

    /// Individual broadcast deliveries
    /// Labels: outcome (sent/failed)
    pub static ref BROADCAST_SENDS_TOTAL: CounterVec = register_counter_vec!(
        "heraldbot_broadcast_sends_total",
        "Total number of per-recipient broadcast deliveries",
        &["outcome"]
    )
    .unwrap();

    /// Broadcast jobs currently fanning out
    pub static ref BROADCAST_JOBS_ACTIVE: Gauge = register_gauge!(
        "heraldbot_broadcast_jobs_active",
        "Number of broadcast jobs currently running"
    )
    .unwrap();

    /// Wall-clock time from fan-out start to final status edit
    pub static ref BROADCAST_DURATION_SECONDS: Histogram = register_histogram!(
        "heraldbot_broadcast_duration_seconds",
        "Time spent running a broadcast job",
        vec![0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0]
    )
    .unwrap();

    /// Recipient count per broadcast job
    pub static ref BROADCAST_RECIPIENTS: Histogram = register_histogram!(
        "heraldbot_broadcast_recipients",
        "Number of recipients per broadcast job",
        vec![1.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0]
    )
    .unwrap();
}

// ======================
// ENGAGEMENT METRICS
// ======================

lazy_static! {
    /// Command usage count
    /// Labels: command (start/stop/help/broadcast/cancelbroadcast/broadcasts)
    pub static ref COMMAND_USAGE_TOTAL: CounterVec = register_counter_vec!(
        "heraldbot_command_usage_total",
        "Total number of bot commands processed",
        &["command"]
    )
    .unwrap();

    /// Registered broadcast recipients
    pub static ref ROSTER_SIZE: Gauge = register_gauge!(
        "heraldbot_roster_size",
        "Number of chats currently on the broadcast roster"
    )
    .unwrap();
}

// ======================
// SYSTEM METRICS
// ======================

lazy_static! {
    /// Bot process uptime, bumped by the uptime ticker
    pub static ref BOT_UPTIME_SECONDS: Counter = register_counter!(
        "heraldbot_bot_uptime_seconds",
        "Bot uptime in seconds"
    )
    .unwrap();

    /// Dispatcher crash-restarts
    pub static ref DISPATCHER_RESTARTS_TOTAL: Counter = register_counter!(
        "heraldbot_dispatcher_restarts_total",
        "Total number of dispatcher restarts after a crash"
    )
    .unwrap();
}

/// Initialize all metrics (call once at startup)
pub fn init_metrics() {
    log::info!("Initializing metrics registry...");

    // Initialize all lazy statics by accessing them
    let _ = &*BROADCASTS_STARTED_TOTAL;
    let _ = &*BROADCASTS_FINISHED_TOTAL;
    let _ = &*BROADCAST_SENDS_TOTAL;
    let _ = &*BROADCAST_JOBS_ACTIVE;
    let _ = &*BROADCAST_DURATION_SECONDS;
    let _ = &*BROADCAST_RECIPIENTS;
    let _ = &*COMMAND_USAGE_TOTAL;
    let _ = &*ROSTER_SIZE;
    let _ = &*BOT_UPTIME_SECONDS;
    let _ = &*DISPATCHER_RESTARTS_TOTAL;

    // Initialize label combinations so they appear in /metrics with 0 values
    BROADCASTS_FINISHED_TOTAL.with_label_values(&["completed"]);
    BROADCASTS_FINISHED_TOTAL.with_label_values(&["cancelled"]);

    BROADCAST_SENDS_TOTAL.with_label_values(&["sent"]);
    BROADCAST_SENDS_TOTAL.with_label_values(&["failed"]);

    COMMAND_USAGE_TOTAL.with_label_values(&["start"]);
    COMMAND_USAGE_TOTAL.with_label_values(&["stop"]);
    COMMAND_USAGE_TOTAL.with_label_values(&["help"]);
    COMMAND_USAGE_TOTAL.with_label_values(&["broadcast"]);
    COMMAND_USAGE_TOTAL.with_label_values(&["cancelbroadcast"]);
    COMMAND_USAGE_TOTAL.with_label_values(&["broadcasts"]);

    log::info!("Metrics registry initialized successfully");
}

/// Helper function to record a per-recipient delivery outcome
pub fn record_send_outcome(outcome: &str) {
    BROADCAST_SENDS_TOTAL.with_label_values(&[outcome]).inc();
}

/// Helper function to record a finished broadcast job
pub fn record_broadcast_finished(outcome: &str, duration_secs: f64) {
    BROADCASTS_FINISHED_TOTAL.with_label_values(&[outcome]).inc();
    BROADCAST_DURATION_SECONDS.observe(duration_secs);
}

/// Helper function to record command usage
pub fn record_command(command: &str) {
    COMMAND_USAGE_TOTAL.with_label_values(&[command]).inc();
}

/// Helper function to update the roster size gauge
pub fn set_roster_size(size: usize) {
    ROSTER_SIZE.set(size as f64);
}
