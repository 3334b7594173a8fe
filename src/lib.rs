//! Heraldbot - Telegram bot for fanning announcements out to subscribers
//!
//! This library provides all the core functionality for the Heraldbot bot,
//! including the broadcast engine, job registry, roster persistence, and
//! Telegram bot integration.
//!
//! # Module Structure
//!
//! - `core`: Core utilities, configuration, errors, logging, and metrics
//! - `storage`: Broadcast roster persistence
//! - `broadcast`: Bounded-concurrency fan-out engine and job registry
//! - `telegram`: Telegram bot integration and handlers

pub mod broadcast;
pub mod cli;
pub mod core;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use broadcast::{BroadcastConfig, BroadcastJob, BroadcastJobState, BroadcastManager, BroadcastStatus, JobId};
pub use core::{config, AppError, AppResult};
pub use storage::{FileRoster, InMemoryRoster, Roster};
pub use telegram::{Messenger, TelegramMessenger};
