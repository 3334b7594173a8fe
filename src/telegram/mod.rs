//! Telegram bot integration and handlers

pub mod admin;
pub mod bot;
pub mod handlers;
pub mod messenger;
pub mod notifications;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use messenger::{Messenger, TelegramMessenger};
pub use notifications::{notify_admin_startup, notify_admin_subscriber_change, notify_admins};
