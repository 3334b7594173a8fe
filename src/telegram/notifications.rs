//! Out-of-band notifications sent to the configured admins

use teloxide::prelude::*;

use crate::core::config;
use crate::telegram::handlers::SubscriberInfo;

/// Sends a plain-text notification to every configured admin.
///
/// Delivery failures are logged per admin and never interrupt the caller.
///
/// # Arguments
///
/// * `bot` - Bot instance used to send messages
/// * `text` - Notification text
pub async fn notify_admins(bot: &Bot, text: &str) {
    for admin_id in config::admin::all_admin_ids() {
        if let Err(error) = bot.send_message(ChatId(admin_id), text).await {
            log::warn!("Failed to notify admin {}: {}", admin_id, error);
        }
    }
}

/// Tells the admins the bot came up and is ready to serve broadcasts.
pub async fn notify_admin_startup(bot: &Bot, bot_username: Option<&str>) {
    let name = bot_username.unwrap_or("heraldbot");
    notify_admins(bot, &format!("🤖 @{} is up and ready to broadcast.", name)).await;
}

/// Tells the admins a chat joined or left the broadcast roster.
pub async fn notify_admin_subscriber_change(bot: &Bot, subscriber: &SubscriberInfo, subscribed: bool) {
    let text = if subscribed {
        format!("➕ New broadcast subscriber: {}", subscriber.describe())
    } else {
        format!("➖ Subscriber left the roster: {}", subscriber.describe())
    };
    notify_admins(bot, &text).await;
}
