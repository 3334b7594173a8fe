//! Admin functionality for the Telegram bot
//!
//! This module contains the broadcast control commands and utilities:
//! - Broadcast fan-out (/broadcast)
//! - Job cancellation (/cancelbroadcast)
//! - Job registry inspection (/broadcasts)

use std::str::FromStr;
use std::sync::Arc;

use teloxide::prelude::*;

use crate::broadcast::{BroadcastJob, JobId};
use crate::core::config::admin::{ADMIN_IDS, ADMIN_USER_ID};
use crate::core::metrics::record_command;
use crate::core::AppResult;
use crate::telegram::handlers::types::HandlerDeps;

/// Maximum message length for Telegram (with margin)
const MAX_MESSAGE_LENGTH: usize = 4000;

fn truncate_message(text: &str) -> String {
    if text.len() <= MAX_MESSAGE_LENGTH {
        return text.to_string();
    }
    let mut trimmed = text.chars().take(MAX_MESSAGE_LENGTH - 20).collect::<String>();
    trimmed.push_str("\n... (truncated)");
    trimmed
}

/// Check if user is admin
pub fn is_admin(user_id: i64) -> bool {
    is_admin_in(&ADMIN_IDS, *ADMIN_USER_ID, user_id)
}

fn is_admin_in(admin_ids: &[i64], primary: i64, user_id: i64) -> bool {
    if !admin_ids.is_empty() {
        return admin_ids.contains(&user_id);
    }
    primary != 0 && primary == user_id
}

/// Extracts the sender's user id from a message, 0 when unavailable
pub fn sender_id(msg: &Message) -> i64 {
    msg.from.as_ref().and_then(|u| i64::try_from(u.id.0).ok()).unwrap_or(0)
}

/// Handle /broadcast command - fan a message out to the whole roster (admin only)
///
/// # Arguments
/// * `bot` - Bot instance
/// * `deps` - Shared handler dependencies
/// * `msg` - The incoming command message
pub async fn handle_broadcast_command(bot: &Bot, deps: &HandlerDeps, msg: &Message) -> AppResult<()> {
    if !is_admin(sender_id(msg)) {
        bot.send_message(msg.chat.id, "⛔ You are not allowed to run broadcasts.").await?;
        return Ok(());
    }

    record_command("broadcast");

    let raw = msg.text().unwrap_or_default();
    let text = raw.strip_prefix("/broadcast").map(str::trim).unwrap_or_default();
    if text.is_empty() {
        bot.send_message(msg.chat.id, "Usage: /broadcast <message text>").await?;
        return Ok(());
    }

    let recipients = deps.roster.chat_ids().await?;
    if recipients.is_empty() {
        bot.send_message(msg.chat.id, "📭 The roster is empty, nobody to broadcast to.")
            .await?;
        return Ok(());
    }

    let recipient_count = recipients.len();
    let job_id = deps
        .manager
        .start_broadcast(Arc::clone(&deps.messenger), msg.chat.id, recipients, text.to_string())
        .await?;

    bot.send_message(
        msg.chat.id,
        format!(
            "📣 Broadcast {} queued for {} recipient(s).\nStop it with /cancelbroadcast {}",
            job_id, recipient_count, job_id
        ),
    )
    .await?;

    Ok(())
}

/// Handle /cancelbroadcast command - request cancellation of a running job (admin only)
pub async fn handle_cancel_broadcast_command(bot: &Bot, deps: &HandlerDeps, msg: &Message) -> AppResult<()> {
    if !is_admin(sender_id(msg)) {
        bot.send_message(msg.chat.id, "⛔ You are not allowed to run broadcasts.").await?;
        return Ok(());
    }

    record_command("cancelbroadcast");

    let raw = msg.text().unwrap_or_default();
    let args = raw.strip_prefix("/cancelbroadcast").map(str::trim).unwrap_or_default();

    let job_id = match JobId::from_str(args) {
        Ok(id) => id,
        Err(_) => {
            bot.send_message(msg.chat.id, "Usage: /cancelbroadcast <job id>").await?;
            return Ok(());
        }
    };

    let reply = if deps.manager.cancel(job_id).await {
        format!("🛑 Broadcast {} is being cancelled.", job_id)
    } else {
        format!("Unknown broadcast job: {}", job_id)
    };
    bot.send_message(msg.chat.id, reply).await?;

    Ok(())
}

/// Handle /broadcasts command - report every job in the registry (admin only)
pub async fn handle_broadcasts_command(bot: &Bot, deps: &HandlerDeps, msg: &Message) -> AppResult<()> {
    if !is_admin(sender_id(msg)) {
        bot.send_message(msg.chat.id, "⛔ You are not allowed to run broadcasts.").await?;
        return Ok(());
    }

    record_command("broadcasts");

    let jobs = deps.manager.jobs().await;
    bot.send_message(msg.chat.id, format_job_list(&jobs)).await?;

    Ok(())
}

/// Renders the job registry as one report message, oldest job first
fn format_job_list(jobs: &[Arc<BroadcastJob>]) -> String {
    if jobs.is_empty() {
        return "No broadcast jobs in the registry.".to_string();
    }

    let mut text = format!("📋 Broadcast jobs ({}):\n", jobs.len());
    for job in jobs {
        text.push_str(&format!(
            "• {} | {} | {}/{} processed | ✅ {} ❌ {}\n",
            job.job_id,
            job.state(),
            job.processed(),
            job.total(),
            job.sent(),
            job.failed(),
        ));
    }

    truncate_message(&text)
}
