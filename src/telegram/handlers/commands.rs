//! Command handler implementations (/start, /stop, /help)

use teloxide::prelude::*;
use teloxide::types::Message;
use teloxide::utils::command::BotCommands;

use super::types::{HandlerDeps, HandlerError, SubscriberInfo};
use crate::core::metrics::{record_command, set_roster_size};
use crate::telegram::bot::Command;
use crate::telegram::notifications::notify_admin_subscriber_change;

/// Handle /start command - add the chat to the broadcast roster
pub(super) async fn handle_start_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    record_command("start");

    let chat_id = msg.chat.id;
    if deps.roster.add(chat_id).await? {
        set_roster_size(deps.roster.count().await?);
        log::info!("New broadcast subscriber: {}", chat_id);

        bot.send_message(chat_id, "👋 You're on the broadcast list now. You'll receive announcements here.")
            .await?;

        // Notify admins in the background
        let subscriber = SubscriberInfo::from_message(msg);
        let bot_notify = bot.clone();
        tokio::spawn(async move {
            notify_admin_subscriber_change(&bot_notify, &subscriber, true).await;
        });
    } else {
        bot.send_message(chat_id, "You're already on the broadcast list.").await?;
    }

    Ok(())
}

/// Handle /stop command - remove the chat from the broadcast roster
pub(super) async fn handle_stop_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    record_command("stop");

    let chat_id = msg.chat.id;
    if deps.roster.remove(chat_id).await? {
        set_roster_size(deps.roster.count().await?);
        log::info!("Subscriber left the roster: {}", chat_id);

        bot.send_message(chat_id, "🔕 You won't receive broadcasts anymore. Send /start to subscribe again.")
            .await?;

        let subscriber = SubscriberInfo::from_message(msg);
        let bot_notify = bot.clone();
        tokio::spawn(async move {
            notify_admin_subscriber_change(&bot_notify, &subscriber, false).await;
        });
    } else {
        bot.send_message(chat_id, "You're not on the broadcast list.").await?;
    }

    Ok(())
}

/// Handle /help command - show the command menu
pub(super) async fn handle_help_command(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    record_command("help");
    bot.send_message(msg.chat.id, Command::descriptions().to_string()).await?;
    Ok(())
}
