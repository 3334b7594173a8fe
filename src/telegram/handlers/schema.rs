//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::commands::{handle_help_command, handle_start_command, handle_stop_command};
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// This function returns a handler tree that can be used with teloxide's Dispatcher.
/// The same schema is used in production and can be used in integration tests.
///
/// The admin commands are matched as plain text and stay out of the public
/// command menu. `/broadcasts` must be branched before `/broadcast` because
/// the latter is a prefix of the former.
///
/// # Arguments
/// * `deps` - Handler dependencies (roster, broadcast manager, messenger)
///
/// # Returns
/// The complete handler tree for the bot
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_broadcasts = deps.clone();
    let deps_cancel = deps.clone();
    let deps_broadcast = deps.clone();
    let deps_commands = deps;

    dptree::entry()
        // Hidden admin commands (not in Command enum)
        .branch(broadcasts_handler(deps_broadcasts))
        .branch(cancel_broadcast_handler(deps_cancel))
        .branch(broadcast_handler(deps_broadcast))
        // Command handler
        .branch(command_handler(deps_commands))
}

/// Handler for /broadcasts admin command (hidden, not in Command enum)
fn broadcasts_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().map(|text| text.starts_with("/broadcasts")).unwrap_or(false))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                use crate::telegram::admin::handle_broadcasts_command;

                if let Err(e) = handle_broadcasts_command(&bot, &deps, &msg).await {
                    log::error!("/broadcasts handler failed for chat {}: {}", msg.chat.id, e);
                    let _ = bot.send_message(msg.chat.id, format!("Error: {}", e)).await;
                }
                Ok(())
            }
        })
}

/// Handler for /cancelbroadcast admin command (hidden, not in Command enum)
fn cancel_broadcast_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| {
            msg.text().map(|text| text.starts_with("/cancelbroadcast")).unwrap_or(false)
        })
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                use crate::telegram::admin::handle_cancel_broadcast_command;

                if let Err(e) = handle_cancel_broadcast_command(&bot, &deps, &msg).await {
                    log::error!("/cancelbroadcast handler failed for chat {}: {}", msg.chat.id, e);
                    let _ = bot.send_message(msg.chat.id, format!("Error: {}", e)).await;
                }
                Ok(())
            }
        })
}

/// Handler for /broadcast admin command (hidden, not in Command enum)
fn broadcast_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().map(|text| text.starts_with("/broadcast")).unwrap_or(false))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                use crate::telegram::admin::handle_broadcast_command;

                if let Err(e) = handle_broadcast_command(&bot, &deps, &msg).await {
                    log::error!("/broadcast handler failed for chat {}: {}", msg.chat.id, e);
                    let _ = bot.send_message(msg.chat.id, format!("Error: {}", e)).await;
                }
                Ok(())
            }
        })
}

/// Handler for bot commands (/start, /stop, /help)
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("🎯 Received command: {:?} from chat {}", cmd, msg.chat.id);

                let result = match cmd {
                    Command::Start => handle_start_command(&bot, &msg, &deps).await,
                    Command::Stop => handle_stop_command(&bot, &msg, &deps).await,
                    Command::Help => handle_help_command(&bot, &msg).await,
                };

                if let Err(e) = result {
                    log::error!("{:?} handler failed for chat {}: {}", cmd, msg.chat.id, e);
                    let _ = bot.send_message(msg.chat.id, format!("Error: {}", e)).await;
                }
                Ok(())
            }
        },
    ))
}
