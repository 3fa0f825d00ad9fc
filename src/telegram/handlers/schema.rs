//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{Me, Message};

use super::callbacks::handle_callback;
use super::commands::{handle_command, handle_text, handle_unknown_command};
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Commands are matched first, then any other text (a search query, or the
/// help text for an unrecognised command), then inline button presses.
/// Everything else is dropped.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
        .branch(callback_handler(deps_callback))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("🎯 Received command: {:?} from chat {}", cmd, msg.chat.id);
                handle_command(&bot, &msg, cmd, &deps).await;
                Ok(())
            }
        },
    ))
}

/// What to do with a text message no known command matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextRoute {
    Query,
    UnknownCommand,
    /// A command addressed to another bot in a group chat
    Ignore,
}

fn route_text(text: &str, bot_username: &str) -> TextRoute {
    let Some(command) = text.strip_prefix('/') else {
        return TextRoute::Query;
    };
    let head = command.split_whitespace().next().unwrap_or_default();
    match head.split_once('@') {
        Some((_, addressee)) if !addressee.eq_ignore_ascii_case(bot_username) => TextRoute::Ignore,
        _ => TextRoute::UnknownCommand,
    }
}

/// Text that no command matched
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some())
        .endpoint(move |bot: Bot, msg: Message, me: Me| {
            let deps = deps.clone();
            async move {
                let text = msg.text().unwrap_or_default().to_string();
                match route_text(&text, me.username()) {
                    TextRoute::Query => handle_text(&bot, &msg, &text, &deps).await,
                    TextRoute::UnknownCommand => {
                        log::info!("❓ Unknown command {:?} from chat {}", text, msg.chat.id);
                        handle_unknown_command(&bot, &msg).await;
                    }
                    TextRoute::Ignore => {}
                }
                Ok(())
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            handle_callback(bot, q, deps).await;
            Ok(())
        }
    })
}
