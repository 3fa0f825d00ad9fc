//! Command and free-text handlers (/start, /help, /search, /popular, /stats, unknown commands)

use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId, ParseMode};

use super::types::{report_failure, requester_from_message, HandlerDeps};
use crate::core::error::AppResult;
use crate::core::metrics;
use crate::telegram::bot::Command;
use crate::telegram::controller::{ChatUser, SearchOutcome, StatsOutcome};
use crate::telegram::render;

/// Runs one command; failures end at the error boundary
pub(super) async fn handle_command(bot: &Bot, msg: &Message, cmd: Command, deps: &HandlerDeps) {
    metrics::record_command(cmd.name());
    let operation = cmd.name();
    if let Err(e) = dispatch_command(bot, msg, cmd, deps).await {
        report_failure(bot, msg.chat.id, operation, &e).await;
    }
}

async fn dispatch_command(bot: &Bot, msg: &Message, cmd: Command, deps: &HandlerDeps) -> AppResult<()> {
    let Some(requester) = requester_from_message(msg) else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    match cmd {
        Command::Start => {
            deps.controller.register(&requester).await;
            let first_name = msg.from.as_ref().map(|u| u.first_name.as_str()).unwrap_or_default();
            bot.send_message(chat_id, render::welcome_text(first_name))
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Command::Help => {
            bot.send_message(chat_id, render::help_text())
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Command::Search(query) if query.trim().is_empty() => {
            deps.controller.await_query(&requester).await;
            bot.send_message(chat_id, render::AWAITING_QUERY)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        Command::Search(query) => {
            run_text_search(bot, chat_id, &requester, &query, deps).await?;
        }
        Command::Popular => {
            bot.send_message(chat_id, render::category_menu_text())
                .parse_mode(ParseMode::Html)
                .reply_markup(render::category_keyboard())
                .await?;
        }
        Command::Stats => match deps.controller.stats_report(&requester).await {
            StatsOutcome::Forbidden => {
                bot.send_message(chat_id, render::FORBIDDEN).await?;
            }
            StatsOutcome::Report(report) => {
                bot.send_message(chat_id, render::stats_text(&report))
                    .parse_mode(ParseMode::Html)
                    .await?;
            }
        },
    }
    Ok(())
}

/// Any non-command text is a search query
pub(super) async fn handle_text(bot: &Bot, msg: &Message, text: &str, deps: &HandlerDeps) {
    let Some(requester) = requester_from_message(msg) else {
        return;
    };
    if let Err(e) = run_text_search(bot, msg.chat.id, &requester, text, deps).await {
        report_failure(bot, msg.chat.id, "search", &e).await;
    }
}

/// A `/word` that is not one of our commands: answer with the help text
pub(super) async fn handle_unknown_command(bot: &Bot, msg: &Message) {
    metrics::record_command("unknown");
    if let Err(e) = bot
        .send_message(msg.chat.id, render::help_text())
        .parse_mode(ParseMode::Html)
        .await
    {
        report_failure(bot, msg.chat.id, "unknown_command", &e.into()).await;
    }
}

async fn run_text_search(
    bot: &Bot,
    chat_id: ChatId,
    requester: &ChatUser,
    text: &str,
    deps: &HandlerDeps,
) -> AppResult<()> {
    let status = bot
        .send_message(chat_id, render::searching_text(text.trim()))
        .parse_mode(ParseMode::Html)
        .await?;
    let outcome = deps.controller.search(requester, text).await;
    show_search_outcome(bot, chat_id, status.id, &outcome).await
}

/// Replaces a status message with the result list (or the reason there is none)
pub(super) async fn show_search_outcome(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    outcome: &SearchOutcome,
) -> AppResult<()> {
    match outcome {
        SearchOutcome::TooShort => {
            bot.edit_message_text(chat_id, message_id, render::TOO_SHORT).await?;
        }
        SearchOutcome::NoResults { query } => {
            bot.edit_message_text(chat_id, message_id, render::no_results_text(query))
                .parse_mode(ParseMode::Html)
                .await?;
        }
        SearchOutcome::Results { query, tracks } => {
            bot.edit_message_text(chat_id, message_id, render::results_text(query, tracks.len()))
                .parse_mode(ParseMode::Html)
                .reply_markup(render::results_keyboard(tracks))
                .await?;
        }
    }
    Ok(())
}
