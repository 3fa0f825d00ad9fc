//! Inline button handlers

use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId, ParseMode};

use super::commands::show_search_outcome;
use super::sink::TelegramAudioSink;
use super::types::{report_failure, HandlerDeps};
use crate::core::error::AppResult;
use crate::download::source::Category;
use crate::telegram::callback::CallbackAction;
use crate::telegram::controller::{BrowseOutcome, ChatUser, DownloadOutcome, MoreOutcome, SelectOutcome};
use crate::telegram::render;

/// Decodes the button payload once and routes it
pub(super) async fn handle_callback(bot: Bot, q: CallbackQuery, deps: HandlerDeps) {
    let Some((chat_id, message_id)) = q.message.as_ref().map(|m| (m.chat().id, m.id())) else {
        let _ = bot.answer_callback_query(q.id.clone()).await;
        return;
    };

    let Some(action) = q.data.as_deref().and_then(CallbackAction::parse) else {
        log::debug!("Ignoring unknown callback data {:?}", q.data);
        let _ = bot.answer_callback_query(q.id.clone()).await;
        return;
    };

    let requester = ChatUser::from_user(&q.from);
    log::info!("🔘 Callback {} from {}", action.kind(), requester.id.0);
    let operation = action.kind();

    let result = match action {
        CallbackAction::Download { track_id, quality } => {
            // Runs detached so the chat's other updates aren't queued behind it
            let sink = TelegramAudioSink::new(bot.clone(), chat_id, Some(message_id), q.id.clone());
            tokio::spawn(async move {
                let outcome = deps
                    .controller
                    .download(&requester, &track_id, quality, &sink)
                    .await;
                if let Err(e) = show_download_outcome(&bot, &q, chat_id, message_id, &outcome).await {
                    report_failure(&bot, chat_id, "download", &e).await;
                }
            });
            return;
        }
        CallbackAction::Select(track_id) => on_select(&bot, &q, chat_id, message_id, &requester, &track_id, &deps).await,
        CallbackAction::NewSearch => on_new_search(&bot, &q, chat_id, message_id, &requester, &deps).await,
        CallbackAction::MoreTracks => on_more_tracks(&bot, &q, chat_id, message_id, &requester, &deps).await,
        CallbackAction::Category(category) => {
            on_category(&bot, &q, chat_id, message_id, &requester, category, &deps).await
        }
    };

    if let Err(e) = result {
        report_failure(&bot, chat_id, operation, &e).await;
    }
}

async fn on_select(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    message_id: MessageId,
    requester: &ChatUser,
    track_id: &str,
    deps: &HandlerDeps,
) -> AppResult<()> {
    match deps.controller.select(requester, track_id).await {
        SelectOutcome::NotFound => {
            bot.answer_callback_query(q.id.clone())
                .text(render::TRACK_NOT_FOUND)
                .show_alert(true)
                .await?;
        }
        SelectOutcome::Detail(track) => {
            bot.answer_callback_query(q.id.clone()).await?;
            bot.edit_message_text(
                chat_id,
                message_id,
                render::detail_text(&track, deps.controller.default_quality()),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(render::detail_keyboard(&track))
            .await?;
        }
    }
    Ok(())
}

async fn on_new_search(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    message_id: MessageId,
    requester: &ChatUser,
    deps: &HandlerDeps,
) -> AppResult<()> {
    deps.controller.new_search(requester).await;
    bot.answer_callback_query(q.id.clone()).await?;
    bot.edit_message_text(chat_id, message_id, render::NEW_SEARCH)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

async fn on_more_tracks(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    message_id: MessageId,
    requester: &ChatUser,
    deps: &HandlerDeps,
) -> AppResult<()> {
    bot.answer_callback_query(q.id.clone()).await?;

    if let Some(session) = deps.controller.sessions().get(requester.id).await {
        if !session.query.is_empty() {
            bot.edit_message_text(chat_id, message_id, render::more_tracks_text(&session.query))
                .parse_mode(ParseMode::Html)
                .await?;
        }
    }

    match deps.controller.more_tracks(requester).await {
        MoreOutcome::NoQuery => {
            bot.edit_message_text(chat_id, message_id, render::NO_PREVIOUS_QUERY)
                .await?;
        }
        MoreOutcome::Search(outcome) => {
            show_search_outcome(bot, chat_id, message_id, &outcome).await?;
        }
    }
    Ok(())
}

async fn on_category(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    message_id: MessageId,
    requester: &ChatUser,
    category: Category,
    deps: &HandlerDeps,
) -> AppResult<()> {
    bot.answer_callback_query(q.id.clone()).await?;

    match deps.controller.browse(requester, category).await {
        BrowseOutcome::Empty(category) => {
            bot.edit_message_text(chat_id, message_id, render::category_empty_text(category))
                .await?;
        }
        BrowseOutcome::Tracks { category, tracks } => {
            bot.edit_message_text(chat_id, message_id, render::category_results_text(category))
                .parse_mode(ParseMode::Html)
                .reply_markup(render::results_keyboard(&tracks))
                .await?;
        }
    }
    Ok(())
}

async fn show_download_outcome(
    bot: &Bot,
    q: &CallbackQuery,
    chat_id: ChatId,
    message_id: MessageId,
    outcome: &DownloadOutcome,
) -> AppResult<()> {
    match outcome {
        DownloadOutcome::Busy => {
            bot.answer_callback_query(q.id.clone())
                .text(render::ALREADY_DOWNLOADING)
                .await?;
        }
        DownloadOutcome::Delivered { .. } => {
            bot.edit_message_text(chat_id, message_id, render::DELIVERED)
                .parse_mode(ParseMode::Html)
                .await?;
        }
        DownloadOutcome::FetchFailed { track } => {
            bot.edit_message_text(chat_id, message_id, render::download_failed_text())
                .parse_mode(ParseMode::Html)
                .reply_markup(render::fallback_keyboard(track))
                .await?;
        }
        DownloadOutcome::SendFailed { track } => {
            bot.edit_message_text(chat_id, message_id, render::send_failed_text())
                .parse_mode(ParseMode::Html)
                .reply_markup(render::fallback_keyboard(track))
                .await?;
        }
    }
    Ok(())
}
