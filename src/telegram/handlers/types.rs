//! Handler types, dependencies and the error boundary

use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};

use crate::core::error::AppError;
use crate::core::metrics;
use crate::telegram::controller::{ChatUser, Controller};
use crate::telegram::render;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub controller: Controller,
}

impl HandlerDeps {
    pub fn new(controller: Controller) -> Self {
        Self { controller }
    }
}

/// Sender of a message, `None` for channel posts and anonymous admins
pub fn requester_from_message(msg: &Message) -> Option<ChatUser> {
    msg.from.as_ref().map(ChatUser::from_user)
}

/// Logs a failed operation, counts it and tells the user something went wrong.
pub async fn report_failure(bot: &Bot, chat_id: ChatId, operation: &str, error: &AppError) {
    log::error!("❌ {} failed for chat {}: {}", operation, chat_id.0, error);
    metrics::record_error(error.category(), operation);

    if let Err(e) = bot
        .send_message(chat_id, render::GENERIC_ERROR)
        .parse_mode(ParseMode::Html)
        .await
    {
        log::warn!("Failed to send error notice to chat {}: {}", chat_id.0, e);
    }
}
