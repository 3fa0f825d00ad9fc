//! Delivery of downloaded audio into a Telegram chat

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, ChatId, InputFile, MessageId, ParseMode};

use crate::core::error::AppResult;
use crate::download::source::{AudioPayload, TrackCandidate};
use crate::telegram::controller::AudioSink;
use crate::telegram::render;

/// Sends the audio to the chat the download button was pressed in
pub struct TelegramAudioSink {
    bot: Bot,
    chat_id: ChatId,
    /// Detail card that turns into the progress message
    card: Option<MessageId>,
    /// Button press to acknowledge once the download actually starts
    query_id: CallbackQueryId,
}

impl TelegramAudioSink {
    pub fn new(bot: Bot, chat_id: ChatId, card: Option<MessageId>, query_id: CallbackQueryId) -> Self {
        Self {
            bot,
            chat_id,
            card,
            query_id,
        }
    }
}

#[async_trait]
impl AudioSink for TelegramAudioSink {
    async fn started(&self, track: &TrackCandidate) {
        if let Err(e) = self
            .bot
            .answer_callback_query(self.query_id.clone())
            .text(render::DOWNLOAD_STARTED)
            .await
        {
            log::warn!("Failed to answer download callback: {}", e);
        }

        if let Some(card) = self.card {
            if let Err(e) = self
                .bot
                .edit_message_text(self.chat_id, card, render::downloading_text(track))
                .parse_mode(ParseMode::Html)
                .await
            {
                log::warn!("Failed to show download progress in chat {}: {}", self.chat_id.0, e);
            }
        }
    }

    async fn deliver(&self, track: &TrackCandidate, payload: &AudioPayload) -> AppResult<()> {
        let file = InputFile::memory(payload.bytes.clone()).file_name(payload.filename.clone());

        let mut request = self
            .bot
            .send_audio(self.chat_id, file)
            .title(payload.title.clone())
            .performer(payload.artist.clone())
            .caption(render::audio_caption(track))
            .parse_mode(ParseMode::Html);

        if let Some(duration) = payload.duration_seconds {
            request = request.duration(duration);
        }
        if let Some(thumbnail) = track.thumbnail.as_deref().and_then(|t| url::Url::parse(t).ok()) {
            request = request.thumbnail(InputFile::url(thumbnail));
        }

        request.await?;
        log::info!(
            "📤 Sent {} ({} bytes) to chat {}",
            payload.filename,
            payload.bytes.len(),
            self.chat_id.0
        );
        Ok(())
    }
}
