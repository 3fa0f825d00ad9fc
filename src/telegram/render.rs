//! Chat texts and inline keyboards (HTML parse mode)

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html::escape;
use url::Url;

use crate::core::keep_alive::format_uptime;
use crate::core::stats::StatsReport;
use crate::core::utils::{format_count, truncate_label};
use crate::download::source::{AudioQuality, Category, TrackCandidate};
use crate::telegram::callback::CallbackAction;

pub const TOO_SHORT: &str = "❌ Enter at least 2 characters to search";
pub const TRACK_NOT_FOUND: &str = "❌ Track not found. Run the search again.";
pub const ALREADY_DOWNLOADING: &str = "⏳ A download is already running, please wait";
pub const DOWNLOAD_STARTED: &str = "⚡ Starting download...";
pub const DELIVERED: &str = "✅ <b>Track sent to the chat!</b>";
pub const FORBIDDEN: &str = "❌ This command is for the administrator only";
pub const GENERIC_ERROR: &str = "❌ Something went wrong. Please try again later.";
pub const AWAITING_QUERY: &str = "🔍 <b>Enter a song title or artist:</b>";
pub const NEW_SEARCH: &str = "🔍 <b>New search</b>\n\nEnter a song title or artist:";
pub const NO_PREVIOUS_QUERY: &str = "Enter a query to search:";

fn callback_button(text: impl Into<String>, action: &CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text.into(), action.encode())
}

fn source_button(text: &str, track: &TrackCandidate) -> Option<InlineKeyboardButton> {
    Url::parse(&track.source_url())
        .ok()
        .map(|url| InlineKeyboardButton::url(text.to_string(), url))
}

pub fn welcome_text(first_name: &str) -> String {
    format!(
        "🎵 <b>Hi, {}!</b>\n\n\
         I'm a music bot that finds tracks and sends them as MP3.\n\n\
         <b>Commands:</b>\n\
         • Type a song title or artist to search\n\
         • /search - search for music\n\
         • /popular - popular tracks\n\
         • /stats - bot statistics\n\
         • /help - help\n\n\
         <b>Example queries:</b>\n\
         • <code>Never Gonna Give You Up</code>\n\
         • <code>Billie Eilish</code>\n\
         • <code>hits 2024</code>",
        escape(first_name)
    )
}

pub fn help_text() -> String {
    "🎯 <b>How to use the bot:</b>\n\n\
     1. <b>Search:</b>\n\
     Type a song title or artist, or use /search\n\n\
     2. <b>Download:</b>\n\
     • Pick a track from the list\n\
     • Press \"Download MP3\" or choose a bitrate\n\
     • Receive the file in the chat\n\n\
     3. <b>Quality:</b>\n\
     • MP3 128 / 192 / 320 kbps\n\
     • Title and artist tags\n\n\
     ⚠️ <b>Important:</b>\n\
     Download music for personal use only.\n\
     Support artists by buying their music."
        .to_string()
}

pub fn searching_text(query: &str) -> String {
    format!("🔍 <b>Searching:</b> <code>{}</code>", escape(query))
}

pub fn no_results_text(query: &str) -> String {
    format!("❌ Nothing found for <code>{}</code>", escape(query))
}

pub fn results_text(query: &str, count: usize) -> String {
    format!(
        "✅ <b>Found {} track(s):</b>\n<code>{}</code>\n\n<i>Pick a track to download:</i>",
        count,
        escape(query)
    )
}

/// One button per track (`N. <label>`), then "New search"
pub fn results_keyboard(tracks: &[TrackCandidate]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = tracks
        .iter()
        .enumerate()
        .map(|(i, track)| {
            vec![callback_button(
                format!("{}. {}", i + 1, truncate_label(&track.title)),
                &CallbackAction::Select(track.id.clone()),
            )]
        })
        .collect();
    rows.push(vec![callback_button("🔍 New search", &CallbackAction::NewSearch)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn category_menu_text() -> &'static str {
    "🎧 <b>Pick a popular music category:</b>"
}

/// Two categories per row
pub fn category_keyboard() -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = Category::ALL
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|category| callback_button(category.label(), &CallbackAction::Category(*category)))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

pub fn category_results_text(category: Category) -> String {
    format!("🎧 <b>{}:</b>\n\n<i>Pick a track to download:</i>", category.label())
}

pub fn category_empty_text(category: Category) -> String {
    format!("❌ No tracks in {} right now", category.label())
}

pub fn detail_text(track: &TrackCandidate, default_quality: AudioQuality) -> String {
    let mut text = format!(
        "🎵 <b>Selected track:</b>\n\n<b>{}</b>\n⏱ Duration: {}\n",
        escape(&track.title),
        escape(&track.duration)
    );
    if let Some(channel) = &track.channel {
        text.push_str(&format!("👤 {}\n", escape(channel)));
    }
    if let Some(views) = track.view_count {
        text.push_str(&format!("👁 {} views\n", format_count(views)));
    }
    text.push_str(&format!(
        "\n<i>Press \"Download MP3\" for {} or pick a bitrate</i>",
        default_quality.bitrate()
    ));
    text
}

/// Default download + YouTube link, per-quality row, then new search / more tracks
pub fn detail_keyboard(track: &TrackCandidate) -> InlineKeyboardMarkup {
    let mut first_row = vec![callback_button(
        "⬇️ Download MP3",
        &CallbackAction::Download {
            track_id: track.id.clone(),
            quality: None,
        },
    )];
    first_row.extend(source_button("🎬 YouTube", track));

    let quality_row: Vec<InlineKeyboardButton> = AudioQuality::ALL
        .iter()
        .map(|quality| {
            callback_button(
                quality.bitrate(),
                &CallbackAction::Download {
                    track_id: track.id.clone(),
                    quality: Some(*quality),
                },
            )
        })
        .collect();

    InlineKeyboardMarkup::new(vec![
        first_row,
        quality_row,
        vec![
            callback_button("🔍 New search", &CallbackAction::NewSearch),
            callback_button("📋 More tracks", &CallbackAction::MoreTracks),
        ],
    ])
}

pub fn downloading_text(track: &TrackCandidate) -> String {
    format!(
        "⬇️ <b>Downloading:</b> {}\n⏳ Please wait...",
        escape(&track.title)
    )
}

pub fn audio_caption(track: &TrackCandidate) -> String {
    format!("🎵 <b>{}</b>\n⚡ Downloaded via Music Bot", escape(&track.title))
}

pub fn download_failed_text() -> &'static str {
    "❌ <b>Could not download the track</b>\n\n\
     Possible reasons:\n\
     • The track is copyright protected\n\
     • YouTube server issues\n\
     • Connection error\n\n\
     <i>You can open the track on YouTube:</i>"
}

pub fn send_failed_text() -> &'static str {
    "❌ <b>The track was downloaded but could not be sent</b>\n\n<i>You can open it on YouTube:</i>"
}

/// Link card shown when a download can't be delivered
pub fn fallback_keyboard(track: &TrackCandidate) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    if let Some(button) = source_button("🎬 Watch on YouTube", track) {
        rows.push(vec![button]);
    }
    rows.push(vec![callback_button("🔍 New search", &CallbackAction::NewSearch)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn more_tracks_text(query: &str) -> String {
    format!("🔍 <b>Looking for more tracks:</b> <code>{}</code>", escape(query))
}

pub fn stats_text(report: &StatsReport) -> String {
    let mut text = format!(
        "📊 <b>Bot statistics:</b>\n\n\
         • Total downloads: {}\n\
         • Failed downloads: {}\n\
         • Unique users: {}\n\
         • Uptime: {}\n\n\
         <b>Top users:</b>\n",
        report.total_downloads,
        report.failed_downloads,
        report.unique_users,
        format_uptime(report.uptime)
    );
    if report.top_users.is_empty() {
        text.push_str("<i>No users yet</i>\n");
    }
    for (i, user) in report.top_users.iter().enumerate() {
        let name = if user.username.is_empty() {
            user.user_id.0.to_string()
        } else {
            user.username.clone()
        };
        text.push_str(&format!("{}. {}: {}\n", i + 1, escape(&name), user.downloads));
    }
    text
}
