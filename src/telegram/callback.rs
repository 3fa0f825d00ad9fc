//! Inline button payloads
//!
//! Callback data is decoded once at the transport boundary into a
//! `CallbackAction`; handlers never look at raw strings.
//!
//! Wire format:
//! - `select_<id>` - open the detail card of a result
//! - `dl_<id>` - download at the default quality
//! - `dlq_<low|medium|high>_<id>` - download at an explicit quality
//! - `new_search` - drop the result list
//! - `more_tracks` - re-run the last query with a larger limit
//! - `cat_<category>` - browse a category

use crate::download::source::{AudioQuality, Category};

/// Decoded button press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Select(String),
    Download {
        track_id: String,
        /// `None` means the configured default quality
        quality: Option<AudioQuality>,
    },
    NewSearch,
    MoreTracks,
    Category(Category),
}

impl CallbackAction {
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::Select(id) => format!("select_{}", id),
            CallbackAction::Download { track_id, quality: None } => format!("dl_{}", track_id),
            CallbackAction::Download {
                track_id,
                quality: Some(quality),
            } => format!("dlq_{}_{}", quality.as_str(), track_id),
            CallbackAction::NewSearch => "new_search".to_string(),
            CallbackAction::MoreTracks => "more_tracks".to_string(),
            CallbackAction::Category(category) => format!("cat_{}", category.as_str()),
        }
    }

    /// Parses callback data, `None` for anything unknown or with an empty id.
    /// Unknown categories map to `Popular`.
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "new_search" => return Some(CallbackAction::NewSearch),
            "more_tracks" => return Some(CallbackAction::MoreTracks),
            _ => {}
        }

        if let Some(rest) = data.strip_prefix("dlq_") {
            let (quality, id) = rest.split_once('_')?;
            let quality = quality.parse().ok()?;
            return non_empty(id).map(|track_id| CallbackAction::Download {
                track_id,
                quality: Some(quality),
            });
        }
        if let Some(id) = data.strip_prefix("dl_") {
            return non_empty(id).map(|track_id| CallbackAction::Download { track_id, quality: None });
        }
        if let Some(id) = data.strip_prefix("select_") {
            return non_empty(id).map(CallbackAction::Select);
        }
        if let Some(category) = data.strip_prefix("cat_") {
            return Some(CallbackAction::Category(Category::parse_or_popular(category)));
        }
        None
    }

    /// Metrics/log label
    pub fn kind(&self) -> &'static str {
        match self {
            CallbackAction::Select(_) => "select",
            CallbackAction::Download { .. } => "download",
            CallbackAction::NewSearch => "new_search",
            CallbackAction::MoreTracks => "more_tracks",
            CallbackAction::Category(_) => "category",
        }
    }
}

fn non_empty(id: &str) -> Option<String> {
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_known_payloads() {
        assert_eq!(
            CallbackAction::parse("select_dQw4w9WgXcQ"),
            Some(CallbackAction::Select("dQw4w9WgXcQ".into()))
        );
        assert_eq!(
            CallbackAction::parse("dl_uelHwf8o7_U"),
            Some(CallbackAction::Download {
                track_id: "uelHwf8o7_U".into(),
                quality: None
            })
        );
        assert_eq!(
            CallbackAction::parse("dlq_medium_uelHwf8o7_U"),
            Some(CallbackAction::Download {
                track_id: "uelHwf8o7_U".into(),
                quality: Some(AudioQuality::Medium)
            })
        );
        assert_eq!(CallbackAction::parse("new_search"), Some(CallbackAction::NewSearch));
        assert_eq!(CallbackAction::parse("more_tracks"), Some(CallbackAction::MoreTracks));
        assert_eq!(
            CallbackAction::parse("cat_jazz"),
            Some(CallbackAction::Category(Category::Jazz))
        );
    }

    #[test]
    fn test_unknown_category_falls_back_to_popular() {
        assert_eq!(
            CallbackAction::parse("cat_polka"),
            Some(CallbackAction::Category(Category::Popular))
        );
    }

    #[test]
    fn test_rejects_malformed_payloads() {
        assert_eq!(CallbackAction::parse(""), None);
        assert_eq!(CallbackAction::parse("select_"), None);
        assert_eq!(CallbackAction::parse("dl_"), None);
        assert_eq!(CallbackAction::parse("dlq_best_abc"), None);
        assert_eq!(CallbackAction::parse("dlq_high_"), None);
        assert_eq!(CallbackAction::parse("menu:main"), None);
    }

    #[test]
    fn test_encode_matches_wire_format() {
        let action = CallbackAction::Download {
            track_id: "kJQP7kiw5Fk".into(),
            quality: Some(AudioQuality::Low),
        };
        assert_eq!(action.encode(), "dlq_low_kJQP7kiw5Fk");
        assert_eq!(CallbackAction::Category(Category::HipHop).encode(), "cat_hiphop");
        assert_eq!(CallbackAction::parse(&action.encode()), Some(action));
    }
}
