use crate::core::config;

/// Replaces characters that are unsafe in file names.
///
/// Path separators, characters reserved on Windows and control characters
/// become `_`, double quotes become `'`. Leading/trailing whitespace and
/// dots are stripped; an empty result turns into `"unnamed"`.
///
/// # Example
///
/// ```
/// use melodora::core::utils::escape_filename;
///
/// assert_eq!(escape_filename("AC/DC: Live?"), "AC_DC_ Live_");
/// ```
pub fn escape_filename(filename: &str) -> String {
    let mut result = String::with_capacity(filename.len());

    for c in filename.chars() {
        match c {
            '/' | '\\' => result.push('_'),
            ':' | '*' | '?' | '<' | '>' | '|' => result.push('_'),
            '"' => result.push('\''),
            c if c.is_control() => result.push('_'),
            _ => result.push(c),
        }
    }

    let result = result.trim_matches(|c: char| c.is_whitespace() || c == '.');

    if result.is_empty() {
        "unnamed".to_string()
    } else {
        result.to_string()
    }
}

/// Takes at most `max_chars` Unicode scalar values from `text`
pub fn take_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Shortens a track title for a button label.
///
/// Titles longer than the label limit (35) keep their first 32 characters
/// followed by `...`.
pub fn truncate_label(title: &str) -> String {
    let max = config::search::TITLE_LABEL_MAX_CHARS;
    if title.chars().count() > max {
        format!("{}...", take_chars(title, max - 3))
    } else {
        title.to_string()
    }
}

/// File name of the delivered audio: first 30 title characters, escaped, with `.mp3`
pub fn audio_filename(title: &str) -> String {
    let short = take_chars(title, config::download::FILENAME_TITLE_MAX_CHARS);
    format!("{}.mp3", escape_filename(&short))
}

/// Formats a duration in seconds as `m:ss`, or `h:mm:ss` from one hour on
pub fn format_duration_secs(total: u64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

/// Parses a `m:ss` / `h:mm:ss` display string back to seconds
pub fn parse_duration_display(display: &str) -> Option<u32> {
    let mut total: u32 = 0;
    let mut parts = 0;
    for part in display.trim().split(':') {
        let value: u32 = part.parse().ok()?;
        total = total.checked_mul(60)?.checked_add(value)?;
        parts += 1;
    }
    if (2..=3).contains(&parts) {
        Some(total)
    } else {
        None
    }
}

/// Splits `"Artist - Title"` into its parts. Titles without a separator
/// yield `None` as artist.
pub fn split_artist_title(full_title: &str) -> (Option<String>, String) {
    match full_title.split_once(" - ") {
        Some((artist, title)) if !artist.trim().is_empty() && !title.trim().is_empty() => {
            (Some(artist.trim().to_string()), title.trim().to_string())
        }
        _ => (None, full_title.trim().to_string()),
    }
}

/// Formats a view count with thousands separators (`1234567` -> `1,234,567`)
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_filename() {
        assert_eq!(escape_filename("song/name*.mp3"), "song_name_.mp3");
        assert_eq!(escape_filename("say \"hi\""), "say 'hi'");
        assert_eq!(escape_filename("  ...  "), "unnamed");
    }

    #[test]
    fn test_truncate_label_short_title_untouched() {
        assert_eq!(truncate_label("Ed Sheeran - Shape of You"), "Ed Sheeran - Shape of You");
        let exactly_35 = "a".repeat(35);
        assert_eq!(truncate_label(&exactly_35), exactly_35);
    }

    #[test]
    fn test_truncate_label_long_title() {
        let label = truncate_label("Luis Fonsi - Despacito ft. Daddy Yankee");
        assert_eq!(label, "Luis Fonsi - Despacito ft. Daddy...");
        assert_eq!(label.chars().count(), 35);
    }

    #[test]
    fn test_truncate_label_counts_chars_not_bytes() {
        let title = "Кино - Группа крови (Remastered 2019 Edition)";
        let label = truncate_label(title);
        assert_eq!(label.chars().count(), 35);
        assert!(label.ends_with("..."));
    }

    #[test]
    fn test_audio_filename() {
        assert_eq!(
            audio_filename("Rick Astley - Never Gonna Give You Up"),
            "Rick Astley - Never Gonna Give.mp3"
        );
        assert_eq!(audio_filename("AC/DC - Thunderstruck"), "AC_DC - Thunderstruck.mp3");
        assert_eq!(audio_filename(""), "unnamed.mp3");
    }

    #[test]
    fn test_format_duration_secs() {
        assert_eq!(format_duration_secs(0), "0:00");
        assert_eq!(format_duration_secs(212), "3:32");
        assert_eq!(format_duration_secs(3725), "1:02:05");
    }

    #[test]
    fn test_parse_duration_display() {
        assert_eq!(parse_duration_display("3:32"), Some(212));
        assert_eq!(parse_duration_display("1:02:05"), Some(3725));
        assert_eq!(parse_duration_display("N/A"), None);
        assert_eq!(parse_duration_display("42"), None);
    }

    #[test]
    fn test_split_artist_title() {
        assert_eq!(
            split_artist_title("Queen - Bohemian Rhapsody"),
            (Some("Queen".to_string()), "Bohemian Rhapsody".to_string())
        );
        assert_eq!(split_artist_title("Untitled jam"), (None, "Untitled jam".to_string()));
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1234567), "1,234,567");
    }
}
