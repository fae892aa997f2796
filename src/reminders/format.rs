use std::fmt;

pub const DEFAULT_PREVIEW_LENGTH: usize = 60;

const ELLIPSIS: &str = "...";
const NO_TEXT: &str = "(no text)";
/// Stands in for a permalink Slack refused to resolve
pub const PLACEHOLDER_LINK: &str = "#";

/// Single-line preview: newlines become spaces, ends are trimmed, and the
/// result is cut to `max_chars` characters with an ellipsis when longer.
pub fn preview(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() > max_chars {
        let mut short: String = cleaned.chars().take(max_chars).collect();
        short.push_str(ELLIPSIS);
        short
    } else {
        cleaned.to_string()
    }
}

/// One tagged message a member still has to react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingItem {
    pub channel_name: String,
    pub preview: String,
    /// `None` when the permalink lookup failed
    pub permalink: Option<String>,
}

impl PendingItem {
    pub fn new(
        channel_name: &str,
        raw_text: Option<&str>,
        permalink: Option<String>,
        preview_length: usize,
    ) -> Self {
        Self {
            channel_name: channel_name.to_string(),
            preview: preview(raw_text.unwrap_or(NO_TEXT), preview_length),
            permalink,
        }
    }

    pub fn link(&self) -> &str {
        self.permalink.as_deref().unwrap_or(PLACEHOLDER_LINK)
    }
}

impl fmt::Display for PendingItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "• [#{}] *{}*\n   👉 {}",
            self.channel_name,
            self.preview,
            self.link()
        )
    }
}
