//! Reply texts. Emphasis uses Telegram's legacy Markdown (`*bold*`, `_italic_`).

use crate::translate::LanguageEntry;

pub const WELCOME: &str = "Google Translate Bot started. Use /help for help.";

pub const NO_MATCH: &str = "You either misspelled the language, or it's unsupported.";

pub const PRIVATE_ONLY: &str =
    "This command only works in private chat. Please send the command to me directly.";

const HELP_LINES: [&str; 9] = [
    "Reply to a message with */translate* or *translate this* to translate it.",
    "Reply to a message with e.g. *en -> fr* to translate it into French from English and so on.",
    "Reply to a message with *detect lang* or *detect language* to detect the language of the message.",
    "",
    "Write e.g. *en -> fr: text here* to translate _text here_ into French from English and so on.",
    "Write */translate text here* to translate _text here_ into English (the language will be detected automatically).",
    "Write *code for [language]* to get the language code for the language. e.g. *code for English*",
    "",
    "Tip: *to* can be used as a substitute for *->*, since it's easier to type on mobile devices.",
];

pub fn help() -> String {
    HELP_LINES.join("\n")
}

pub fn detected(display_name: &str) -> String {
    format!("*{}* detected.", display_name)
}

/// `Name: *code*`
pub fn language_line(lang: &LanguageEntry) -> String {
    format!("{}: *{}*", lang.display_name, lang.code)
}

pub fn language_list<'a>(langs: impl IntoIterator<Item = &'a LanguageEntry>) -> String {
    langs
        .into_iter()
        .map(language_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split long messages for Telegram's 4096 char limit, preferring line breaks.
///
/// Telegram rejects blank messages, so whitespace-only chunks are dropped.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        let chunk = text[start..actual_end].trim_matches('\n');
        if !chunk.trim().is_empty() {
            chunks.push(chunk.to_string());
        }
        start = actual_end;
    }

    chunks
}
