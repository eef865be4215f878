//! Maps message text to a [`Command`] by testing an ordered pattern list.
//!
//! The first matching pattern wins. Text-bearing forms come before their bare
//! counterparts (`en -> fr: text` before `en -> fr`, `/translate text` before
//! `/translate`). Every pattern is anchored to the whole message.

use anyhow::{Context, Result};
use regex::{Captures, Regex, RegexBuilder};

/// A recognized command with its captured fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// `/translate <text>`
    TranslateText { text: String },
    /// `/translate` or `translate this`, as a reply
    TranslateReply,
    /// `<source> -> <target>: <text>`
    TranslateBetween {
        source: String,
        target: String,
        text: String,
    },
    /// `<source> -> <target>`, as a reply
    TranslateReplyBetween { source: String, target: String },
    /// `detect lang` / `detect language`, as a reply
    DetectLanguage,
    /// `code for <language name>`
    CodeFor { language: String },
    GetValidLangCodes,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::TranslateText { .. } => "translate_text",
            Command::TranslateReply => "translate_reply",
            Command::TranslateBetween { .. } => "translate_between",
            Command::TranslateReplyBetween { .. } => "translate_reply_between",
            Command::DetectLanguage => "detect_language",
            Command::CodeFor { .. } => "code_for",
            Command::GetValidLangCodes => "get_valid_lang_codes",
        }
    }
}

type Builder = fn(&Captures) -> Command;

/// One entry of the priority list; its rank is its position.
struct CommandPattern {
    regex: Regex,
    build: Builder,
}

const BOT_SUFFIX: &str = r"(?:@\w+)?";
const LANG: &str = r"\w{2,3}(?:-\w{2})?";

fn group(caps: &Captures, name: &str) -> String {
    caps.name(name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn entry(source: String, build: Builder) -> (String, Builder) {
    (source, build)
}

fn pattern_table() -> Vec<(String, Builder)> {
    vec![
        entry(format!(r"^/start{BOT_SUFFIX}$"), |_| Command::Start),
        entry(format!(r"^/help{BOT_SUFFIX}$"), |_| Command::Help),
        entry(format!(r"^/translate{BOT_SUFFIX} (?P<text>.+)$"), |c| {
            Command::TranslateText {
                text: group(c, "text"),
            }
        }),
        entry(format!(r"^(?:/translate{BOT_SUFFIX}|translate this)$"), |_| {
            Command::TranslateReply
        }),
        entry(
            format!(r"^(?P<source>{LANG}) (?:->|to) (?P<target>{LANG}):\s{{1,2}}(?P<text>.+)$"),
            |c| Command::TranslateBetween {
                source: group(c, "source"),
                target: group(c, "target"),
                text: group(c, "text"),
            },
        ),
        entry(
            format!(r"^(?P<source>{LANG}) (?:->|to) (?P<target>{LANG})$"),
            |c| Command::TranslateReplyBetween {
                source: group(c, "source"),
                target: group(c, "target"),
            },
        ),
        entry(r"^detect lang(?:uage)?$".to_string(), |_| {
            Command::DetectLanguage
        }),
        entry(r"^code for (?P<language>\w+(?: [()\w]+)*)$".to_string(), |c| {
            Command::CodeFor {
                language: group(c, "language"),
            }
        }),
        entry(format!(r"^/getvalidlangcodes{BOT_SUFFIX}$"), |_| {
            Command::GetValidLangCodes
        }),
    ]
}

pub struct Router {
    patterns: Vec<CommandPattern>,
}

impl Router {
    pub fn new() -> Result<Self> {
        let patterns = pattern_table()
            .into_iter()
            .map(|(source, build)| {
                let regex = RegexBuilder::new(&source)
                    .case_insensitive(true)
                    .dot_matches_new_line(true)
                    .build()
                    .with_context(|| format!("Invalid command pattern: {}", source))?;
                Ok(CommandPattern { regex, build })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// The command of the highest-priority matching pattern, if any.
    pub fn route(&self, text: &str) -> Option<Command> {
        self.patterns
            .iter()
            .find_map(|p| p.regex.captures(text).map(|caps| (p.build)(&caps)))
    }

    #[cfg(test)]
    fn matching_ranks(&self, text: &str) -> Vec<usize> {
        self.patterns
            .iter()
            .enumerate()
            .filter(|(_, p)| p.regex.is_match(text))
            .map(|(rank, _)| rank)
            .collect()
    }
}
