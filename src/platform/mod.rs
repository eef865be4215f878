pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
}

/// A text message received from the chat platform
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// The message text
    pub text: String,
    /// Whether this message replies to another message
    pub is_reply: bool,
    /// Text of the replied-to message, when it has any
    pub replied_to_text: Option<String>,
    pub chat_kind: ChatKind,
    pub sender_is_bot: bool,
}

impl IncomingMessage {
    /// Replied-to text, if the reply-to-text requirement holds.
    pub fn reply_text(&self) -> Option<&str> {
        if !self.is_reply {
            return None;
        }
        self.replied_to_text.as_deref()
    }
}

/// Which message an outbound reply is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyTarget {
    /// The message that triggered the command
    Trigger,
    /// The message the trigger was replying to
    RepliedTo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Plain,
    /// `*bold*` / `_italic_` emphasis markup
    Markdown,
}

/// The "send reply" capability of a platform, bound to one inbound message
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send_reply(&self, target: ReplyTarget, body: &str, mode: ParseMode) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    pub fn message(text: &str) -> IncomingMessage {
        IncomingMessage {
            text: text.to_string(),
            is_reply: false,
            replied_to_text: None,
            chat_kind: ChatKind::Private,
            sender_is_bot: false,
        }
    }

    pub fn reply(text: &str, replied_to: &str) -> IncomingMessage {
        IncomingMessage {
            is_reply: true,
            replied_to_text: Some(replied_to.to_string()),
            ..message(text)
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentReply {
        pub target: ReplyTarget,
        pub body: String,
        pub mode: ParseMode,
    }

    /// Records replies instead of sending them.
    #[derive(Default)]
    pub struct RecordingSink {
        sent: Mutex<Vec<SentReply>>,
    }

    impl RecordingSink {
        pub fn sent(&self) -> Vec<SentReply> {
            self.sent.lock().unwrap().clone()
        }

        pub fn only(&self) -> SentReply {
            let sent = self.sent();
            assert_eq!(sent.len(), 1, "expected exactly one reply, got {:?}", sent);
            sent.into_iter().next().unwrap()
        }
    }

    #[async_trait]
    impl ReplySink for RecordingSink {
        async fn send_reply(&self, target: ReplyTarget, body: &str, mode: ParseMode) -> Result<()> {
            self.sent.lock().unwrap().push(SentReply {
                target,
                body: body.to_string(),
                mode,
            });
            Ok(())
        }
    }
}
