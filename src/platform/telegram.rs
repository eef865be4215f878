use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId, ReplyParameters};
use tracing::{error, info, warn};

use crate::format::split_message;
use crate::handlers::BotContext;
use crate::platform::{ChatKind, IncomingMessage, ParseMode, ReplySink, ReplyTarget};

/// Telegram rejects messages longer than 4096 chars
const MAX_MESSAGE_LEN: usize = 4000;

/// Replies to one inbound Telegram message
struct TelegramReplies {
    bot: Bot,
    chat_id: ChatId,
    trigger: MessageId,
    replied_to: Option<MessageId>,
}

#[async_trait]
impl ReplySink for TelegramReplies {
    #[allow(deprecated)] // legacy Markdown keeps the single-asterisk emphasis syntax
    async fn send_reply(&self, target: ReplyTarget, body: &str, mode: ParseMode) -> Result<()> {
        let reply_to = match target {
            ReplyTarget::Trigger => self.trigger,
            ReplyTarget::RepliedTo => self.replied_to.unwrap_or(self.trigger),
        };

        let chunks = split_message(body, MAX_MESSAGE_LEN);
        if chunks.is_empty() {
            warn!("Skipping blank reply in chat {}", self.chat_id);
            return Ok(());
        }

        for chunk in chunks {
            if chunk.trim().is_empty() {
                continue;
            }
            let request = self
                .bot
                .send_message(self.chat_id, chunk)
                .reply_parameters(ReplyParameters::new(reply_to));
            match mode {
                ParseMode::Plain => request.await?,
                ParseMode::Markdown => {
                    request
                        .parse_mode(teloxide::types::ParseMode::Markdown)
                        .await?
                }
            };
        }

        Ok(())
    }
}

fn to_incoming(msg: &Message, text: &str) -> IncomingMessage {
    let replied = msg.reply_to_message();
    IncomingMessage {
        text: text.to_string(),
        is_reply: replied.is_some(),
        replied_to_text: replied.and_then(|r| r.text()).map(str::to_string),
        chat_kind: if msg.chat.is_private() {
            ChatKind::Private
        } else {
            ChatKind::Group
        },
        sender_is_bot: msg.from.as_ref().map(|u| u.is_bot).unwrap_or(false),
    }
}

/// Run the Telegram bot platform until interrupted
pub async fn run(ctx: Arc<BotContext>, bot: Bot) -> Result<()> {
    info!("Starting Telegram platform...");

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![ctx])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Telegram platform stopped");
    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, ctx: Arc<BotContext>) -> ResponseResult<()> {
    let text = match msg.text() {
        Some(t) => t,
        None => return Ok(()),
    };

    info!("Telegram message in chat {}: {}", msg.chat.id, text);

    let incoming = to_incoming(&msg, text);
    let replies = TelegramReplies {
        bot,
        chat_id: msg.chat.id,
        trigger: msg.id,
        replied_to: msg.reply_to_message().map(|r| r.id),
    };

    // A failed message never stops the dispatcher
    if let Err(e) = ctx.dispatch(&incoming, &replies).await {
        error!("Failed to handle message in chat {}: {:#}", msg.chat.id, e);
    }

    Ok(())
}
