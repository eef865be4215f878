use anyhow::Result;
use tracing::{debug, info};

use crate::format;
use crate::platform::{ChatKind, IncomingMessage, ParseMode, ReplySink, ReplyTarget};
use crate::router::{Command, Router};
use crate::translate::{Gateway, TranslationError, TranslationRequest};

/// Everything a handler needs, built once at startup
pub struct BotContext {
    pub router: Router,
    pub gateway: Gateway,
}

impl BotContext {
    pub fn new(router: Router, gateway: Gateway) -> Self {
        Self { router, gateway }
    }

    /// Route one message and run the matching handler, if any.
    ///
    /// Provider failures are turned into error replies here; only failures
    /// to deliver a reply are returned.
    pub async fn dispatch(&self, msg: &IncomingMessage, replies: &dyn ReplySink) -> Result<()> {
        let Some(command) = self.router.route(&msg.text) else {
            debug!("No command matched");
            return Ok(());
        };

        info!(
            "Dispatching {} (chat: {:?}, reply: {}, from bot: {})",
            command.name(),
            msg.chat_kind,
            msg.is_reply,
            msg.sender_is_bot
        );

        match command {
            Command::Start => {
                replies
                    .send_reply(ReplyTarget::Trigger, format::WELCOME, ParseMode::Plain)
                    .await
            }
            Command::Help => {
                replies
                    .send_reply(ReplyTarget::Trigger, &format::help(), ParseMode::Markdown)
                    .await
            }
            Command::TranslateText { text } => {
                self.translate(TranslationRequest::auto(text), ReplyTarget::Trigger, replies)
                    .await
            }
            Command::TranslateReply => {
                let Some(text) = msg.reply_text() else {
                    return Ok(());
                };
                self.translate(TranslationRequest::auto(text), ReplyTarget::RepliedTo, replies)
                    .await
            }
            Command::TranslateBetween {
                source,
                target,
                text,
            } => {
                self.translate(
                    TranslationRequest::between(text, &source, &target),
                    ReplyTarget::Trigger,
                    replies,
                )
                .await
            }
            Command::TranslateReplyBetween { source, target } => {
                let Some(text) = msg.reply_text() else {
                    return Ok(());
                };
                self.translate(
                    TranslationRequest::between(text, &source, &target),
                    ReplyTarget::RepliedTo,
                    replies,
                )
                .await
            }
            Command::DetectLanguage => {
                let Some(text) = msg.reply_text() else {
                    return Ok(());
                };
                self.detect(text, replies).await
            }
            Command::CodeFor { language } => self.code_for(&language, replies).await,
            Command::GetValidLangCodes => self.valid_lang_codes(msg.chat_kind, replies).await,
        }
    }

    async fn translate(
        &self,
        request: TranslationRequest,
        target: ReplyTarget,
        replies: &dyn ReplySink,
    ) -> Result<()> {
        match self.gateway.translate(&request).await {
            Ok(result) if result.translated_text.trim().is_empty() => {
                debug!("Translation is blank, nothing to send");
                Ok(())
            }
            Ok(result) => {
                replies
                    .send_reply(target, &result.translated_text, ParseMode::Plain)
                    .await
            }
            Err(e) => report_error(e, replies).await,
        }
    }

    async fn detect(&self, text: &str, replies: &dyn ReplySink) -> Result<()> {
        let name = match self.detect_name(text).await {
            Ok(name) => name,
            Err(e) => return report_error(e, replies).await,
        };
        replies
            .send_reply(
                ReplyTarget::RepliedTo,
                &format::detected(&name),
                ParseMode::Markdown,
            )
            .await
    }

    async fn detect_name(&self, text: &str) -> Result<String, TranslationError> {
        let code = self.gateway.detect_language(text).await?;
        self.gateway.language_name(&code).await
    }

    async fn code_for(&self, language: &str, replies: &dyn ReplySink) -> Result<()> {
        let languages = match self.gateway.list_languages().await {
            Ok(languages) => languages,
            Err(e) => return report_error(e, replies).await,
        };

        let needle = language.to_lowercase();
        let found: Vec<_> = languages
            .iter()
            .filter(|lang| lang.display_name.to_lowercase().contains(&needle))
            .collect();

        if found.is_empty() {
            return replies
                .send_reply(ReplyTarget::Trigger, format::NO_MATCH, ParseMode::Plain)
                .await;
        }

        replies
            .send_reply(
                ReplyTarget::Trigger,
                &format::language_list(found),
                ParseMode::Markdown,
            )
            .await
    }

    async fn valid_lang_codes(&self, chat_kind: ChatKind, replies: &dyn ReplySink) -> Result<()> {
        if chat_kind != ChatKind::Private {
            return replies
                .send_reply(ReplyTarget::Trigger, format::PRIVATE_ONLY, ParseMode::Plain)
                .await;
        }

        let languages = match self.gateway.list_languages().await {
            Ok(languages) => languages,
            Err(e) => return report_error(e, replies).await,
        };

        replies
            .send_reply(
                ReplyTarget::Trigger,
                &format::language_list(&languages),
                ParseMode::Markdown,
            )
            .await
    }
}

/// The raw error was already logged by the gateway; the user only sees the
/// message for its kind.
async fn report_error(error: TranslationError, replies: &dyn ReplySink) -> Result<()> {
    info!("Replying with {:?} error", error.kind);
    replies
        .send_reply(
            ReplyTarget::Trigger,
            error.kind.user_message(),
            ParseMode::Markdown,
        )
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::platform::testing::{message, reply, RecordingSink, SentReply};
    use crate::translate::testing::FakeProvider;

    fn context(provider: FakeProvider) -> (BotContext, Arc<FakeProvider>) {
        let provider = Arc::new(provider);
        let gateway = Gateway::new(provider.clone(), Duration::from_secs(5));
        (
            BotContext::new(Router::new().unwrap(), gateway),
            provider,
        )
    }

    async fn run(ctx: &BotContext, msg: IncomingMessage) -> RecordingSink {
        let sink = RecordingSink::default();
        ctx.dispatch(&msg, &sink).await.unwrap();
        sink
    }

    fn sent(target: ReplyTarget, body: &str, mode: ParseMode) -> SentReply {
        SentReply {
            target,
            body: body.to_string(),
            mode,
        }
    }

    #[tokio::test]
    async fn test_start_and_suffixed_start_identical() {
        let (ctx, _) = context(FakeProvider::default());
        let plain = run(&ctx, message("/start")).await.only();
        let suffixed = run(&ctx, message("/start@gtranslatebot")).await.only();
        assert_eq!(plain, suffixed);
        assert_eq!(
            plain,
            sent(ReplyTarget::Trigger, format::WELCOME, ParseMode::Plain)
        );
    }

    #[tokio::test]
    async fn test_help_uses_markdown() {
        let (ctx, provider) = context(FakeProvider::default());
        let help = run(&ctx, message("/help@gtranslatebot")).await.only();
        assert_eq!(help, sent(ReplyTarget::Trigger, &format::help(), ParseMode::Markdown));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_translate_text_auto_detects() {
        let (ctx, provider) = context(FakeProvider {
            translation: Some("Hello world".to_string()),
            ..Default::default()
        });
        let reply = run(&ctx, message("/translate Hola mundo")).await.only();
        assert_eq!(
            reply,
            sent(ReplyTarget::Trigger, "Hello world", ParseMode::Plain)
        );
        assert_eq!(
            provider.requests(),
            vec![TranslationRequest::auto("Hola mundo")]
        );
    }

    #[tokio::test]
    async fn test_translate_this_without_reply_is_silent() {
        let (ctx, provider) = context(FakeProvider::default());
        assert!(run(&ctx, message("translate this")).await.sent().is_empty());
        assert!(run(&ctx, message("/translate")).await.sent().is_empty());
        assert!(run(&ctx, message("en -> fr")).await.sent().is_empty());
        assert!(run(&ctx, message("detect lang")).await.sent().is_empty());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reply_without_text_is_silent() {
        let (ctx, provider) = context(FakeProvider::default());
        let mut msg = reply("translate this", "");
        msg.replied_to_text = None;
        assert!(run(&ctx, msg).await.sent().is_empty());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_translate_this_replies_to_replied_message() {
        let (ctx, provider) = context(FakeProvider::default());
        let out = run(&ctx, reply("/translate@gtranslatebot", "Guten Tag")).await.only();
        assert_eq!(
            out,
            sent(ReplyTarget::RepliedTo, "translated(Guten Tag)", ParseMode::Plain)
        );
        assert_eq!(provider.requests(), vec![TranslationRequest::auto("Guten Tag")]);
    }

    #[tokio::test]
    async fn test_inline_pair_translates_own_text_not_reply() {
        let (ctx, provider) = context(FakeProvider::default());
        let out = run(&ctx, reply("en -> fr: Hello", "something else")).await.only();
        assert_eq!(out.target, ReplyTarget::Trigger);
        assert_eq!(
            provider.requests(),
            vec![TranslationRequest::between("Hello", "en", "fr")]
        );
    }

    #[tokio::test]
    async fn test_reply_pair_translates_replied_text() {
        let (ctx, provider) = context(FakeProvider::default());
        let out = run(&ctx, reply("en -> fr", "Bonjour le monde")).await.only();
        assert_eq!(out.target, ReplyTarget::RepliedTo);
        assert_eq!(
            provider.requests(),
            vec![TranslationRequest::between("Bonjour le monde", "en", "fr")]
        );
    }

    #[tokio::test]
    async fn test_translation_is_unescaped() {
        let (ctx, _) = context(FakeProvider {
            translation: Some("Caf&eacute;".to_string()),
            ..Default::default()
        });
        let out = run(&ctx, message("en to fr: coffee")).await.only();
        assert_eq!(out.body, "Café");
    }

    #[tokio::test]
    async fn test_detect_language_reply() {
        let (ctx, _) = context(FakeProvider {
            detected: Some("es".to_string()),
            ..FakeProvider::with_languages()
        });
        let out = run(&ctx, reply("detect lang", "Hola")).await.only();
        assert_eq!(
            out,
            sent(ReplyTarget::RepliedTo, "*Spanish* detected.", ParseMode::Markdown)
        );
    }

    #[tokio::test]
    async fn test_detect_unknown_code_is_generic_error() {
        let (ctx, _) = context(FakeProvider {
            detected: Some("xx".to_string()),
            ..FakeProvider::with_languages()
        });
        let out = run(&ctx, reply("detect language", "???")).await.only();
        assert_eq!(out.target, ReplyTarget::Trigger);
        assert_eq!(out.body, "Error: an unknown error occurred.");
    }

    #[tokio::test]
    async fn test_code_for_matches_substrings() {
        let (ctx, _) = context(FakeProvider::with_languages());
        let out = run(&ctx, message("code for German")).await.only();
        assert_eq!(
            out,
            sent(
                ReplyTarget::Trigger,
                "German: *de*\nSwiss German: *gsw*",
                ParseMode::Markdown
            )
        );
    }

    #[tokio::test]
    async fn test_code_for_no_match() {
        let (ctx, _) = context(FakeProvider::with_languages());
        let out = run(&ctx, message("code for Klingon")).await.only();
        assert_eq!(out, sent(ReplyTarget::Trigger, format::NO_MATCH, ParseMode::Plain));
    }

    #[tokio::test]
    async fn test_valid_lang_codes_private_only() {
        let (ctx, provider) = context(FakeProvider::with_languages());
        let mut msg = message("/getvalidlangcodes@gtranslatebot");
        msg.chat_kind = ChatKind::Group;

        let out = run(&ctx, msg).await.only();
        assert_eq!(
            out,
            sent(ReplyTarget::Trigger, format::PRIVATE_ONLY, ParseMode::Plain)
        );
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_valid_lang_codes_lists_all() {
        let (ctx, provider) = context(FakeProvider::with_languages());
        let out = run(&ctx, message("/getvalidlangcodes")).await.only();
        assert_eq!(out.body.lines().count(), 5);
        assert!(out.body.starts_with("German: *de*\nEnglish: *en*"));
        assert_eq!(provider.calls(), vec!["list_languages"]);
    }

    #[tokio::test]
    async fn test_provider_errors_are_classified() {
        let cases = [
            (
                "Bad language pair: en|zz (Invalid Value)",
                "Error: bad language pair.",
            ),
            (
                "Invalid Value",
                "Error: invalid language code. Write *code for [language]* to get the language code of a given language.",
            ),
            ("Internal error", "Error: an unknown error occurred."),
        ];

        for (raw, expected) in cases {
            let (ctx, _) = context(FakeProvider {
                error: Some(raw.to_string()),
                ..Default::default()
            });
            let out = run(&ctx, message("en -> zz: Hello")).await.only();
            assert_eq!(out.body, expected);
            assert_eq!(out.target, ReplyTarget::Trigger);
            assert!(!out.body.contains(raw));
        }
    }

    #[tokio::test]
    async fn test_blank_translation_sends_nothing() {
        let (ctx, provider) = context(FakeProvider {
            translation: Some(" ".to_string()),
            ..Default::default()
        });
        assert!(run(&ctx, message("en -> fr:   ")).await.sent().is_empty());
        assert_eq!(
            provider.requests(),
            vec![TranslationRequest::between(" ", "en", "fr")]
        );
    }

    #[tokio::test]
    async fn test_unmatched_text_sends_nothing() {
        let (ctx, provider) = context(FakeProvider::default());
        assert!(run(&ctx, message("just chatting")).await.sent().is_empty());
        assert!(provider.calls().is_empty());
    }
}
