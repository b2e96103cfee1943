//! `Messenger` implementation over the Telegram Bot API.

use async_trait::async_trait;
use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, LinkPreviewOptions, MessageId, ParseMode, ReplyParameters};
use tunecore::download::MediaMetadata;
use tunecore::{ConversationId, MessageRef, Messenger, StatusMessage};
use url::Url;

use crate::telegram::Bot;

/// File paths of a local Bot API server start with its working directory.
const LOCAL_BOT_API_PREFIX: &str = "/var/lib/telegram-bot-api/";

/// Relays pipeline output through one shared bot client.
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn chat(conversation: ConversationId) -> ChatId {
    ChatId(conversation.0)
}

fn no_link_preview() -> LinkPreviewOptions {
    LinkPreviewOptions {
        is_disabled: true,
        url: None,
        prefer_small_media: false,
        prefer_large_media: false,
        show_above_text: false,
    }
}

/// Builds `<base>/file/bot<token>/<file_path>`.
///
/// Paths reported by a local Bot API server are absolute; their server
/// prefix is stripped.
pub fn build_file_url(base: &Url, token: &str, file_path: &str) -> anyhow::Result<Url> {
    let mut url = base.clone();
    let normalized_path = file_path.strip_prefix(LOCAL_BOT_API_PREFIX).unwrap_or(file_path);

    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("BOT_API_URL cannot be a base URL"))?;
        segments.pop_if_empty();
        segments.push("file");
        segments.push(&format!("bot{token}"));
        for seg in normalized_path.split('/') {
            if !seg.is_empty() {
                segments.push(seg);
            }
        }
    }
    Ok(url)
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_message(&self, conversation: ConversationId, text: &str, html: bool) -> anyhow::Result<()> {
        let request = self.bot.send_message(chat(conversation), text);
        if html {
            request.parse_mode(ParseMode::Html).await?;
        } else {
            request.await?;
        }
        Ok(())
    }

    async fn send_listing(&self, conversation: ConversationId, text: &str) -> anyhow::Result<()> {
        self.bot
            .send_message(chat(conversation), text)
            .parse_mode(ParseMode::Html)
            .link_preview_options(no_link_preview())
            .await?;
        Ok(())
    }

    async fn reply_to(
        &self,
        conversation: ConversationId,
        reply_to: Option<MessageRef>,
        text: &str,
    ) -> anyhow::Result<StatusMessage> {
        let mut request = self
            .bot
            .send_message(chat(conversation), text)
            .parse_mode(ParseMode::Html);
        if let Some(original) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(original.0)));
        }
        let sent = request.await?;

        Ok(StatusMessage {
            conversation,
            message: MessageRef(sent.id.0),
        })
    }

    async fn edit_message_text(&self, status: &StatusMessage, text: &str) -> anyhow::Result<()> {
        match self
            .bot
            .edit_message_text(chat(status.conversation), MessageId(status.message.0), text)
            .parse_mode(ParseMode::Html)
            .await
        {
            Ok(_) => Ok(()),
            // Same text as before: nothing to do
            Err(e) if e.to_string().contains("message is not modified") => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_message(&self, status: &StatusMessage) -> anyhow::Result<()> {
        self.bot
            .delete_message(chat(status.conversation), MessageId(status.message.0))
            .await?;
        Ok(())
    }

    async fn send_audio(
        &self,
        conversation: ConversationId,
        path: &Path,
        metadata: &MediaMetadata,
    ) -> anyhow::Result<()> {
        let mut request = self
            .bot
            .send_audio(chat(conversation), InputFile::file(path.to_path_buf()));
        if let Some(title) = &metadata.title {
            request = request.title(title.clone());
        }
        if let Some(performer) = &metadata.performer {
            request = request.performer(performer.clone());
        }
        if metadata.duration_secs > 0 {
            request = request.duration(metadata.duration_secs);
        }
        request.await?;
        Ok(())
    }

    async fn file_download_url(&self, file_id: &str) -> anyhow::Result<Url> {
        let file = self.bot.get_file(FileId(file_id.to_string())).await?;
        log::info!("✅ File info retrieved: size = {} bytes", file.size);

        let base = self.bot.api_url();
        build_file_url(&base, self.bot.token(), &file.path)
    }
}
