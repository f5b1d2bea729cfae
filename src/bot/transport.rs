//! Outbound side of the chat platform
//!
//! Handlers render [`OutgoingMessage`]s and hand them to a [`ChatTransport`],
//! which lets them run against a recording transport in tests.

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, InlineKeyboardMarkup, MessageId, ParseMode};
use tracing::debug;

/// A rendered message ready to be sent or edited in
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    /// Message body
    pub text: String,
    /// How Telegram should parse `text`
    pub parse_mode: Option<ParseMode>,
    /// Buttons attached below the message
    pub keyboard: Option<InlineKeyboardMarkup>,
}

impl OutgoingMessage {
    /// HTML message without buttons
    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parse_mode: Some(ParseMode::Html),
            keyboard: None,
        }
    }

    /// Attaches inline buttons
    #[must_use]
    pub fn with_keyboard(mut self, keyboard: InlineKeyboardMarkup) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Where a handler's answer goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// A new message in the chat
    Send(ChatId),
    /// Replace the text of a message the bot sent earlier
    Edit(ChatId, MessageId),
}

impl Reply {
    /// Chat the answer belongs to
    #[must_use]
    pub const fn chat_id(self) -> ChatId {
        match self {
            Self::Send(chat_id) | Self::Edit(chat_id, _) => chat_id,
        }
    }
}

/// Chat operations the handlers need
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends a new message
    async fn send(&self, chat_id: ChatId, message: OutgoingMessage) -> Result<()>;

    /// Replaces text and buttons of an existing message
    async fn edit(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        message: OutgoingMessage,
    ) -> Result<()>;

    /// Shows the typing indicator
    async fn typing(&self, chat_id: ChatId) -> Result<()>;
}

/// Sends or edits depending on `reply`
///
/// # Errors
///
/// Returns the transport error.
pub async fn deliver(
    transport: &dyn ChatTransport,
    reply: Reply,
    message: OutgoingMessage,
) -> Result<()> {
    match reply {
        Reply::Send(chat_id) => transport.send(chat_id, message).await,
        Reply::Edit(chat_id, message_id) => transport.edit(chat_id, message_id, message).await,
    }
}

/// [`ChatTransport`] over the Telegram Bot API
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    /// Wraps a bot handle
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

const ERROR_NOT_MODIFIED: &str = "message is not modified";

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send(&self, chat_id: ChatId, message: OutgoingMessage) -> Result<()> {
        crate::utils::retry_telegram_operation(|| async {
            let mut req = self.bot.send_message(chat_id, message.text.clone());
            if let Some(pm) = message.parse_mode {
                req = req.parse_mode(pm);
            }
            if let Some(keyboard) = message.keyboard.clone() {
                req = req.reply_markup(keyboard);
            }
            req.await
                .map(|_| ())
                .map_err(|e| anyhow::anyhow!("Telegram send error: {e}"))
        })
        .await
    }

    async fn edit(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        message: OutgoingMessage,
    ) -> Result<()> {
        let mut req = self
            .bot
            .edit_message_text(chat_id, message_id, message.text);
        if let Some(pm) = message.parse_mode {
            req = req.parse_mode(pm);
        }
        if let Some(keyboard) = message.keyboard {
            req = req.reply_markup(keyboard);
        }
        match req.await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains(ERROR_NOT_MODIFIED) => {
                debug!("Message update skipped: {e}");
                Ok(())
            }
            Err(e) => Err(anyhow::anyhow!("Telegram edit error: {e}")),
        }
    }

    async fn typing(&self, chat_id: ChatId) -> Result<()> {
        self.bot
            .send_chat_action(chat_id, ChatAction::Typing)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("Telegram chat action error: {e}"))
    }
}
