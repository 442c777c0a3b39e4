//! Outbound chat messages, behind a trait so flows can run without Telegram.

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: String) -> Result<()>;
}

/// Bot API implementation of [`Messenger`]
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(&self, chat_id: ChatId, text: String) -> Result<()> {
        self.bot.send_message(chat_id, text).await?;
        Ok(())
    }
}
