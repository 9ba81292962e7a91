//! Telegram adapter (teloxide).
//!
//! This crate implements the `taskbot-core` MessagingPort over the Telegram
//! Bot API and hosts the command layer that drives the task store.

use std::{future::IntoFuture, path::Path};

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InputFile, KeyboardButton, KeyboardMarkup},
};

pub mod dialog;
pub mod handlers;
pub mod router;

use taskbot_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{MessagingCapabilities, ReplyKeyboard},
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn call<T, Req>(req: Req) -> Result<T>
    where
        Req: IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Req::IntoFuture: Send,
    {
        req.await.map_err(Self::map_err)
    }

    fn message_ref(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_documents: true,
            supports_reply_keyboards: true,
            max_message_len: 4096,
        }
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = Self::call(
            self.bot
                .send_message(Self::tg_chat(chat_id), text.to_string()),
        )
        .await?;
        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn send_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: ReplyKeyboard,
    ) -> Result<MessageRef> {
        let rows: Vec<Vec<KeyboardButton>> = keyboard
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect())
            .collect();
        let markup = KeyboardMarkup::new(rows);

        let msg = Self::call(
            self.bot
                .send_message(Self::tg_chat(chat_id), text.to_string())
                .reply_markup(markup),
        )
        .await?;
        Ok(Self::message_ref(chat_id, &msg))
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_document(Self::tg_chat(chat_id), InputFile::file(path.to_path_buf()));
        if let Some(c) = caption {
            req = req.caption(c.to_string());
        }
        let msg = Self::call(req).await?;
        Ok(Self::message_ref(chat_id, &msg))
    }
}
