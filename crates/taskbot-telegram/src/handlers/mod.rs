//! Telegram update handlers.
//!
//! `handle_message` only converts the teloxide message into an [`Incoming`]
//! value; routing and replies live in [`dispatch`] so they can run against any
//! `MessagingPort`.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::warn;

use taskbot_core::domain::{ChatId, UserId};

use crate::router::AppState;

mod commands;
mod text;

pub use commands::{parse_command, BUTTON_ADD, BUTTON_EXPORT, BUTTON_LIST};

/// A text message from a user, stripped of transport details.
#[derive(Clone, Debug)]
pub struct Incoming {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: String,
    pub text: String,
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        reply(&state, ChatId(msg.chat.id.0), "Only text messages are supported.").await;
        return Ok(());
    };

    let incoming = Incoming {
        chat_id: ChatId(msg.chat.id.0),
        user_id: UserId(user.id.0 as i64),
        username: user
            .username
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        text: text.to_string(),
    };

    dispatch(&state, incoming).await;
    Ok(())
}

/// Route one message: slash commands and keyboard buttons go to the command
/// handlers, everything else is dialogue text.
pub async fn dispatch(state: &AppState, msg: Incoming) {
    if let Some((cmd, arg)) = commands::resolve(&msg.text) {
        commands::handle_command(state, &msg, &cmd, &arg).await;
        return;
    }
    text::handle_text(state, &msg).await;
}

/// Send a reply; delivery failures are logged, never propagated.
pub(crate) async fn reply(state: &AppState, chat_id: ChatId, text: &str) {
    if let Err(e) = state.messenger.send_text(chat_id, text).await {
        state
            .span
            .in_scope(|| warn!(chat_id = chat_id.0, error = %e, "failed to send reply"));
    }
}
