use crate::dialog::DialogState;
use crate::router::AppState;

use super::{commands::save_task, reply, Incoming};

pub(super) async fn handle_text(state: &AppState, msg: &Incoming) {
    match state.dialogs.get(msg.user_id).await {
        DialogState::AwaitingTaskText => save_task(state, msg, &msg.text).await,
        DialogState::Idle => {
            reply(
                state,
                msg.chat_id,
                "Use /add to create a task or /help to see all commands.",
            )
            .await;
        }
    }
}
