use tracing::{error, info, warn};

use taskbot_core::{
    domain::UserId,
    export::export_file_name,
    formatting::{format_task_list, split_message},
    messaging::types::ReplyKeyboard,
    Error,
};

use crate::dialog::DialogState;
use crate::router::AppState;

use super::{reply, Incoming};

pub const BUTTON_ADD: &str = "➕ Add task";
pub const BUTTON_LIST: &str = "📋 Task list";
pub const BUTTON_EXPORT: &str = "📊 CSV export";

const GREETING: &str = "Hi! I keep your to-do list.\n\n\
Commands:\n\
/add - add a new task (or /add <text>)\n\
/list - show your tasks\n\
/list_csv - get your tasks as a CSV file\n\
/cancel - stop adding a task";

/// Split `/cmd@botname arg ...` into a lowercase command name and the rest.
pub fn parse_command(text: &str) -> (String, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

/// Map a message to a command: slash commands and reply-keyboard buttons.
pub(super) fn resolve(text: &str) -> Option<(String, String)> {
    if text.trim_start().starts_with('/') {
        return Some(parse_command(text));
    }
    let cmd = match text.trim() {
        BUTTON_ADD => "add",
        BUTTON_LIST => "list",
        BUTTON_EXPORT => "list_csv",
        _ => return None,
    };
    Some((cmd.to_string(), String::new()))
}

fn main_keyboard() -> ReplyKeyboard {
    ReplyKeyboard::one_per_row(&[BUTTON_ADD, BUTTON_LIST, BUTTON_EXPORT])
}

pub(super) async fn handle_command(state: &AppState, msg: &Incoming, cmd: &str, arg: &str) {
    state.span.in_scope(|| {
        info!(
            command = cmd,
            user_id = msg.user_id.0,
            username = %msg.username,
            "command received"
        )
    });

    if !(cmd == "add" && arg.is_empty()) && cmd != "cancel" {
        state.dialogs.clear(msg.user_id).await;
    }

    match cmd {
        "start" | "help" => {
            if let Err(e) = state
                .messenger
                .send_keyboard(msg.chat_id, GREETING, main_keyboard())
                .await
            {
                state
                    .span
                    .in_scope(|| warn!(error = %e, "failed to send greeting"));
            }
        }

        "add" => {
            if arg.is_empty() {
                state
                    .dialogs
                    .set(msg.user_id, DialogState::AwaitingTaskText)
                    .await;
                reply(state, msg.chat_id, "Enter the task text:").await;
            } else {
                save_task(state, msg, arg).await;
            }
        }

        "cancel" => {
            let text = match state.dialogs.clear(msg.user_id).await {
                DialogState::AwaitingTaskText => "Cancelled.",
                DialogState::Idle => "Nothing to cancel.",
            };
            reply(state, msg.chat_id, text).await;
        }

        "list" => list_tasks(state, msg).await,

        "list_csv" => export_csv(state, msg).await,

        _ => {
            let text = format!("Unknown command: /{cmd}. Send /help for the list of commands.");
            reply(state, msg.chat_id, &text).await;
        }
    }
}

/// Store `text` for the sender and report the outcome.
///
/// A validation failure keeps the dialogue where it is so the user can retry;
/// any other failure resets it.
pub(super) async fn save_task(state: &AppState, msg: &Incoming, text: &str) {
    match state.store.add_task(text, msg.user_id).await {
        Ok(task_id) => {
            state.dialogs.clear(msg.user_id).await;
            state.span.in_scope(|| {
                info!(task_id, user_id = msg.user_id.0, "task saved")
            });
            reply(state, msg.chat_id, "Task saved ✅").await;
        }
        Err(e) if e.is_validation() => {
            state.span.in_scope(|| {
                warn!(user_id = msg.user_id.0, error = %e, "rejected task text")
            });
            reply(state, msg.chat_id, &e.to_string()).await;
        }
        Err(e) => {
            log_failure(state, msg.user_id, "add task", &e);
            state.dialogs.clear(msg.user_id).await;
            reply(
                state,
                msg.chat_id,
                "Could not save the task. Please try again later.",
            )
            .await;
        }
    }
}

async fn list_tasks(state: &AppState, msg: &Incoming) {
    let tasks = match state.store.user_tasks(msg.user_id).await {
        Ok(tasks) => tasks,
        Err(e) => {
            log_failure(state, msg.user_id, "list tasks", &e);
            reply(
                state,
                msg.chat_id,
                "Could not load your tasks. Please try again later.",
            )
            .await;
            return;
        }
    };

    if tasks.is_empty() {
        reply(
            state,
            msg.chat_id,
            "You have no tasks yet. Add the first one with /add.",
        )
        .await;
        return;
    }

    let body = format_task_list(&tasks);
    for chunk in split_message(&body, state.message_limit()) {
        reply(state, msg.chat_id, &chunk).await;
    }
}

async fn export_csv(state: &AppState, msg: &Incoming) {
    let tasks = match state.store.user_tasks(msg.user_id).await {
        Ok(tasks) => tasks,
        Err(e) => {
            log_failure(state, msg.user_id, "load tasks for csv", &e);
            reply(
                state,
                msg.chat_id,
                "Could not prepare the CSV file. Please try again later.",
            )
            .await;
            return;
        }
    };

    if tasks.is_empty() {
        reply(
            state,
            msg.chat_id,
            "No tasks to export. Add some with /add.",
        )
        .await;
        return;
    }

    let path = match state
        .exporter
        .write_tasks(&tasks, &export_file_name(msg.user_id))
    {
        Ok(path) => path,
        Err(e) => {
            log_failure(state, msg.user_id, "write csv", &e);
            reply(
                state,
                msg.chat_id,
                "Could not create the CSV file. Please try again later.",
            )
            .await;
            return;
        }
    };

    state.span.in_scope(|| {
        info!(
            user_id = msg.user_id.0,
            path = %path.display(),
            "sending csv export"
        )
    });
    if let Err(e) = state
        .messenger
        .send_document(msg.chat_id, &path, Some("Your tasks in CSV format"))
        .await
    {
        log_failure(state, msg.user_id, "send csv", &e);
        reply(
            state,
            msg.chat_id,
            "Could not send the CSV file. Please try again later.",
        )
        .await;
    }

    if let Err(e) = std::fs::remove_file(&path) {
        state.span.in_scope(|| {
            warn!(path = %path.display(), error = %e, "failed to delete csv export")
        });
    }
}

fn log_failure(state: &AppState, user_id: UserId, action: &str, err: &Error) {
    state
        .span
        .in_scope(|| error!(user_id = user_id.0, action, error = ?err, "operation failed"));
}
