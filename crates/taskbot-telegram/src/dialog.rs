use std::collections::HashMap;

use tokio::sync::Mutex;

use taskbot_core::domain::UserId;

/// Where a user is in the add-task dialogue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DialogState {
    #[default]
    Idle,
    AwaitingTaskText,
}

/// Per-user dialogue state. Users without an entry are `Idle`.
#[derive(Default)]
pub struct DialogSessions {
    inner: Mutex<HashMap<UserId, DialogState>>,
}

impl DialogSessions {
    pub async fn get(&self, user_id: UserId) -> DialogState {
        self.inner
            .lock()
            .await
            .get(&user_id)
            .copied()
            .unwrap_or_default()
    }

    pub async fn set(&self, user_id: UserId, state: DialogState) {
        let mut map = self.inner.lock().await;
        match state {
            DialogState::Idle => {
                map.remove(&user_id);
            }
            other => {
                map.insert(user_id, other);
            }
        }
    }

    /// Reset to `Idle`, returning the previous state.
    pub async fn clear(&self, user_id: UserId) -> DialogState {
        self.inner
            .lock()
            .await
            .remove(&user_id)
            .unwrap_or_default()
    }
}
