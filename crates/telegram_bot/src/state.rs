use std::{collections::HashMap, sync::Arc};

use teloxide::types::ChatId;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Where a chat currently is inside a multi-step dialogue.
///
/// `Await*Select` states expect a button press, the others expect free text.
/// Selections carry the picked category along so the follow-up message does
/// not have to re-resolve it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum FlowState {
    AwaitCategoryName,
    AwaitCategoryEditSelect,
    AwaitCategoryEditName {
        category_id: Uuid,
    },
    AwaitCategoryDeleteSelect,
    AwaitCategoryDeleteConfirm {
        category_id: Uuid,
        name: String,
    },
    AwaitLimitSelect,
    AwaitLimitAmount {
        category_id: Uuid,
        name: String,
    },
    AwaitExpenseSelect,
    AwaitExpenseAmount {
        category_id: Uuid,
        name: String,
    },
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Session {
    pub state: Option<FlowState>,
}

/// One session per (telegram user, chat) pair.
///
/// `lock` hands out an owned guard on that pair's session, so two updates
/// from the same chat are processed one at a time while other chats stay
/// unaffected.
#[derive(Clone, Default)]
pub(crate) struct SessionStore {
    inner: Arc<Mutex<HashMap<(u64, ChatId), Arc<Mutex<Session>>>>>,
}

impl SessionStore {
    pub(crate) async fn lock(&self, user_id: u64, chat_id: ChatId) -> OwnedMutexGuard<Session> {
        let entry = {
            let mut guard = self.inner.lock().await;
            guard
                .entry((user_id, chat_id))
                .or_insert_with(Arc::default)
                .clone()
        };
        entry.lock_owned().await
    }
}
