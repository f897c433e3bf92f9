//! Per-chat pending input.
//!
//! Some flows need the next message from a chat (a phone number, a new
//! admin id, a code screenshot). The pending action is kept in memory; a
//! restart simply drops it and the user starts the flow again.

use std::collections::HashMap;

use tokio::sync::Mutex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pending {
    AwaitingNumber,
    AwaitingAdminId,
    AwaitingCodeShot {
        owner: String,
        number: String,
    },
    AwaitingCodeConfirm {
        owner: String,
        number: String,
        file_id: String,
    },
}

#[derive(Default)]
pub struct PendingActions {
    inner: Mutex<HashMap<i64, Pending>>,
}

impl PendingActions {
    pub async fn set(&self, chat_id: i64, pending: Pending) {
        self.inner.lock().await.insert(chat_id, pending);
    }

    /// Removes and returns the chat's pending action, if any.
    pub async fn take(&self, chat_id: i64) -> Option<Pending> {
        self.inner.lock().await.remove(&chat_id)
    }

    pub async fn clear(&self, chat_id: i64) {
        self.inner.lock().await.remove(&chat_id);
    }
}
