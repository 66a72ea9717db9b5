//! Per-conversation session state.
//!
//! `Idle` is represented by absence: a map entry exists only while a
//! multi-step flow is in progress, is created on the flow's entry command and
//! removed on every terminal transition (completion, cancellation, or an
//! unrelated command abandoning the flow).

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::ChatId;

/// Which multi-step flow is active, plus any findings pending confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    AwaitingEmailText,
    AwaitingEmailConfirm { findings: Vec<String> },
    AwaitingPhoneText,
    AwaitingPhoneConfirm { findings: Vec<String> },
    AwaitingPassword,
    AwaitingAptPackage,
}

/// Managed session map keyed by chat id. At most one session per chat.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<i64, Flow>>,
}

impl SessionStore {
    /// Enter (or replace) the flow for a chat.
    pub async fn begin(&self, chat_id: ChatId, flow: Flow) {
        self.inner.lock().await.insert(chat_id.0, flow);
    }

    /// Remove and return the active flow. The dispatcher re-inserts via
    /// [`begin`](Self::begin) when the next state is non-terminal, so a flow
    /// that is not re-entered is gone.
    pub async fn take(&self, chat_id: ChatId) -> Option<Flow> {
        self.inner.lock().await.remove(&chat_id.0)
    }

    /// Abandon any in-flight flow for a chat.
    pub async fn clear(&self, chat_id: ChatId) {
        self.inner.lock().await.remove(&chat_id.0);
    }

    pub async fn is_active(&self, chat_id: ChatId) -> bool {
        self.inner.lock().await.contains_key(&chat_id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn take_removes_the_session() {
        let store = SessionStore::default();
        let chat = ChatId(7);

        store.begin(chat, Flow::AwaitingPassword).await;
        assert!(store.is_active(chat).await);

        assert_eq!(store.take(chat).await, Some(Flow::AwaitingPassword));
        assert!(!store.is_active(chat).await);
        assert_eq!(store.take(chat).await, None);
    }

    #[tokio::test]
    async fn sessions_are_independent_per_chat() {
        let store = SessionStore::default();
        store.begin(ChatId(1), Flow::AwaitingEmailText).await;
        store.begin(ChatId(2), Flow::AwaitingAptPackage).await;

        store.clear(ChatId(1)).await;
        assert!(!store.is_active(ChatId(1)).await);
        assert!(store.is_active(ChatId(2)).await);
    }

    #[tokio::test]
    async fn begin_replaces_the_previous_flow() {
        let store = SessionStore::default();
        let chat = ChatId(3);
        store
            .begin(
                chat,
                Flow::AwaitingEmailConfirm {
                    findings: vec!["a@b.io".to_string()],
                },
            )
            .await;
        store.begin(chat, Flow::AwaitingPhoneText).await;

        assert_eq!(store.take(chat).await, Some(Flow::AwaitingPhoneText));
    }
}
