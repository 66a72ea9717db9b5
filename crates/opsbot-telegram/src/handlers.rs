use std::sync::Arc;

use teloxide::prelude::*;

use opsbot_core::domain::ChatId;

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text().map(|s| s.to_string()) else {
        return Ok(());
    };

    let chat_id = msg.chat.id.0;
    let user_name = msg
        .from()
        .map(|u| u.full_name())
        .unwrap_or_else(|| "there".to_string());

    // Sequentialize updates per chat.
    let _guard = state.chat_locks.lock_chat(chat_id).await;

    let chat = ChatId(chat_id);
    let outcome = if text.trim_start().starts_with('/') {
        state.dispatcher.handle_command(chat, &user_name, &text).await
    } else {
        state.dispatcher.handle_text(chat, &text).await
    };

    if let Err(e) = outcome {
        tracing::warn!(chat_id, "message handling failed: {e}");
    }

    Ok(())
}
