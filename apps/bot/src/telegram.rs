//! Telegram long-polling front end.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, UpdateKind};

use crate::session::{self, CB_GET_BALANCE, CB_PARSE_SWAP, Input, Reply, Replier, Services, SessionState};

/// Seconds Telegram holds a getUpdates request open
const POLL_TIMEOUT_SECS: u32 = 10;
const POLL_ERROR_PAUSE: Duration = Duration::from_secs(1);

pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("Parse Swap Tx", CB_PARSE_SWAP),
        InlineKeyboardButton::callback("Get Wallet Balance", CB_GET_BALANCE),
    ]])
}

struct ChatReplier<'a> {
    bot: &'a Bot,
    chat_id: ChatId,
}

#[async_trait]
impl Replier for ChatReplier<'_> {
    async fn send(&self, reply: Reply) -> Result<()> {
        match reply {
            Reply::Plain(text) => {
                self.bot.send_message(self.chat_id, text).await?;
            }
            Reply::Markdown(text) => {
                self.bot
                    .send_message(self.chat_id, text)
                    .parse_mode(ParseMode::MarkdownV2)
                    .await?;
            }
            Reply::Menu(text) => {
                self.bot
                    .send_message(self.chat_id, text)
                    .reply_markup(main_menu())
                    .await?;
            }
        }
        Ok(())
    }
}

/// Map a chat message's text to a controller input.
pub fn text_input(text: &str) -> Input<'_> {
    let command = text.trim().split_whitespace().next().unwrap_or("");
    // "/start@SomeBot" in group chats
    if command == "/start" || command.starts_with("/start@") {
        Input::Start
    } else {
        Input::Text(text)
    }
}

/// Poll updates until Ctrl-C, handling them one at a time.
pub async fn run<S: Services>(bot: Bot, services: S) -> Result<()> {
    let me = bot.get_me().await.context("telegram getMe failed")?;
    info!(
        "bot connected: @{}",
        me.username.as_deref().unwrap_or("unknown")
    );

    let mut sessions: HashMap<ChatId, SessionState> = HashMap::new();
    let mut offset: i32 = 0;

    loop {
        let mut request = bot.get_updates().timeout(POLL_TIMEOUT_SECS);
        if offset > 0 {
            request = request.offset(offset);
        }

        let updates = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                return Ok(());
            }
            res = request.send() => res,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                warn!("getUpdates failed (will retry): {e}");
                tokio::time::sleep(POLL_ERROR_PAUSE).await;
                continue;
            }
        };

        for update in updates {
            offset = update.id.0 as i32 + 1;
            if let Err(e) = handle_update(&bot, &services, &mut sessions, update.kind).await {
                warn!("update handling failed: {e:#}");
            }
        }
    }
}

async fn handle_update<S: Services>(
    bot: &Bot,
    services: &S,
    sessions: &mut HashMap<ChatId, SessionState>,
    kind: UpdateKind,
) -> Result<()> {
    match kind {
        UpdateKind::Message(message) => {
            let Some(text) = message.text() else {
                debug!("ignoring non-text message in chat {}", message.chat.id);
                return Ok(());
            };
            let chat_id = message.chat.id;
            let state = sessions.entry(chat_id).or_default();
            let replier = ChatReplier { bot, chat_id };
            session::handle(state, services, &replier, text_input(text)).await
        }
        UpdateKind::CallbackQuery(query) => {
            bot.answer_callback_query(query.id.clone())
                .await
                .context("answer callback")?;

            let chat_id = query
                .message
                .as_ref()
                .map(|m| m.chat().id)
                .unwrap_or_else(|| ChatId::from(query.from.id));
            let data = query.data.as_deref().unwrap_or("");

            let state = sessions.entry(chat_id).or_default();
            let replier = ChatReplier { bot, chat_id };
            session::handle(state, services, &replier, Input::Callback(data)).await
        }
        _ => Ok(()),
    }
}
