//! Telegram transport using teloxide long polling.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::dptree;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup};
use tracing::{debug, error, info};

use super::{split_message, Keyboard, Messenger, TransportError, MAX_MESSAGE_LENGTH};
use crate::interview::controller::{Inbound, InterviewController};
use crate::interview::state::ConversationId;

pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn reply_markup(keyboard: &Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::Keep => None,
        Keyboard::Menu(options) => {
            let rows = options
                .iter()
                .map(|option| vec![KeyboardButton::new(option.clone())]);
            Some(ReplyMarkup::Keyboard(
                KeyboardMarkup::new(rows).resize_keyboard(),
            ))
        }
        Keyboard::Remove => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(
        &self,
        to: ConversationId,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<(), TransportError> {
        let chunks = split_message(text, MAX_MESSAGE_LENGTH);
        let last = chunks.len().saturating_sub(1);

        for (i, chunk) in chunks.into_iter().enumerate() {
            let mut request = self.bot.send_message(ChatId(to.0), chunk);
            // The keyboard rides on the last chunk so it appears under the full text.
            if i == last {
                if let Some(markup) = reply_markup(&keyboard) {
                    request = request.reply_markup(markup);
                }
            }
            request
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        }

        debug!(conversation = %to, "Message sent");
        Ok(())
    }
}

/// Runs the long-polling loop until Ctrl-C.
///
/// teloxide hands updates from the same chat to the handler one at a time,
/// so each conversation's turns never interleave; different chats run
/// concurrently.
pub async fn run(bot: Bot, controller: Arc<InterviewController>) {
    let handler = Update::filter_message().endpoint(
        |msg: Message, controller: Arc<InterviewController>| async move {
            // Stickers, photos and the like carry no text and are ignored.
            let Some(text) = msg.text() else {
                return Ok::<(), Box<dyn std::error::Error + Send + Sync>>(());
            };

            let id = ConversationId(msg.chat.id.0);
            if let Err(e) = controller.handle(id, Inbound::parse(text)).await {
                error!(conversation = %id, "Failed to process message: {e}");
            }
            Ok(())
        },
    );

    info!("Telegram long polling started");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![controller])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    info!("Telegram long polling stopped");
}
