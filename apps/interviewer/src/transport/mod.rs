//! Chat transport seam.
//!
//! The interview logic talks to candidates and the recruiter only through
//! `Messenger`. `telegram` provides the production implementation and the
//! long-polling dispatcher that feeds the controller.

use async_trait::async_trait;
use thiserror::Error;

use crate::interview::state::ConversationId;

pub mod telegram;

/// Telegram rejects messages longer than this many characters.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to send message: {0}")]
    SendFailed(String),
}

/// What to do with the reply keyboard alongside a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Leave whatever keyboard the client currently shows.
    Keep,
    /// Show one button per option, one option per row.
    Menu(Vec<String>),
    Remove,
}

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(
        &self,
        to: ConversationId,
        text: &str,
        keyboard: Keyboard,
    ) -> Result<(), TransportError>;
}

/// Split long messages at line boundaries to respect platform limits.
/// Lengths are counted in characters, and a single over-long line is cut
/// on character boundaries.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count();
        if current_len + line_len + 1 > max_len {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if line_len > max_len {
                let chars: Vec<char> = line.chars().collect();
                for piece in chars.chunks(max_len) {
                    chunks.push(piece.iter().collect());
                }
                continue;
            }
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
