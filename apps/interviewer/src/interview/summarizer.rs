//! Summarizer — turns the finished transcript into a recruiter report.
//!
//! One reasoning call per interview. On success the recruiter receives a
//! single message and only then is the candidate thanked; on failure nobody
//! but the candidate hears about it and the caller keeps the state.

use std::sync::Arc;

use tracing::{error, info};

use crate::errors::BotError;
use crate::interview::prompts::{summary_instruction, transcript};
use crate::interview::state::{ConversationId, ConversationState};
use crate::llm_client::{ChatMessage, Reasoner};
use crate::transport::{Keyboard, Messenger};

pub const COMPLETION_NOTICE: &str = "Спасибо за интервью! Ваши ответы отправлены HR.";
const UNKNOWN_NAME: &str = "Не указано";

pub struct Summarizer {
    reasoner: Arc<dyn Reasoner>,
    messenger: Arc<dyn Messenger>,
    recruiter: ConversationId,
}

impl Summarizer {
    pub fn new(
        reasoner: Arc<dyn Reasoner>,
        messenger: Arc<dyn Messenger>,
        recruiter: ConversationId,
    ) -> Self {
        Self {
            reasoner,
            messenger,
            recruiter,
        }
    }

    pub async fn summarize(
        &self,
        id: ConversationId,
        state: &ConversationState,
    ) -> Result<(), BotError> {
        let full_name = state.full_name().unwrap_or(UNKNOWN_NAME);
        let track = state.track().unwrap_or_default();

        let messages = [
            ChatMessage::system(summary_instruction(track, full_name)),
            ChatMessage::user(transcript(state.collected_answers())),
        ];

        let summary = self.reasoner.complete(&messages).await.map_err(|e| {
            error!(conversation = %id, "Summary generation failed: {e}");
            BotError::Summary(e)
        })?;

        self.messenger
            .send(
                self.recruiter,
                &recruiter_report(full_name, track, &summary),
                Keyboard::Keep,
            )
            .await
            .map_err(|e| {
                error!(conversation = %id, "Recruiter report not delivered: {e}");
                e
            })?;
        self.messenger
            .send(id, COMPLETION_NOTICE, Keyboard::Remove)
            .await?;

        info!(
            conversation = %id,
            answers = state.collected_answers().len(),
            "Interview summary delivered to recruiter"
        );
        Ok(())
    }
}

fn recruiter_report(full_name: &str, track: &str, summary: &str) -> String {
    format!("Резюме по кандидату\nФИО: {full_name}\nНаправление: {track}\n\n{summary}")
}
