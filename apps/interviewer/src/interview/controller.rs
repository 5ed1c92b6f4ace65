//! Interview Controller — the conversation state machine.
//!
//! ```text
//! AwaitingName → ChoosingTrack → AskingQuestion ⇄ Clarifying → (summarized)
//! ```
//!
//! Each inbound message is one turn: load the conversation's state, run the
//! handler for its phase, then save (or clear) the state. A summarized
//! interview has no stored state; clearing it is the terminal step. Handlers take the
//! conversation id and state explicitly; nothing is kept between turns except
//! what the store holds.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::errors::BotError;
use crate::interview::prompts::review_instruction;
use crate::interview::questions::{QuestionBank, Track};
use crate::interview::skip::SkipDetector;
use crate::interview::state::{ConversationId, ConversationState, Phase};
use crate::interview::summarizer::Summarizer;
use crate::interview::verdict::ReplyClassifier;
use crate::llm_client::{ChatMessage, Reasoner};
use crate::store::ConversationStore;
use crate::transport::{Keyboard, Messenger};

pub const GREETING: &str = "Привет! Я HR-бот. Время прохождения тестирования займет 5 минут. \
Для начала, пожалуйста, напишите ваши ФИО:";
pub const NAME_RULES: &str =
    "Пожалуйста, введите ваши фамилию, имя и (при наличии) отчество полностью.";
pub const TRACK_PROMPT: &str = "Спасибо! Теперь выберите направление собеседования:";
pub const UNKNOWN_TRACK: &str = "Пожалуйста, выберите направление с помощью кнопок ниже:";
pub const START_HINT: &str = "Чтобы начать собеседование, отправьте команду /start.";
pub const FINISHED_HINT: &str =
    "Собеседование уже завершено. Чтобы пройти его заново, отправьте команду /start.";

/// A message from the candidate, already classified by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Start,
    Text(String),
}

impl Inbound {
    /// `/start`, optionally addressed as `/start@bot_name`, is the start trigger.
    /// Anything after the command is ignored.
    pub fn parse(text: &str) -> Self {
        let command = text.split_whitespace().next().unwrap_or_default();
        let command = command.split('@').next().unwrap_or_default();
        if command == "/start" {
            Inbound::Start
        } else {
            Inbound::Text(text.to_string())
        }
    }
}

/// Result of a successfully handled turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turn {
    /// Keep the state for the next message.
    Continue,
    /// Interview delivered; drop the state.
    Finished,
}

pub struct InterviewController {
    bank: Arc<QuestionBank>,
    store: Arc<dyn ConversationStore>,
    reasoner: Arc<dyn Reasoner>,
    messenger: Arc<dyn Messenger>,
    skip: Arc<dyn SkipDetector>,
    classifier: Arc<dyn ReplyClassifier>,
    summarizer: Summarizer,
}

impl InterviewController {
    pub fn new(
        bank: Arc<QuestionBank>,
        store: Arc<dyn ConversationStore>,
        reasoner: Arc<dyn Reasoner>,
        messenger: Arc<dyn Messenger>,
        skip: Arc<dyn SkipDetector>,
        classifier: Arc<dyn ReplyClassifier>,
        recruiter: ConversationId,
    ) -> Self {
        let summarizer = Summarizer::new(reasoner.clone(), messenger.clone(), recruiter);
        Self {
            bank,
            store,
            reasoner,
            messenger,
            skip,
            classifier,
            summarizer,
        }
    }

    /// Processes one inbound message to completion.
    ///
    /// Reasoning and validation failures are reported to the candidate and
    /// swallowed; only transport failures are returned.
    pub async fn handle(&self, id: ConversationId, inbound: Inbound) -> Result<(), BotError> {
        let text = match inbound {
            Inbound::Start => return self.start(id).await,
            Inbound::Text(text) => text,
        };

        let Some(mut state) = self.store.load(id).await else {
            self.messenger.send(id, START_HINT, Keyboard::Keep).await?;
            return Ok(());
        };

        let outcome = self.on_text(id, &mut state, &text).await;

        match outcome {
            Ok(Turn::Finished) => {
                self.store.remove(id).await;
                Ok(())
            }
            Ok(Turn::Continue) => {
                self.store.save(id, state).await;
                Ok(())
            }
            Err(err) if err.is_user_facing() => {
                match &err {
                    BotError::Validation(_) => {
                        info!(conversation = %id, "Rejected input: {err}")
                    }
                    _ => error!(conversation = %id, phase = ?state.phase(), "Turn failed: {err}"),
                }
                self.store.save(id, state).await;
                self.messenger
                    .send(id, &err.user_message(), Keyboard::Keep)
                    .await?;
                Ok(())
            }
            Err(err) => {
                self.store.save(id, state).await;
                Err(err)
            }
        }
    }

    /// Hard reset: whatever the conversation was doing, start over.
    async fn start(&self, id: ConversationId) -> Result<(), BotError> {
        info!(conversation = %id, "Interview started");
        self.store.save(id, ConversationState::new()).await;
        self.messenger.send(id, GREETING, Keyboard::Remove).await?;
        Ok(())
    }

    async fn on_text(
        &self,
        id: ConversationId,
        state: &mut ConversationState,
        text: &str,
    ) -> Result<Turn, BotError> {
        match state.phase() {
            Phase::AwaitingName => self.on_name(id, state, text).await,
            Phase::ChoosingTrack => self.on_track(id, state, text).await,
            Phase::AskingQuestion | Phase::Clarifying => self.on_answer(id, state, text).await,
        }
    }

    async fn on_name(
        &self,
        id: ConversationId,
        state: &mut ConversationState,
        text: &str,
    ) -> Result<Turn, BotError> {
        let name = text.trim();
        if !is_full_name(name) {
            return Err(BotError::Validation(NAME_RULES.to_string()));
        }

        state.set_full_name(name.to_string());
        info!(conversation = %id, "Candidate name recorded");
        self.messenger
            .send(id, TRACK_PROMPT, Keyboard::Menu(self.bank.names()))
            .await?;
        Ok(Turn::Continue)
    }

    async fn on_track(
        &self,
        id: ConversationId,
        state: &mut ConversationState,
        text: &str,
    ) -> Result<Turn, BotError> {
        let Some(track) = self.bank.get(text) else {
            self.messenger
                .send(id, UNKNOWN_TRACK, Keyboard::Menu(self.bank.names()))
                .await?;
            return Ok(Turn::Continue);
        };

        state.begin_track(track.name.clone());
        info!(conversation = %id, track = %track.name, "Track selected");
        self.messenger
            .send(
                id,
                &format!(
                    "Отлично! Начинаем интервью по направлению: {}. Желаем удачи!",
                    track.name
                ),
                Keyboard::Remove,
            )
            .await?;
        self.ask_next(id, state, track).await
    }

    /// Puts the next question to the candidate, or summarizes once the
    /// track's questions are exhausted.
    async fn ask_next(
        &self,
        id: ConversationId,
        state: &mut ConversationState,
        track: &Track,
    ) -> Result<Turn, BotError> {
        match track.questions.get(state.question_index()) {
            Some(question) => {
                // The state must describe the new question even if the send fails.
                state.question_asked();
                self.messenger.send(id, question, Keyboard::Keep).await?;
                Ok(Turn::Continue)
            }
            None => {
                self.summarizer.summarize(id, state).await?;
                info!(conversation = %id, "Interview finished");
                Ok(Turn::Finished)
            }
        }
    }

    async fn on_answer(
        &self,
        id: ConversationId,
        state: &mut ConversationState,
        text: &str,
    ) -> Result<Turn, BotError> {
        let Some(track) = state.track().and_then(|name| self.bank.get(name)) else {
            warn!(conversation = %id, "Conversation has no known track; asking for a restart");
            self.messenger.send(id, START_HINT, Keyboard::Keep).await?;
            return Ok(Turn::Continue);
        };

        // Questions exhausted but the summary failed earlier: only /start recovers.
        let Some(question) = track.questions.get(state.question_index()) else {
            self.messenger.send(id, FINISHED_HINT, Keyboard::Keep).await?;
            return Ok(Turn::Continue);
        };

        if self.skip.is_skip(text) {
            info!(conversation = %id, question = state.question_index(), "Answer skipped");
            state.accept_answer(question.clone(), text.to_string());
            return self.ask_next(id, state, track).await;
        }

        let messages = [
            ChatMessage::system(review_instruction(state.phase(), &track.name, question)),
            ChatMessage::user(text),
        ];
        let reply = self.reasoner.complete(&messages).await?;

        if self.classifier.is_accepted(&reply) || state.clarifications_exhausted() {
            info!(
                conversation = %id,
                question = state.question_index(),
                clarifications = state.clarification_count(),
                "Answer accepted"
            );
            state.accept_answer(question.clone(), text.to_string());
            return self.ask_next(id, state, track).await;
        }

        info!(conversation = %id, question = state.question_index(), "Asking a follow-up");
        self.messenger.send(id, &reply, Keyboard::Keep).await?;
        state.begin_clarification();
        Ok(Turn::Continue)
    }
}

/// At least two whitespace-separated words, each longer than one character.
fn is_full_name(name: &str) -> bool {
    let words: Vec<&str> = name.split_whitespace().collect();
    words.len() >= 2 && words.iter().all(|w| w.chars().count() > 1)
}
