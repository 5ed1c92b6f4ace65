use serde::{Deserialize, Serialize};

/// At most this many follow-up questions are asked per main question.
pub const MAX_CLARIFICATIONS: u8 = 1;

/// Identifies one conversation with one candidate (the Telegram chat id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub i64);

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    AwaitingName,
    ChoosingTrack,
    AskingQuestion,
    Clarifying,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: String,
}

/// Per-candidate interview progress.
///
/// Fields are private so the invariants hold by construction:
/// - `full_name` and `track` are written once;
/// - `collected_answers.len() == question_index` after every mutation;
/// - `clarification_count` never exceeds `MAX_CLARIFICATIONS` and is reset
///   whenever a new question is asked.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConversationState {
    phase: Phase,
    full_name: Option<String>,
    track: Option<String>,
    question_index: usize,
    collected_answers: Vec<AnswerRecord>,
    clarification_count: u8,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    pub fn track(&self) -> Option<&str> {
        self.track.as_deref()
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn collected_answers(&self) -> &[AnswerRecord] {
        &self.collected_answers
    }

    pub fn clarification_count(&self) -> u8 {
        self.clarification_count
    }

    /// Records the candidate's name and moves on to track selection.
    /// Returns `false` and leaves the state untouched if a name is already set.
    pub fn set_full_name(&mut self, name: String) -> bool {
        if self.full_name.is_some() {
            return false;
        }
        self.full_name = Some(name);
        self.phase = Phase::ChoosingTrack;
        true
    }

    /// Starts the question loop for `track` from the first question.
    /// Returns `false` if a track was already chosen.
    pub fn begin_track(&mut self, track: String) -> bool {
        if self.track.is_some() {
            return false;
        }
        self.track = Some(track);
        self.question_index = 0;
        self.collected_answers.clear();
        self.clarification_count = 0;
        true
    }

    /// Marks that the question at `question_index` has just been put to the candidate.
    pub fn question_asked(&mut self) {
        self.clarification_count = 0;
        self.phase = Phase::AskingQuestion;
    }

    /// Stores the answer to the current question and advances to the next one.
    pub fn accept_answer(&mut self, question: String, answer: String) {
        self.collected_answers.push(AnswerRecord { question, answer });
        self.question_index += 1;
        self.clarification_count = 0;
    }

    pub fn clarifications_exhausted(&self) -> bool {
        self.clarification_count >= MAX_CLARIFICATIONS
    }

    /// Records that a follow-up question was sent for the current question.
    pub fn begin_clarification(&mut self) {
        self.clarification_count = (self.clarification_count + 1).min(MAX_CLARIFICATIONS);
        self.phase = Phase::Clarifying;
    }
}
