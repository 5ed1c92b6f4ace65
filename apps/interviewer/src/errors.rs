use thiserror::Error;

use crate::llm_client::LlmError;
use crate::transport::TransportError;

/// Application-level error type.
/// Every turn of the interview returns `Result<_, BotError>`; the controller
/// turns the user-facing variants into a chat reply via `user_message`.
#[derive(Debug, Error)]
pub enum BotError {
    /// Malformed candidate input. Recovered by re-prompting; state is unchanged.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Reasoning service authentication failed: {0}")]
    Auth(LlmError),

    #[error("Reasoning service error: {0}")]
    Service(LlmError),

    /// The final summary could not be produced. The recruiter is not contacted.
    #[error("Summary generation failed: {0}")]
    Summary(LlmError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

impl From<LlmError> for BotError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Auth { .. } => BotError::Auth(err),
            other => BotError::Service(other),
        }
    }
}

impl BotError {
    /// Whether the candidate should see this error as a chat reply.
    /// Transport failures cannot be reported over the transport that failed.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, BotError::Transport(_))
    }

    /// Text sent to the candidate. Provider errors are passed through verbatim.
    pub fn user_message(&self) -> String {
        match self {
            BotError::Validation(msg) => msg.clone(),
            BotError::Auth(e) | BotError::Service(e) => format!("Ошибка AI: {e}"),
            BotError::Summary(e) => format!("Ошибка AI при формировании резюме: {e}"),
            BotError::Transport(e) => format!("Ошибка отправки сообщения: {e}"),
        }
    }
}
