mod config;
mod errors;
mod interview;
mod llm_client;
mod store;
mod transport;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Result;
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::interview::controller::InterviewController;
use crate::interview::questions::QuestionBank;
use crate::interview::skip::PhraseSkipDetector;
use crate::interview::state::ConversationId;
use crate::interview::verdict::MarkerClassifier;
use crate::llm_client::GigaChatClient;
use crate::store::InMemoryStore;
use crate::transport::telegram::{self, TelegramMessenger};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting interviewer v{}", env!("CARGO_PKG_VERSION"));

    let bank = match &config.questions_path {
        Some(path) => {
            info!("Loading question bank from {}", path.display());
            QuestionBank::load(path)?
        }
        None => QuestionBank::builtin(),
    };
    info!("Question bank ready: tracks {:?}", bank.names());

    // Initialize LLM client
    let llm = GigaChatClient::new(config.gigachat.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let bot = Bot::new(&config.telegram_bot_token);
    let messenger = Arc::new(TelegramMessenger::new(bot.clone()));

    let controller = Arc::new(InterviewController::new(
        Arc::new(bank),
        Arc::new(InMemoryStore::new()),
        Arc::new(llm),
        messenger,
        Arc::new(PhraseSkipDetector::default()),
        Arc::new(MarkerClassifier::default()),
        ConversationId(config.recruiter_chat_id),
    ));
    info!("Recruiter summaries go to chat {}", config.recruiter_chat_id);

    telegram::run(bot, controller).await;

    Ok(())
}
