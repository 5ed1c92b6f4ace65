use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_SCOPE: &str = "GIGACHAT_API_PERS";
const DEFAULT_TOKEN_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
const DEFAULT_API_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1/chat/completions";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub gigachat: GigaChatConfig,
    pub recruiter_chat_id: i64,
    pub questions_path: Option<PathBuf>,
    pub rust_log: String,
}

/// Everything the reasoning client needs to reach the provider.
#[derive(Clone)]
pub struct GigaChatConfig {
    /// Base64 client credential sent as HTTP basic auth to the token endpoint.
    pub auth: String,
    pub scope: String,
    pub token_url: String,
    pub api_url: String,
    /// The provider's endpoints are signed by a non-public CA.
    pub accept_invalid_certs: bool,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            telegram_bot_token: require_env("TELEGRAM_BOT_TOKEN")?,
            gigachat: GigaChatConfig {
                auth: require_env("GIGACHAT_AUTH")?,
                scope: env_or("GIGACHAT_SCOPE", DEFAULT_SCOPE),
                token_url: env_or("GIGACHAT_TOKEN_URL", DEFAULT_TOKEN_URL),
                api_url: env_or("GIGACHAT_API_URL", DEFAULT_API_URL),
                accept_invalid_certs: parse_bool(&env_or("GIGACHAT_ACCEPT_INVALID_CERTS", "false"))
                    .context("GIGACHAT_ACCEPT_INVALID_CERTS must be true or false")?,
                timeout: Duration::from_secs(
                    env_or("GIGACHAT_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
                        .parse::<u64>()
                        .context("GIGACHAT_TIMEOUT_SECS must be a whole number of seconds")?,
                ),
            },
            recruiter_chat_id: require_env("HR_TELEGRAM_ID")?
                .parse::<i64>()
                .context("HR_TELEGRAM_ID must be a numeric Telegram chat id")?,
            questions_path: std::env::var("QUESTIONS_PATH").ok().map(PathBuf::from),
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_bot_token", &"<redacted>")
            .field("gigachat", &self.gigachat)
            .field("recruiter_chat_id", &self.recruiter_chat_id)
            .field("questions_path", &self.questions_path)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

impl fmt::Debug for GigaChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GigaChatConfig")
            .field("auth", &"<redacted>")
            .field("scope", &self.scope)
            .field("token_url", &self.token_url)
            .field("api_url", &self.api_url)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("unrecognised boolean '{other}'"),
    }
}
