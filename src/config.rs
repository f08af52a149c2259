use thiserror::Error;
use tracing::warn;

pub const DEFAULT_ADMIN_CHANNEL: &str = "#slack-admins";
pub const DEFAULT_DEBUG_CHANNEL_ID: &str = "CGHGPLSF5";
pub const DEFAULT_BOTS_CHANNEL: &str = "#bots";
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a valid u16, got {0:?}")]
    InvalidPort(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub signing_secret: String,
    pub port: u16,
    pub slack_api_base: String,
    pub admin_channel: String,
    pub debug_channel_id: String,
    pub bots_channel: String,
    /// Repost the join notice to the admin channel when `!test` fires.
    pub test_post_to_admins: bool,
    /// Say hello in the bots channel when `!test` fires.
    pub test_post_to_bots: bool,
}

impl Config {
    /// Reads configuration from the process environment, merging `.env` first.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("SLACK_BOT_TOKEN").unwrap_or_else(|| {
            warn!("SLACK_BOT_TOKEN not set - Slack API calls will be rejected");
            String::new()
        });
        let signing_secret = lookup("SLACK_SIGNING_SECRET").unwrap_or_else(|| {
            warn!("SLACK_SIGNING_SECRET not set - signed events will fail verification");
            String::new()
        });

        let port = match lookup("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => 3000,
        };

        let flag = |key: &str| {
            lookup(key)
                .map(|v| v.parse::<bool>().unwrap_or(false))
                .unwrap_or(false)
        };

        Ok(Self {
            bot_token,
            signing_secret,
            port,
            slack_api_base: lookup("SLACK_API_BASE")
                .unwrap_or_else(|| DEFAULT_SLACK_API_BASE.to_string()),
            admin_channel: lookup("ADMIN_CHANNEL")
                .unwrap_or_else(|| DEFAULT_ADMIN_CHANNEL.to_string()),
            debug_channel_id: lookup("DEBUG_CHANNEL_ID")
                .unwrap_or_else(|| DEFAULT_DEBUG_CHANNEL_ID.to_string()),
            bots_channel: lookup("BOTS_CHANNEL")
                .unwrap_or_else(|| DEFAULT_BOTS_CHANNEL.to_string()),
            test_post_to_admins: flag("TEST_POST_TO_ADMINS"),
            test_post_to_bots: flag("TEST_POST_TO_BOTS"),
        })
    }
}
