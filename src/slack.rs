use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Slack rejects requests older than this; so do we.
const MAX_TIMESTAMP_SKEW_SECS: u64 = 300;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("missing x-slack-request-timestamp header")]
    MissingTimestamp,
    #[error("missing x-slack-signature header")]
    MissingSignature,
    #[error("request timestamp is not a number")]
    InvalidTimestamp,
    #[error("request timestamp is outside the allowed window")]
    StaleTimestamp,
    #[error("signature is not of the form v0=<hex>")]
    MalformedSignature,
    #[error("signature mismatch")]
    Mismatch,
}

#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Slack API error: {0}")]
    Api(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
}

/// The slice of the Slack Web API the event handler depends on.
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn fetch_user_profile(&self, user_id: &str) -> Result<UserProfile, SlackApiError>;

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackApiError>;
}

pub struct SlackWebClient {
    bot_token: String,
    api_base: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SlackApiResponse<T> {
    ok: bool,
    error: Option<String>,
    #[serde(flatten)]
    data: T,
}

impl<T> SlackApiResponse<T> {
    fn into_result(self) -> Result<T, SlackApiError> {
        if self.ok {
            Ok(self.data)
        } else {
            Err(SlackApiError::Api(
                self.error.unwrap_or_else(|| "unknown_error".to_string()),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
struct UsersInfo {
    user: Option<SlackUser>,
}

#[derive(Debug, Deserialize)]
struct SlackUser {
    name: String,
    #[serde(default)]
    profile: SlackUserProfile,
}

#[derive(Debug, Default, Deserialize)]
struct SlackUserProfile {
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatPostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

impl SlackWebClient {
    pub fn new(bot_token: String, api_base: String) -> Self {
        Self {
            bot_token,
            api_base: api_base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }
}

#[async_trait]
impl SlackApi for SlackWebClient {
    async fn fetch_user_profile(&self, user_id: &str) -> Result<UserProfile, SlackApiError> {
        let response: SlackApiResponse<UsersInfo> = self
            .client
            .get(self.endpoint("users.info"))
            .header("Authorization", format!("Bearer {}", self.bot_token))
            .query(&[("user", user_id)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let user = response
            .into_result()?
            .user
            .ok_or_else(|| SlackApiError::Api("users.info returned no user".to_string()))?;

        Ok(UserProfile {
            name: user.name,
            email: user.profile.email.unwrap_or_default(),
        })
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), SlackApiError> {
        let payload = ChatPostMessageRequest { channel, text };

        let response: SlackApiResponse<HashMap<String, serde_json::Value>> = self
            .client
            .post(self.endpoint("chat.postMessage"))
            .header("Authorization", format!("Bearer {}", self.bot_token))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response.into_result().map(|_| ())
    }
}

/// Checks a request against Slack's `v0` signing scheme.
pub fn verify_signature(
    signing_secret: &str,
    timestamp: Option<&str>,
    signature: Option<&str>,
    raw_body: &[u8],
) -> Result<(), SignatureError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    verify_signature_at(signing_secret, timestamp, signature, raw_body, now)
}

fn verify_signature_at(
    signing_secret: &str,
    timestamp: Option<&str>,
    signature: Option<&str>,
    raw_body: &[u8],
    now: u64,
) -> Result<(), SignatureError> {
    let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
    let signature = signature.ok_or(SignatureError::MissingSignature)?;

    let ts: u64 = timestamp
        .trim()
        .parse()
        .map_err(|_| SignatureError::InvalidTimestamp)?;
    if now.abs_diff(ts) > MAX_TIMESTAMP_SKEW_SECS {
        return Err(SignatureError::StaleTimestamp);
    }

    let expected = signature
        .strip_prefix("v0=")
        .and_then(|hex_sig| hex::decode(hex_sig).ok())
        .ok_or(SignatureError::MalformedSignature)?;

    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|_| SignatureError::Mismatch)?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(raw_body);

    // verify_slice compares in constant time
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

#[cfg(test)]
pub(crate) fn sign(signing_secret: &str, timestamp: &str, raw_body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes()).unwrap();
    mac.update(format!("v0:{}:", timestamp).as_bytes());
    mac.update(raw_body);
    format!("v0={}", hex::encode(mac.finalize().into_bytes()))
}
