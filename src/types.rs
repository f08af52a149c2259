use serde::Deserialize;
use serde_json::Value;

/// Outer Events API envelope, keyed on `type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEnvelope {
    UrlVerification {
        #[serde(default)]
        challenge: String,
    },
    EventCallback {
        event: SlackEvent,
    },
    #[serde(other)]
    Unsupported,
}

impl SlackEnvelope {
    /// Parses a raw webhook body. Bodies without a string `type` (or an
    /// `event_callback` whose event has none) come back as unsupported rather
    /// than as errors; other structural problems are errors.
    pub fn parse(raw: &[u8]) -> Result<Self, serde_json::Error> {
        let value: Value = match serde_json::from_slice(raw) {
            Ok(value) => value,
            Err(_) => return Ok(Self::Unsupported),
        };

        let tagged = value.get("type").is_some_and(Value::is_string);
        let untagged_event = value.get("type").and_then(Value::as_str) == Some("event_callback")
            && value
                .get("event")
                .is_some_and(|event| !event.get("type").is_some_and(Value::is_string));

        if !tagged {
            return Ok(Self::Unsupported);
        }
        if untagged_event {
            return Ok(Self::EventCallback {
                event: SlackEvent::Unsupported,
            });
        }
        serde_json::from_value(value)
    }
}

/// Inner event of an `event_callback`, keyed on `event.type`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEvent {
    TeamJoin {
        user: JoinedUser,
    },
    Message(MessageEvent),
    #[serde(other)]
    Unsupported,
}

/// `team_join` carries the full user object; only the id is needed.
#[derive(Debug, Deserialize)]
pub struct JoinedUser {
    pub id: String,
}

/// Subtyped messages (edits, joins, bot posts) may omit any of these.
#[derive(Debug, Deserialize)]
pub struct MessageEvent {
    pub channel: Option<String>,
    pub text: Option<String>,
    /// Plain user id here, unlike `team_join`.
    pub user: Option<String>,
}

impl MessageEvent {
    pub fn is_trigger(&self, channel_id: &str, trigger: &str) -> bool {
        self.channel.as_deref() == Some(channel_id) && self.text.as_deref() == Some(trigger)
    }
}
