use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method},
};
use tracing::{debug, error, info};

use crate::error::HookError;
use crate::slack::verify_signature;
use crate::types::{MessageEvent, SlackEnvelope, SlackEvent};
use crate::AppState;

/// Typed in the debug channel to exercise the profile lookup.
pub const DEBUG_TRIGGER: &str = "!test";

pub async fn slack_events_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<String, HookError> {
    if method != Method::POST {
        return Err(HookError::MethodNotAllowed);
    }

    let parsed = match SlackEnvelope::parse(&body) {
        // Endpoint registration handshake, answered before any signature check.
        Ok(SlackEnvelope::UrlVerification { challenge }) => {
            info!("Answering url_verification challenge");
            return Ok(challenge);
        }
        other => other,
    };

    debug!("Running hook");
    debug!("{}", String::from_utf8_lossy(&body));

    verify_signature(
        &state.config.signing_secret,
        header_str(&headers, "x-slack-request-timestamp"),
        header_str(&headers, "x-slack-signature"),
        &body,
    )?;

    let envelope =
        parsed.map_err(|e| HookError::Unhandled(format!("malformed Slack payload: {}", e)))?;

    match envelope {
        SlackEnvelope::EventCallback {
            event: SlackEvent::TeamJoin { user },
        } => handle_team_join(&state, &user.id).await,
        SlackEnvelope::EventCallback {
            event: SlackEvent::Message(message),
        } => handle_message(&state, &message).await,
        _ => {
            error!("Unexpected Slack event");
            error!("{}", String::from_utf8_lossy(&body));
            Err(HookError::UnexpectedEvent)
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

fn join_notice(name: &str, email: &str) -> String {
    format!("A new user has joined! {} ({})", email, name)
}

async fn handle_team_join(state: &AppState, user_id: &str) -> Result<String, HookError> {
    info!("team_join: userid {}", user_id);

    let profile = state.slack.fetch_user_profile(user_id).await?;
    info!("team_join: username {}", profile.name);
    info!("team_join: email {}", profile.email);

    state
        .slack
        .post_message(
            &state.config.admin_channel,
            &join_notice(&profile.name, &profile.email),
        )
        .await?;

    Ok("team_join handled".to_string())
}

async fn handle_message(state: &AppState, message: &MessageEvent) -> Result<String, HookError> {
    let config = &state.config;

    if message.is_trigger(&config.debug_channel_id, DEBUG_TRIGGER) {
        let user_id = message
            .user
            .as_deref()
            .ok_or_else(|| HookError::Unhandled("message event has no user".to_string()))?;
        info!("!test message: userid {}", user_id);

        let profile = state.slack.fetch_user_profile(user_id).await?;
        info!("!test message: username {}", profile.name);
        info!("!test message: email {}", profile.email);

        if config.test_post_to_admins {
            info!("!test message: sending notice to {}", config.admin_channel);
            state
                .slack
                .post_message(
                    &config.admin_channel,
                    &join_notice(&profile.name, &profile.email),
                )
                .await?;
        }
        if config.test_post_to_bots {
            info!("!test message: sending notice to {}", config.bots_channel);
            state
                .slack
                .post_message(&config.bots_channel, &format!("Hello {}", profile.name))
                .await?;
        }
    }

    Ok("message handled".to_string())
}
