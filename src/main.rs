mod config;
mod error;
mod handler;
mod slack;
mod types;

use axum::{
    routing::{any, get},
    Router,
};
use config::Config;
use handler::slack_events_handler;
use slack::{SlackApi, SlackWebClient};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
struct AppState {
    slack: Arc<dyn SlackApi>,
    config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slack_event_hook=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    if config.test_post_to_admins || config.test_post_to_bots {
        warn!(
            "!test debug posts enabled (admins: {}, bots: {})",
            config.test_post_to_admins, config.test_post_to_bots
        );
    }

    // One client for the life of the process
    let slack_client = Arc::new(SlackWebClient::new(
        config.bot_token.clone(),
        config.slack_api_base.clone(),
    ));

    let port = config.port;
    let state = AppState {
        slack: slack_client,
        config: Arc::new(config),
    };

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Every method reaches the events handler so non-POST requests get the typed 405 body.
fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/slack/events", any(slack_events_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "ok"
}
