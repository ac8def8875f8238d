use std::sync::Arc;

use anyhow::Context;
use fitlog::api::{ApiServer, AppState};
use fitlog::config::AppConfig;
use fitlog::exercises::ExerciseNameCache;
use fitlog::logging;
use tokio_util::sync::CancellationToken;
use wger_client::{CredentialSource, EnvCredentials, TokenAuthenticator, WgerClient, http};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    let _log_guard = logging::init_logging(&config.logging)?;

    // Refuse to start without upstream credentials.
    let credentials: Arc<dyn CredentialSource> = Arc::new(EnvCredentials::new());
    credentials
        .credentials()
        .context("wger credentials are required")?;

    let client = http::build_client(config.wger.request_timeout);
    let authenticator = Arc::new(TokenAuthenticator::new(
        client.clone(),
        config.wger.base_url.clone(),
        credentials,
        config.wger.auth_config(),
    ));
    let wger = Arc::new(WgerClient::new(client, authenticator.clone()));

    // A failed warm-up is not fatal; the first fetch authenticates again.
    if let Err(e) = authenticator.initialize_authentication().await {
        tracing::warn!(error = %e, "Initial wger authentication failed");
    }

    let cache = Arc::new(ExerciseNameCache::with_ttl(wger, config.cache.ttl));

    let cancel_token = CancellationToken::new();
    cache.start_eviction(config.cache.sweep_interval, cancel_token.child_token());

    let state = AppState::new(cache)
        .with_authenticator(authenticator)
        .with_api_keys(config.admin_api_keys.clone());
    let server = ApiServer::with_cancel_token(config.server.clone(), state, cancel_token.clone());

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received");
        cancel_token.cancel();
    });

    tracing::info!(
        base_url = %config.wger.base_url,
        cache_ttl_secs = config.cache.ttl.as_secs(),
        "fitlog initialized successfully"
    );

    server.run().await?;

    Ok(())
}
