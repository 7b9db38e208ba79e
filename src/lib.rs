pub mod api;
pub mod config;
pub mod core;
pub mod guard;

pub use config::Config;
pub use core::{GuardService, SessionHandle};
pub use guard::{GuardApi, GuardClient, GuardError};

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Build the action service: one client, one session actor, one poller
pub fn build_service(config: &Config, shutdown: CancellationToken) -> Result<GuardService> {
    let client = GuardClient::new(&config.guard).context("Failed to build Altura API client")?;
    tracing::info!("Altura API client initialized: {}", client.api_base());
    if config.guard.api_key.is_none() {
        tracing::warn!("No Altura API key configured; pairing requests will be unauthenticated");
    }

    let api: Arc<dyn GuardApi> = Arc::new(client);
    Ok(service_with_api(config, api, shutdown))
}

/// Same as [`build_service`] with a caller-supplied API implementation
pub fn service_with_api(
    config: &Config,
    api: Arc<dyn GuardApi>,
    shutdown: CancellationToken,
) -> GuardService {
    let sessions = SessionHandle::spawn(
        api.clone(),
        Duration::from_secs(config.session.liveness_interval_secs),
        shutdown,
    );
    let poller = guard::Poller::new(api.clone(), guard::PollPolicy::from(&config.poll));
    GuardService::new(api, sessions, poller, config.demo.clone())
}

pub async fn run(config: Config) -> Result<()> {
    tracing::info!("Starting guardrelay...");

    let shutdown = CancellationToken::new();
    let service = build_service(&config, shutdown.clone())?;

    if !config.api.enabled {
        tracing::warn!("Relay API disabled in config; nothing to serve");
        return Ok(());
    }

    let relay = api::RelayServer::new(
        service,
        config.api.host.clone(),
        config.api.port,
        config.api.tokens.clone(),
    );

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested");
                shutdown.cancel();
            }
        });
    }

    relay.start(shutdown.clone()).await?;
    shutdown.cancel();

    tracing::info!("guardrelay stopped");
    Ok(())
}
