use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use grid_rooms_backend::app::config::AppConfig;
use grid_rooms_backend::game::registry::RoomRegistry;
use grid_rooms_backend::transport::auth::{Authenticator, InMemoryProfiles};
use grid_rooms_backend::transport::hub::SubscriberHub;
use grid_rooms_backend::transport::routes::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let config = AppConfig::from_env()?;
  tracing::info!(
    grid_size = config.engine.grid_size,
    room_limit = config.engine.room_limit,
    step_ms = config.engine.step_interval.as_millis() as u64,
    bot_ms = config.engine.bot_interval.as_millis() as u64,
    "engine configured"
  );

  let hub = Arc::new(SubscriberHub::new());
  let registry = RoomRegistry::new(config.engine.clone(), hub.clone());
  let state = Arc::new(AppState {
    registry: Arc::clone(&registry),
    hub,
    auth: Authenticator::new(
      config.session_secret.clone(),
      config.session_ttl,
      Box::new(InMemoryProfiles::default()),
    ),
  });

  let app = router(state);

  let address = format!("0.0.0.0:{}", config.port);
  tracing::info!("listening on {address}");

  let listener = tokio::net::TcpListener::bind(&address).await?;
  axum::serve(listener, app)
    .with_graceful_shutdown(wait_for_signal())
    .await?;

  registry.shutdown().await;
  tracing::info!("all rooms closed");
  Ok(())
}

async fn wait_for_signal() {
  #[cfg(unix)]
  {
    use tokio::signal::unix::{signal, SignalKind};
    let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
      tracing::warn!("failed to register SIGTERM handler");
      let _ = tokio::signal::ctrl_c().await;
      return;
    };
    tokio::select! {
      _ = tokio::signal::ctrl_c() => tracing::info!("received SIGINT"),
      _ = sigterm.recv() => tracing::info!("received SIGTERM"),
    }
  }
  #[cfg(not(unix))]
  {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("received Ctrl+C");
  }
}
