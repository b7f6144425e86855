// storefront/src/main.rs

use std::sync::Arc;
use storefront::config::{AppConfig, LogFormat};
use storefront::{seed, AppState, PgStore};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter) // RUST_LOG overrides the default level
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let config = Arc::new(AppConfig::from_env()?);
  init_tracing(config.log_format);
  tracing::info!(max_connections = config.db_max_connections, "Starting storefront...");

  let store = Arc::new(PgStore::connect(&config.database_url, config.db_max_connections).await?);
  if config.apply_schema {
    store.apply_schema().await?;
  }

  let state = AppState::new(Arc::clone(&store), Arc::clone(&config));

  if state.accounts.ensure_default_admin(&config.admin).await? {
    tracing::warn!(username = %config.admin.username, "Default admin created; change its password.");
  }

  if config.seed_db {
    seed::seed_catalog(&state.catalog).await?;
  }

  let products = state.catalog.list_products().await?;
  tracing::info!(count = products.len(), "Storefront ready.");
  println!("{}", serde_json::to_string_pretty(&products)?);
  Ok(())
}
