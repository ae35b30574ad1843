use std::sync::Arc;

use anyhow::Result;
use tally::application::AccountingService;
use tally::config::Config;
use tally::http;
use tally::storage::PgLedgerStore;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("Configuration error: {err}");
            return Err(err.into());
        }
    };

    info!("Connecting to ledger store...");
    let store = match PgLedgerStore::connect(&config.database_url, config.store_timeout).await {
        Ok(store) => store,
        Err(err) => {
            error!("Ledger store init error: {err:#}");
            return Err(err);
        }
    };
    store.migrate().await?;

    let service = AccountingService::new(Arc::new(store));
    http::serve(&config, service).await
}
