//! Teller - account balance service
//!
//! Startup order matters: config, logging, store connection, schema
//! provisioning, fallback ledger, pipeline workers, then the gateway.
//! The store must be reachable at startup (provisioning runs against it);
//! outages after that are absorbed by the pipeline's failure paths.

use std::sync::Arc;

use anyhow::Context;

use teller::config::AppConfig;
use teller::fallback::FallbackLedger;
use teller::gateway::{self, state::AppState};
use teller::pipeline;
use teller::store::BalanceStore;
use teller::store::postgres::{Database, PgBalanceStore};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config = AppConfig::load(&env);
    if let Some(port) = get_port_override() {
        config.gateway.port = port;
    }

    let _log_guard = teller::logging::init_logging(&config);
    tracing::info!("starting teller in {env} mode");

    let database_url = config.postgres.database_url();
    let db = Database::connect(&database_url)
        .await
        .context("failed to connect to the balance store")?;
    db.provision_schema()
        .await
        .context("failed to provision the accounts schema")?;
    let db = Arc::new(db);

    let ledger = FallbackLedger::open(&config.fallback_ledger)
        .with_context(|| format!("failed to open fallback ledger {}", config.fallback_ledger))?;

    let store: Arc<dyn BalanceStore> = Arc::new(PgBalanceStore::new(db.clone()));
    let running = pipeline::start(store, ledger, config.gateway.queue_size);
    tracing::info!(
        queue_capacity = config.gateway.queue_size,
        "transaction pipeline started"
    );

    let state = AppState::new(running.teller.clone(), db);
    gateway::run_server(&config.gateway, state).await
}
