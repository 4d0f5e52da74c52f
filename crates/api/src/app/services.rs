//! Service wiring: store selection, schema, seed data and the audit writer.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use orgadmin_infra::{
    AuditLogger, AuditStore, DirectoryStore, InMemoryAuditStore, InMemoryDirectory,
    PostgresAuditStore, PostgresDirectory, SeedReport, migrate, seed,
};

use crate::config::AppConfig;
use crate::context::AppState;

const MAX_DB_CONNECTIONS: u32 = 10;

pub struct Services {
    pub state: AppState,
    /// Present when seeding ran at startup.
    pub seed: Option<SeedReport>,
    pub audit_writer: JoinHandle<()>,
}

/// Postgres when `DATABASE_URL` is set, in-memory stores otherwise.
pub async fn build_services(config: AppConfig) -> anyhow::Result<Services> {
    let (directory, audit_store): (Arc<dyn DirectoryStore>, Arc<dyn AuditStore>) =
        match &config.database_url {
            Some(url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(MAX_DB_CONNECTIONS)
                    .connect(url)
                    .await
                    .context("failed to connect to Postgres")?;
                migrate(&pool).await.context("failed to apply migrations")?;
                info!("using Postgres stores");
                (
                    Arc::new(PostgresDirectory::new(pool.clone())),
                    Arc::new(PostgresAuditStore::new(pool)),
                )
            }
            None => {
                warn!("DATABASE_URL not set; using in-memory stores");
                (
                    Arc::new(InMemoryDirectory::new()),
                    Arc::new(InMemoryAuditStore::new()),
                )
            }
        };

    let seed = if config.seed_on_start {
        Some(seed(directory.as_ref()).await.context("failed to seed")?)
    } else {
        None
    };

    let (audit, audit_writer) = AuditLogger::spawn(audit_store.clone());
    Ok(Services {
        state: AppState::new(config, directory, audit_store, audit),
        seed,
        audit_writer,
    })
}
