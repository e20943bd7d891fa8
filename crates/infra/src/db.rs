//! Postgres pool construction and schema bootstrap.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::store::postgres::map_sqlx_error;
use crate::store::StoreResult;

/// Bundled DDL. Every statement is `IF NOT EXISTS`, so it is safe to run on
/// each startup.
pub const SCHEMA: &str = include_str!("../migrations/0001_catalog.sql");

/// Connection options for the configured database.
///
/// With TLS enabled the client certificate and CA bundle are presented, but
/// the server certificate and hostname are not verified (`sslmode=require`).
pub fn connect_options(cfg: &DatabaseConfig) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.user)
        .password(&cfg.password)
        .database(&cfg.name);

    match &cfg.tls {
        Some(tls) => options
            .ssl_mode(PgSslMode::Require)
            .ssl_root_cert(&tls.ca)
            .ssl_client_cert(&tls.cert)
            .ssl_client_key(&tls.key),
        None => options.ssl_mode(PgSslMode::Disable),
    }
}

/// Open a connection pool and verify it with one round-trip.
pub async fn connect(cfg: &DatabaseConfig) -> StoreResult<PgPool> {
    tracing::info!(
        url = %cfg.redacted_url(),
        tls = cfg.tls.is_some(),
        max_connections = cfg.max_connections,
        "connecting to database"
    );

    PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(connect_options(cfg))
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Create any missing catalog tables.
pub async fn ensure_schema(pool: &PgPool) -> StoreResult<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    tracing::info!("catalog schema ready");
    Ok(())
}
