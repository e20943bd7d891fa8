//! HTTP(S) server bootstrap.
//!
//! Plain HTTP via `axum::serve` unless both server TLS files are configured,
//! in which case connections are terminated with rustls.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum_server::tls_rustls::RustlsConfig;

use libcat_infra::config::{ServerConfig, ServerTls};

/// In-flight requests get this long to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Serve `app` until Ctrl-C.
pub async fn serve(app: Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = resolve(&config.bind_addr()).await?;

    match &config.tls {
        Some(tls) => serve_tls(app, addr, tls).await,
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;

            tracing::info!("listening on http://{}", listener.local_addr()?);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("http server failed")
        }
    }
}

async fn serve_tls(app: Router, addr: SocketAddr, tls: &ServerTls) -> anyhow::Result<()> {
    let rustls_config = load_tls(tls).await?;

    let handle = axum_server::Handle::new();
    {
        let handle = handle.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });
    }

    tracing::info!("listening on https://{addr}");

    axum_server::bind_rustls(addr, rustls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .context("https server failed")
}

/// Load the PEM certificate chain and private key for HTTPS.
pub async fn load_tls(tls: &ServerTls) -> anyhow::Result<RustlsConfig> {
    // axum-server is built without a crypto provider. Err means one is
    // already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    RustlsConfig::from_pem_file(&tls.cert_file, &tls.key_file)
        .await
        .with_context(|| {
            format!(
                "failed to load TLS certificate {} / key {}",
                tls.cert_file.display(),
                tls.key_file.display()
            )
        })
}

async fn resolve(bind_addr: &str) -> anyhow::Result<SocketAddr> {
    tokio::net::lookup_host(bind_addr)
        .await
        .with_context(|| format!("invalid bind address {bind_addr}"))?
        .next()
        .with_context(|| format!("bind address {bind_addr} did not resolve"))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
