//! HTTP surface: wires the collector registry and the extras module to an
//! `axum` server and starts serving `/metrics`, `/health` and (optionally)
//! `/extras`.

use crate::collectors::arg::Arg as CollectorArg;
use crate::collectors::config::CollectorConfig;
use crate::collectors::registry::CollectorRegistry;
use crate::extras::Extras;
use crate::instance::Instance;
use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use secrecy::SecretString;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

struct AppState {
    registry: CollectorRegistry,
    dsn: SecretString,
    lock_wait_timeout: u64,
    log_slow_filter: bool,
    extras: Option<Arc<Extras>>,
}

/// Starts the exporter: validates the target connection, builds the
/// collector registry, binds the listener and serves until the task is
/// cancelled.
///
/// `listen` selects the bind address: `None` auto-detects (tries `::`,
/// falling back to `0.0.0.0`); `Some(addr)` binds exactly that address.
///
/// Extras are opt-in via `MARIADB_EXPORTER_EXTRAS_FILE` (and optionally
/// `MARIADB_EXPORTER_EXTRAS_REFRESH_SECS`), matching this exporter's existing
/// convention of env-var escape hatches for things the CLI also controls.
///
/// No [`Instance`] is held for the process lifetime: a fresh one is opened
/// at the start of every inbound scrape and closed before the response is
/// sent, so the exporter never keeps a connection pinned between scrapes.
///
/// # Errors
///
/// Returns an error if the target connection cannot be established, or if
/// binding the listener fails on every candidate address.
pub async fn new(
    port: u16,
    listen: Option<String>,
    dsn: SecretString,
    collectors: Vec<String>,
    lock_wait_timeout: u64,
    log_slow_filter: bool,
    collect_overrides: Vec<(&'static str, Vec<CollectorArg>)>,
) -> Result<()> {
    crate::collectors::util::set_base_connect_options_from_dsn(&dsn)?;

    let instance = Instance::connect(&dsn, lock_wait_timeout, log_slow_filter).await?;
    let ping_result = instance.ping().await;
    instance.close().await;
    if let Err(e) = ping_result {
        error!(error = %e, "initial ping to target server failed");
        return Err(e);
    }

    let config = CollectorConfig::new().with_enabled(&collectors);
    let registry = CollectorRegistry::new(&config);
    registry.init_from_flags(&collect_overrides)?;

    let extras = extras_from_env();

    let state = Arc::new(AppState {
        registry,
        dsn,
        lock_wait_timeout,
        log_slow_filter,
        extras,
    });

    let mut router = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler));

    if state.extras.is_some() {
        router = router.route("/extras", get(extras_handler));
    }

    let app = router.layer(TraceLayer::new_for_http()).with_state(state);

    let addr = bind_address(listen, port);
    info!(%addr, "starting mariadb_exporter");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn extras_from_env() -> Option<Arc<Extras>> {
    let path = std::env::var("MARIADB_EXPORTER_EXTRAS_FILE").ok()?;
    let interval = std::env::var("MARIADB_EXPORTER_EXTRAS_REFRESH_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs);
    Some(Extras::new(PathBuf::from(path), interval))
}

fn bind_address(listen: Option<String>, port: u16) -> SocketAddr {
    match listen {
        Some(addr) => {
            let ip: IpAddr = addr.parse().unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
            SocketAddr::new(ip, port)
        }
        None => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port),
    }
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let instance = match Instance::connect(&state.dsn, state.lock_wait_timeout, state.log_slow_filter).await
    {
        Ok(instance) => instance,
        Err(e) => {
            error!(error = %e, "failed to open target connection for this scrape");
            return render_unreachable(&state);
        }
    };

    if let Some(extras) = &state.extras
        && let Err(e) = extras.collect(instance.pool(), state.registry.prometheus_registry()).await
    {
        error!(error = %e, "extras collection failed");
    }

    let result = state.registry.collect_all(instance.pool()).await;
    instance.close().await;

    match result {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "scrape failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

fn render_unreachable(state: &AppState) -> Response {
    match state.registry.render_unreachable() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to render metrics after connection failure");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn health_handler() -> StatusCode {
    StatusCode::OK
}

async fn extras_handler(State(state): State<Arc<AppState>>) -> Response {
    match &state.extras {
        Some(extras) => axum::Json(extras.status()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_address_defaults_to_unspecified_ipv6() {
        let addr = bind_address(None, 9104);
        assert_eq!(addr.port(), 9104);
        assert!(addr.is_ipv6());
    }

    #[test]
    fn bind_address_parses_explicit_ipv4() {
        let addr = bind_address(Some("127.0.0.1".to_string()), 9104);
        assert_eq!(addr, SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 9104));
    }

    #[test]
    fn bind_address_parses_explicit_ipv6() {
        let addr = bind_address(Some("::1".to_string()), 9104);
        assert!(addr.is_ipv6());
    }
}
