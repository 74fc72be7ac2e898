//! Connection lifecycle for the target MySQL/MariaDB server.
//!
//! An [`Instance`] is opened once at exporter startup: a single-connection
//! pool (mirroring the historical `maxOpenConns(1)` behaviour of
//! `mysqld_exporter`, so the exporter never competes with application
//! traffic for connections) plus a detected flavor/version used to gate
//! version-sensitive collectors.

use anyhow::Result;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info_span, instrument, warn};
use tracing_futures::Instrument as _;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flavor {
    MySql,
    MariaDb,
}

impl Flavor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::MariaDb => "mariadb",
        }
    }
}

pub struct Instance {
    pool: MySqlPool,
}

impl Instance {
    /// Opens a single-connection pool against `dsn`.
    ///
    /// When `log_slow_filter` is set, the session also issues
    /// `SET SESSION log_slow_filter='tmp_table_on_disk,filesort_on_disk'` so
    /// the slow query log only captures queries with an on-disk temp table
    /// or filesort, matching this exporter's own query patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if the DSN is malformed or the initial connection
    /// attempt fails.
    #[instrument(skip(dsn), level = "info", err)]
    pub async fn connect(
        dsn: &SecretString,
        lock_wait_timeout: u64,
        log_slow_filter: bool,
    ) -> Result<Self> {
        let opts = sqlx::mysql::MySqlConnectOptions::from_str(dsn.expose_secret())?;

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    sqlx::query(&format!("SET SESSION lock_wait_timeout={lock_wait_timeout}"))
                        .execute(&mut *conn)
                        .await?;
                    if log_slow_filter {
                        sqlx::query(
                            "SET SESSION log_slow_filter='tmp_table_on_disk,filesort_on_disk'",
                        )
                        .execute(&mut *conn)
                        .await?;
                    }
                    Ok(())
                })
            })
            .connect_with(opts)
            .await?;

        Ok(Self { pool })
    }

    #[must_use]
    pub const fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Pings the server, retrying exactly once. A known `sqlx`/server
    /// interaction can surface a stale-connection error on the very first
    /// query issued on a freshly opened pool; a single retry absorbs it
    /// without masking a genuinely unreachable server.
    ///
    /// # Errors
    ///
    /// Returns an error if both the initial ping and the single retry fail.
    #[instrument(skip(self), level = "info", err)]
    pub async fn ping(&self) -> Result<()> {
        let span = info_span!(
            "db.query",
            db.system = "mysql",
            db.operation = "SELECT",
            db.statement = "SELECT 1",
            otel.kind = "client"
        );
        match sqlx::query("SELECT 1")
            .execute(&self.pool)
            .instrument(span)
            .await
        {
            Ok(_) => Ok(()),
            Err(first_err) => {
                warn!(error = %first_err, "ping failed, retrying once");
                let span = info_span!(
                    "db.query",
                    db.system = "mysql",
                    db.operation = "SELECT",
                    db.statement = "SELECT 1",
                    otel.kind = "client"
                );
                sqlx::query("SELECT 1")
                    .execute(&self.pool)
                    .instrument(span)
                    .await?;
                Ok(())
            }
        }
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Queries `VERSION()` and returns `(major.minor, flavor, raw version string)`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn detect_version(pool: &MySqlPool) -> Result<(f64, Flavor, String)> {
    let span = info_span!(
        "db.query",
        db.system = "mysql",
        db.operation = "SELECT",
        db.statement = "SELECT VERSION()",
        otel.kind = "client"
    );
    let raw = sqlx::query_scalar::<_, String>("SELECT VERSION()")
        .fetch_one(pool)
        .instrument(span)
        .await?;

    Ok((major_minor(&raw), flavor_of(&raw), raw))
}

fn flavor_of(raw: &str) -> Flavor {
    if raw.to_ascii_lowercase().contains("mariadb") {
        Flavor::MariaDb
    } else {
        Flavor::MySql
    }
}

#[allow(clippy::expect_used)]
fn major_minor(raw: &str) -> f64 {
    let re = Regex::new(r"^(\d+)\.(\d+)").expect("valid version prefix regex");
    re.captures(raw)
        .and_then(|c| format!("{}.{}", c.get(1)?.as_str(), c.get(2)?.as_str()).parse().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_mariadb_flavor() {
        assert_eq!(flavor_of("10.6.12-MariaDB-1:10.6.12+maria~ubu2004"), Flavor::MariaDb);
        assert_eq!(flavor_of("8.0.34"), Flavor::MySql);
    }

    #[test]
    fn major_minor_parses_prefix() {
        assert!((major_minor("10.6.12-MariaDB") - 10.6).abs() < 1e-9);
        assert!((major_minor("8.0.34") - 8.0).abs() < 1e-9);
        assert_eq!(major_minor("garbage"), 0.0);
    }
}
