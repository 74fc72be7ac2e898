//! File-sourced, hot-reloadable custom scrapers.
//!
//! Operators can drop a YAML file of ad hoc `{metric, query}` pairs next to
//! the exporter; each entry becomes a gauge family labeled by result column,
//! refreshed from disk on a timer without restarting the process. The live
//! scraper list is held behind an [`arc_swap::ArcSwap`] so readers (every
//! inbound scrape) never block on the writer (the refresh ticker).

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use prometheus::{GaugeVec, Opts, Registry};
use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlRow;
use sqlx::{Column, MySqlPool, Row, ValueRef};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ExtraScraper {
    pub metric: String,
    pub query: String,
}

#[derive(Serialize)]
pub struct ExtrasStatus {
    pub filename: String,
    pub interval_seconds: Option<u64>,
    pub scrapers: Vec<ExtraScraper>,
}

pub struct Extras {
    path: PathBuf,
    interval: Option<Duration>,
    live: ArcSwap<Vec<ExtraScraper>>,
    gauges: Mutex<HashMap<String, GaugeVec>>,
}

impl Extras {
    /// Builds the extras module and, if `interval` is set, spawns a
    /// background task that calls [`Extras::refresh`] on that cadence.
    #[must_use]
    pub fn new(path: PathBuf, interval: Option<Duration>) -> Arc<Self> {
        let extras = Arc::new(Self {
            path,
            interval,
            live: ArcSwap::from_pointee(Vec::new()),
            gauges: Mutex::new(HashMap::new()),
        });

        if let Some(period) = interval {
            let handle = Arc::clone(&extras);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                loop {
                    ticker.tick().await;
                    if let Err(e) = handle.refresh().await {
                        warn!(error = %e, "extras refresh failed, keeping previous snapshot");
                    }
                }
            });
        }

        extras
    }

    /// Reloads the scraper list from disk. A missing or empty file is not an
    /// error: the live snapshot is simply left untouched. A malformed file
    /// is reported but also leaves the previous snapshot in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists, is non-empty, and fails to parse.
    #[instrument(skip(self), level = "info", err)]
    pub async fn refresh(&self) -> Result<()> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "extras file absent, nothing to load");
                return Ok(());
            }
            Err(e) => return Err(e).context("reading extras file"),
        };

        if raw.trim().is_empty() {
            return Ok(());
        }

        let scrapers: Vec<ExtraScraper> =
            serde_yaml::from_str(&raw).context("parsing extras YAML")?;

        debug!(count = scrapers.len(), "loaded extra scrapers");
        self.live.store(Arc::new(scrapers));
        Ok(())
    }

    /// Runs every currently-live extra query and publishes one gauge family
    /// per distinct metric/column pair. A row whose cell cannot be coerced
    /// to `f64` is skipped; the rest of the row and the rest of the query
    /// still publish.
    ///
    /// # Errors
    ///
    /// Returns an error only if registering a new gauge family fails (never
    /// for a query or row-level failure, which are logged and skipped).
    #[instrument(skip(self, pool, registry), level = "info", err)]
    pub async fn collect(&self, pool: &MySqlPool, registry: &Registry) -> Result<()> {
        let snapshot = self.live.load();

        for scraper in snapshot.iter() {
            if let Err(e) = self.run_one(scraper, pool, registry).await {
                warn!(metric = %scraper.metric, error = %e, "extra scraper failed");
            }
        }
        Ok(())
    }

    async fn run_one(
        &self,
        scraper: &ExtraScraper,
        pool: &MySqlPool,
        registry: &Registry,
    ) -> Result<()> {
        let rows = sqlx::query(&scraper.query).fetch_all(pool).await?;

        let gauge = self.gauge_for(&scraper.metric, registry).await?;

        for row in &rows {
            for (idx, col) in row.columns().iter().enumerate() {
                let Ok(raw) = row.try_get_raw(idx) else {
                    continue;
                };
                if raw.is_null() {
                    continue;
                }
                if let Some(value) = coerce_cell(row, idx) {
                    gauge.with_label_values(&[col.name()]).set(value);
                }
            }
        }
        Ok(())
    }

    async fn gauge_for(&self, metric: &str, registry: &Registry) -> Result<GaugeVec> {
        let mut gauges = self.gauges.lock().await;
        if let Some(g) = gauges.get(metric) {
            return Ok(g.clone());
        }

        let name = format!("mysql_extra_{metric}");
        let gauge = GaugeVec::new(
            Opts::new(name, format!("Custom extra scraper metric '{metric}'")),
            &["column"],
        )?;
        registry.register(Box::new(gauge.clone()))?;
        gauges.insert(metric.to_string(), gauge.clone());
        Ok(gauge)
    }

    #[must_use]
    pub fn status(&self) -> ExtrasStatus {
        ExtrasStatus {
            filename: self.path.display().to_string(),
            interval_seconds: self.interval.map(|d| d.as_secs()),
            scrapers: self.live.load().as_ref().clone(),
        }
    }
}

/// Coerces a result column to `f64` the way the driver's automatic numeric
/// conversion would: tries the wire-native numeric decodes first (MySQL's
/// binary protocol rejects decoding an integer or float column as `String`),
/// then falls back to text coercion via [`crate::parse::parse_status`] for
/// columns that really are textual (`ON`/`OFF`, binlog file names, ...).
#[allow(clippy::cast_precision_loss)]
fn coerce_cell(row: &MySqlRow, idx: usize) -> Option<f64> {
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return Some(v);
    }
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return Some(v as f64);
    }
    if let Ok(v) = row.try_get::<u64, _>(idx) {
        return Some(v as f64);
    }
    if let Ok(v) = row.try_get::<f32, _>(idx) {
        return Some(f64::from(v));
    }
    if let Ok(v) = row.try_get::<i32, _>(idx) {
        return Some(f64::from(v));
    }
    if let Ok(v) = row.try_get::<bool, _>(idx) {
        return Some(f64::from(v));
    }
    let text = row.try_get::<String, _>(idx).ok()?;
    let (value, ok) = crate::parse::parse_status(&text);
    ok.then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refresh_on_missing_file_is_not_an_error() {
        let extras = Extras::new(PathBuf::from("/nonexistent/extras.yaml"), None);
        assert!(extras.refresh().await.is_ok());
        assert!(extras.status().scrapers.is_empty());
    }

    #[tokio::test]
    async fn refresh_parses_yaml_scrapers() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("extras-test-{}.yaml", std::process::id()));
        tokio::fs::write(
            &path,
            "- metric: foo\n  query: SELECT 1 as bar\n",
        )
        .await
        .unwrap();

        let extras = Extras::new(path.clone(), None);
        extras.refresh().await.unwrap();

        let status = extras.status();
        assert_eq!(status.scrapers.len(), 1);
        assert_eq!(status.scrapers[0].metric, "foo");

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn refresh_on_malformed_yaml_keeps_previous_snapshot() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("extras-bad-{}.yaml", std::process::id()));
        tokio::fs::write(&path, "- metric: foo\n  query: SELECT 1\n")
            .await
            .unwrap();
        let extras = Extras::new(path.clone(), None);
        extras.refresh().await.unwrap();
        assert_eq!(extras.status().scrapers.len(), 1);

        tokio::fs::write(&path, "not: [valid, yaml for our schema").await.unwrap();
        assert!(extras.refresh().await.is_err());
        assert_eq!(extras.status().scrapers.len(), 1);

        tokio::fs::remove_file(&path).await.ok();
    }
}
