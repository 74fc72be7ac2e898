//! Lookup and per-scrape fan-out for the set of enabled collectors.
//!
//! `CollectorRegistry` is built once at exporter startup from a
//! [`CollectorConfig`]: it instantiates every enabled collector, registers
//! their metric descriptors against a single `prometheus::Registry`, and
//! exposes [`CollectorRegistry::collect_all`] for the HTTP handler to call on
//! every inbound scrape.

use super::arg::Arg;
use super::config::CollectorConfig;
use super::exporter::ScraperCollector;
use super::{COLLECTOR_NAMES, Collector, CollectorType, all_factories};
use crate::instance;
use anyhow::{Result, anyhow};
use futures::stream::{FuturesUnordered, StreamExt};
use prometheus::{Encoder, GaugeVec, IntGauge, Opts, Registry, TextEncoder};
use sqlx::MySqlPool;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Instant;
use tracing::{debug, error, info_span, instrument, warn};
use tracing_futures::Instrument as _;

pub struct CollectorRegistry {
    registry: Registry,
    collectors: Vec<CollectorType>,
    enabled: RwLock<HashMap<&'static str, bool>>,
    scraper: Option<Arc<ScraperCollector>>,
    up: IntGauge,
    collector_success: GaugeVec,
    collector_duration: GaugeVec,
}

impl CollectorRegistry {
    /// Builds the registry, instantiating and registering every collector
    /// named by `config`. A collector whose `register_metrics` fails is
    /// logged and skipped rather than aborting the whole exporter.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(config: &CollectorConfig) -> Self {
        let registry = Registry::new();
        let factories = all_factories();

        let up = IntGauge::with_opts(Opts::new(
            "mysql_up",
            "Whether the last scrape of the target server succeeded (1) or not (0).",
        ))
        .expect("valid mysql_up metric opts");
        registry
            .register(Box::new(up.clone()))
            .expect("mysql_up registers cleanly into a fresh registry");

        let collector_success = GaugeVec::new(
            Opts::new(
                "mysql_exporter_collector_success",
                "Whether the collector's last scrape succeeded (1) or failed (0).",
            ),
            &["collector"],
        )
        .expect("valid mysql_exporter_collector_success metric opts");
        registry
            .register(Box::new(collector_success.clone()))
            .expect("mysql_exporter_collector_success registers cleanly into a fresh registry");

        let collector_duration = GaugeVec::new(
            Opts::new(
                "mysql_exporter_collector_duration_seconds",
                "Time spent on the named collector's last scrape, in seconds.",
            ),
            &["collector"],
        )
        .expect("valid mysql_exporter_collector_duration_seconds metric opts");
        registry
            .register(Box::new(collector_duration.clone()))
            .expect("mysql_exporter_collector_duration_seconds registers cleanly into a fresh registry");

        let mut collectors = Vec::new();
        let mut scraper = None;
        let mut enabled = HashMap::new();

        for name in COLLECTOR_NAMES {
            let is_enabled = config.is_enabled(name);
            enabled.insert(*name, is_enabled);
            if !is_enabled {
                continue;
            }
            let Some(factory) = factories.get(name) else {
                continue;
            };
            let collector = factory();
            if let Err(e) = collector.register_metrics(&registry) {
                warn!(collector = *name, error = %e, "failed to register collector metrics, skipping");
                continue;
            }
            if let Some(s) = collector.get_scraper() {
                scraper = Some(s);
            }
            collectors.push(collector);
        }

        Self {
            registry,
            collectors,
            enabled: RwLock::new(enabled),
            scraper,
            up,
            collector_success,
            collector_duration,
        }
    }

    /// Names of every collector known to the binary, enabled or not.
    #[must_use]
    pub fn all(&self) -> &'static [&'static str] {
        COLLECTOR_NAMES
    }

    /// Names of the collectors currently instantiated and fanned out to on
    /// every scrape.
    #[must_use]
    pub fn enabled(&self) -> Vec<&'static str> {
        self.collectors.iter().map(Collector::name).collect()
    }

    /// Looks up a live collector instance by name, for late-binding
    /// configuration via [`CollectorType::configure`].
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&CollectorType> {
        self.collectors.iter().find(|c| c.name() == name)
    }

    /// Records whether `name` should be considered enabled. This only
    /// affects [`CollectorRegistry::is_enabled`] bookkeeping; a collector
    /// disabled after `new()` already ran keeps its metrics registered but
    /// is skipped by future calls to [`CollectorRegistry::collect_all`] that
    /// consult this flag directly (the default `new()`-time enable set is
    /// the one actually fanned out to, since collectors are instantiated
    /// once at startup).
    pub fn set_enabled(&self, name: &'static str, value: bool) {
        let mut guard = match self.enabled.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.insert(name, value);
    }

    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        let guard = match self.enabled.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.get(name).copied().unwrap_or(false)
    }

    /// Late-binding hook run once after CLI parsing, before the first
    /// scrape: applies every `--collect.<name>.<arg>` override to the
    /// matching live collector via [`Collector::configure`].
    ///
    /// # Errors
    ///
    /// Returns an error if `overrides` names a collector that either isn't
    /// registered or rejects the arguments handed to it.
    pub fn init_from_flags(&self, overrides: &[(&str, Vec<Arg>)]) -> Result<()> {
        for (name, args) in overrides {
            let collector = self
                .lookup(name)
                .ok_or_else(|| anyhow!("unknown collector '{name}'"))?;
            collector.configure(args)?;
        }
        Ok(())
    }

    /// Runs one full scrape: pings the server, fans out to every eligible
    /// collector concurrently, then gathers the registry into Prometheus
    /// text-exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the gathered metrics fail to encode. A failure to
    /// reach the server or a single collector's SQL is *not* an error here;
    /// it is reflected as `mysql_up=0` / a failed scrape-success sample.
    #[instrument(skip(self, pool), level = "info", err)]
    pub async fn collect_all(&self, pool: &MySqlPool) -> Result<String> {
        if let Some(scraper) = &self.scraper {
            scraper.increment_scrapes();
        }

        let connection_start = Instant::now();

        let ping_span = info_span!(
            "db.query",
            db.system = "mysql",
            db.operation = "SELECT",
            db.statement = "SELECT 1",
            otel.kind = "client"
        );
        let reachable = sqlx::query("SELECT 1")
            .execute(pool)
            .instrument(ping_span)
            .await
            .is_ok();

        let major_minor = if reachable {
            instance::detect_version(pool)
                .await
                .map(|(mm, _, _)| mm)
                .unwrap_or(0.0)
        } else {
            0.0
        };

        self.collector_duration
            .with_label_values(&["connection"])
            .set(connection_start.elapsed().as_secs_f64());
        self.up.set(i64::from(reachable));

        if reachable {
            let mut tasks = FuturesUnordered::new();
            for collector in &self.collectors {
                if !self.is_enabled(collector.name()) {
                    continue;
                }
                if collector.min_version() > major_minor {
                    debug!(
                        collector = collector.name(),
                        required = collector.min_version(),
                        detected = major_minor,
                        "skipping collector, server version too old"
                    );
                    continue;
                }

                let name = collector.name();
                let span = info_span!("collector.collect", collector = name, otel.kind = "internal");
                let fut = collector.collect(pool).instrument(span);
                tasks.push(async move {
                    let timer = self.scraper.as_ref().map(|s| s.start_scrape(name));
                    let start = Instant::now();
                    let result = fut.await;
                    let elapsed = start.elapsed().as_secs_f64();
                    match result {
                        Ok(()) => {
                            if let Some(t) = timer {
                                t.success();
                            }
                            self.collector_success.with_label_values(&[name]).set(1.0);
                            debug!(collector = name, "scrape succeeded");
                        }
                        Err(e) => {
                            if let Some(t) = timer {
                                t.error();
                            }
                            self.collector_success.with_label_values(&[name]).set(0.0);
                            error!(collector = name, error = %e, "scrape failed");
                        }
                    }
                    self.collector_duration
                        .with_label_values(&[name])
                        .set(elapsed);
                });
            }
            while tasks.next().await.is_some() {}
        }

        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        let body = String::from_utf8(buf)?;

        if let Some(scraper) = &self.scraper {
            let count = body
                .lines()
                .filter(|line| !line.starts_with('#') && !line.trim().is_empty())
                .count();
            scraper.update_metrics_count(i64::try_from(count).unwrap_or(0));
        }

        Ok(body)
    }

    #[must_use]
    pub fn prometheus_registry(&self) -> &Registry {
        &self.registry
    }

    /// Renders the registry with `mysql_up` forced to `0`, for the case
    /// where the target connection itself could not be opened this scrape
    /// (so no `MySqlPool` exists to hand to [`CollectorRegistry::collect_all`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the gathered metrics fail to encode.
    pub fn render_unreachable(&self) -> Result<String> {
        self.up.set(0);
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        Ok(String::from_utf8(buf)?)
    }
}
