//! Galera/PXC cluster status (`wsrep_*` status variables).
//!
//! A no-op on a standalone (non-Galera) server: every query here reads from
//! `information_schema.global_status`/`global_variables`, which simply
//! return no rows for `wsrep_%` names outside a Galera node.

use crate::collectors::Collector;
use crate::parse::parse_status;
use anyhow::Result;
use futures::future::BoxFuture;
use prometheus::{Gauge, GaugeVec, IntGauge, Opts, Registry};
use sqlx::{MySqlPool, Row};
use std::collections::HashMap;
use tracing::{debug, info_span, instrument};
use tracing_futures::Instrument as _;

const EVS_LATENCY_FIELDS: [&str; 5] = ["min", "avg", "max", "stddev", "sample_size"];

#[derive(Clone)]
pub struct GaleraCollector {
    cluster_size: IntGauge,
    cluster_status: IntGauge,
    connected: IntGauge,
    ready: IntGauge,
    local_state: IntGauge,
    flow_control_paused: Gauge,
    flow_control_sent: IntGauge,
    flow_control_recv: IntGauge,
    cert_deps_distance: Gauge,
    local_recv_queue: IntGauge,
    local_send_queue: IntGauge,
    evs_repl_latency: GaugeVec,
    gcache_size_bytes: IntGauge,
}

impl GaleraCollector {
    #[must_use]
    #[allow(clippy::expect_used)]
    ///
    /// # Panics
    ///
    /// Panics if metric construction fails (should never happen with static names).
    pub fn new() -> Self {
        Self {
            cluster_size: IntGauge::new(
                "mysql_galera_cluster_size",
                "Number of nodes currently in the Galera cluster",
            )
            .expect("valid mysql_galera_cluster_size metric"),
            cluster_status: IntGauge::new(
                "mysql_galera_cluster_status",
                "Whether this node's cluster component is Primary (1) or not (0)",
            )
            .expect("valid mysql_galera_cluster_status metric"),
            connected: IntGauge::new(
                "mysql_galera_connected",
                "Whether the node is connected to the cluster (1) or not (0)",
            )
            .expect("valid mysql_galera_connected metric"),
            ready: IntGauge::new(
                "mysql_galera_ready",
                "Whether the node is ready to accept queries (1) or not (0)",
            )
            .expect("valid mysql_galera_ready metric"),
            local_state: IntGauge::new(
                "mysql_galera_local_state",
                "Node's local state number (4 = Synced)",
            )
            .expect("valid mysql_galera_local_state metric"),
            flow_control_paused: Gauge::new(
                "mysql_galera_flow_control_paused_ratio",
                "Fraction of time since the last check flow control was paused",
            )
            .expect("valid mysql_galera_flow_control_paused_ratio metric"),
            flow_control_sent: IntGauge::new(
                "mysql_galera_flow_control_sent",
                "Number of FC_PAUSE events sent",
            )
            .expect("valid mysql_galera_flow_control_sent metric"),
            flow_control_recv: IntGauge::new(
                "mysql_galera_flow_control_recv",
                "Number of FC_PAUSE events received",
            )
            .expect("valid mysql_galera_flow_control_recv metric"),
            cert_deps_distance: Gauge::new(
                "mysql_galera_cert_deps_distance",
                "Average distance between highest and lowest seqno that can be possibly applied in parallel",
            )
            .expect("valid mysql_galera_cert_deps_distance metric"),
            local_recv_queue: IntGauge::new(
                "mysql_galera_local_recv_queue",
                "Current length of the local receive queue",
            )
            .expect("valid mysql_galera_local_recv_queue metric"),
            local_send_queue: IntGauge::new(
                "mysql_galera_local_send_queue",
                "Current length of the local send queue",
            )
            .expect("valid mysql_galera_local_send_queue metric"),
            evs_repl_latency: GaugeVec::new(
                Opts::new(
                    "mysql_galera_evs_repl_latency_seconds",
                    "Group communication replication latency, one sample per statistic",
                ),
                &["stat"],
            )
            .expect("valid mysql_galera_evs_repl_latency_seconds metric"),
            gcache_size_bytes: IntGauge::new(
                "mysql_galera_gcache_size_bytes",
                "Configured gcache.size parsed from wsrep_provider_options",
            )
            .expect("valid mysql_galera_gcache_size_bytes metric"),
        }
    }

    fn collect_status(&self, status: &HashMap<String, String>) {
        if let Some(raw) = status.get("WSREP_CLUSTER_SIZE")
            && let Ok(v) = raw.parse::<i64>()
        {
            self.cluster_size.set(v);
        }

        if let Some(raw) = status.get("WSREP_CLUSTER_STATUS") {
            let (v, ok) = parse_status(raw);
            if ok {
                #[allow(clippy::cast_possible_truncation)]
                self.cluster_status.set(v as i64);
            }
        }

        if let Some(raw) = status.get("WSREP_CONNECTED") {
            let (v, ok) = parse_status(raw);
            if ok {
                #[allow(clippy::cast_possible_truncation)]
                self.connected.set(v as i64);
            }
        }

        if let Some(raw) = status.get("WSREP_READY") {
            let (v, ok) = parse_status(raw);
            if ok {
                #[allow(clippy::cast_possible_truncation)]
                self.ready.set(v as i64);
            }
        }

        if let Some(raw) = status.get("WSREP_LOCAL_STATE")
            && let Ok(v) = raw.parse::<i64>()
        {
            self.local_state.set(v);
        }

        if let Some(raw) = status.get("WSREP_FLOW_CONTROL_PAUSED")
            && let Ok(v) = raw.parse::<f64>()
        {
            self.flow_control_paused.set(v);
        }

        if let Some(raw) = status.get("WSREP_FLOW_CONTROL_SENT")
            && let Ok(v) = raw.parse::<i64>()
        {
            self.flow_control_sent.set(v);
        }

        if let Some(raw) = status.get("WSREP_FLOW_CONTROL_RECV")
            && let Ok(v) = raw.parse::<i64>()
        {
            self.flow_control_recv.set(v);
        }

        if let Some(raw) = status.get("WSREP_CERT_DEPS_DISTANCE")
            && let Ok(v) = raw.parse::<f64>()
        {
            self.cert_deps_distance.set(v);
        }

        if let Some(raw) = status.get("WSREP_LOCAL_RECV_QUEUE")
            && let Ok(v) = raw.parse::<i64>()
        {
            self.local_recv_queue.set(v);
        }

        if let Some(raw) = status.get("WSREP_LOCAL_SEND_QUEUE")
            && let Ok(v) = raw.parse::<i64>()
        {
            self.local_send_queue.set(v);
        }

        if let Some(raw) = status.get("WSREP_EVS_REPL_LATENCY") {
            for (stat, value) in parse_evs_repl_latency(raw) {
                self.evs_repl_latency.with_label_values(&[stat]).set(value);
            }
        }
    }

    fn collect_provider_options(&self, raw_options: &str) {
        if let Some(bytes) = parse_gcache_size(raw_options) {
            self.gcache_size_bytes.set(bytes);
        } else {
            debug!(
                "could not find a parseable gcache.size in wsrep_provider_options"
            );
        }
    }

    /// Collects every `wsrep_%` status variable and the `gcache.size`
    /// setting embedded in `wsrep_provider_options`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying queries fail for a reason other
    /// than Galera support being entirely absent (that case returns empty
    /// rows, not an error, and is handled as a silent no-op).
    #[instrument(skip(self, pool), level = "info", err, fields(collector = "galera", otel.kind = "internal"))]
    pub async fn collect(&self, pool: &MySqlPool) -> Result<()> {
        let status_span = info_span!(
            "db.query",
            db.system = "mysql",
            db.operation = "SELECT",
            db.statement = "SELECT VARIABLE_NAME, VARIABLE_VALUE FROM information_schema.global_status WHERE VARIABLE_NAME LIKE 'WSREP%'",
            otel.kind = "client"
        );
        let rows = sqlx::query(
            "SELECT VARIABLE_NAME, VARIABLE_VALUE FROM information_schema.global_status WHERE VARIABLE_NAME LIKE 'WSREP%'",
        )
        .fetch_all(pool)
        .instrument(status_span)
        .await?;

        let status: HashMap<String, String> = rows
            .into_iter()
            .filter_map(|row| {
                let name: Option<String> = row.try_get("VARIABLE_NAME").ok();
                let val: Option<String> = row.try_get("VARIABLE_VALUE").ok();
                name.zip(val).map(|(n, v)| (n.to_ascii_uppercase(), v))
            })
            .collect();

        if status.is_empty() {
            debug!("no wsrep_% status variables present; skipping (not a Galera node)");
            return Ok(());
        }

        self.collect_status(&status);

        let options_span = info_span!(
            "db.query",
            db.system = "mysql",
            db.operation = "SHOW",
            db.statement = "SHOW VARIABLES LIKE 'wsrep_provider_options'",
            otel.kind = "client"
        );
        if let Ok(Some(raw)) =
            sqlx::query_scalar::<_, Option<String>>("SHOW VARIABLES LIKE 'wsrep_provider_options'")
                .fetch_optional(pool)
                .instrument(options_span)
                .await
                .map(Option::flatten)
        {
            self.collect_provider_options(&raw);
        }

        Ok(())
    }

    fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.cluster_size.clone()))?;
        registry.register(Box::new(self.cluster_status.clone()))?;
        registry.register(Box::new(self.connected.clone()))?;
        registry.register(Box::new(self.ready.clone()))?;
        registry.register(Box::new(self.local_state.clone()))?;
        registry.register(Box::new(self.flow_control_paused.clone()))?;
        registry.register(Box::new(self.flow_control_sent.clone()))?;
        registry.register(Box::new(self.flow_control_recv.clone()))?;
        registry.register(Box::new(self.cert_deps_distance.clone()))?;
        registry.register(Box::new(self.local_recv_queue.clone()))?;
        registry.register(Box::new(self.local_send_queue.clone()))?;
        registry.register(Box::new(self.evs_repl_latency.clone()))?;
        registry.register(Box::new(self.gcache_size_bytes.clone()))?;
        Ok(())
    }
}

impl Default for GaleraCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for GaleraCollector {
    fn name(&self) -> &'static str {
        "galera"
    }

    fn register_metrics(&self, registry: &Registry) -> Result<()> {
        self.register(registry)
    }

    fn collect<'a>(&'a self, pool: &'a MySqlPool) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { self.collect(pool).await })
    }

    fn enabled_by_default(&self) -> bool {
        false
    }
}

/// Parses the slash-delimited five-tuple `wsrep_evs_repl_latency` reports
/// (`min/avg/max/stddev/sample_size`, times in seconds) into named pairs.
///
/// All five fields must parse or none are emitted — a short tuple is not a
/// partial reading, it's a value this server version doesn't report yet.
fn parse_evs_repl_latency(raw: &str) -> Vec<(&'static str, f64)> {
    let parts: Vec<&str> = raw.split('/').collect();
    if parts.len() != EVS_LATENCY_FIELDS.len() {
        return Vec::new();
    }

    let parsed: Vec<(&'static str, f64)> = parts
        .iter()
        .zip(EVS_LATENCY_FIELDS)
        .filter_map(|(part, name)| part.trim().parse::<f64>().ok().map(|v| (name, v)))
        .collect();

    if parsed.len() == EVS_LATENCY_FIELDS.len() {
        parsed
    } else {
        Vec::new()
    }
}

/// Scans `wsrep_provider_options` (a `;`-separated `key = value` blob) for
/// `gcache.size` and converts its `K`/`M`/`G` suffix to bytes.
fn parse_gcache_size(raw_options: &str) -> Option<i64> {
    for entry in raw_options.split(';') {
        let entry = entry.trim();
        let Some((key, value)) = entry.split_once('=') else {
            continue;
        };
        if key.trim() != "gcache.size" {
            continue;
        }
        return parse_size_with_suffix(value.trim());
    }
    None
}

fn parse_size_with_suffix(value: &str) -> Option<i64> {
    let (number_part, multiplier) = match value.chars().last() {
        Some('K' | 'k') => (value.strip_suffix(['K', 'k']), 1024),
        Some('M' | 'm') => (value.strip_suffix(['M', 'm']), 1024 * 1024),
        Some('G' | 'g') => (value.strip_suffix(['G', 'g']), 1024 * 1024 * 1024),
        _ => (Some(value), 1),
    };
    number_part?.trim().parse::<i64>().ok().map(|n| n * multiplier)
}
