use crate::parse::parse_status;
use anyhow::Result;
use prometheus::{Gauge, IntGauge};
use sqlx::MySqlPool;
use sqlx::Row;
use tracing::{debug, info_span, instrument};
use tracing_futures::Instrument as _;

/// Collector for primary binlog metrics (SHOW BINARY LOGS).
#[derive(Clone)]
pub struct BinlogCollector {
    binlog_files: IntGauge,
    binlog_size_bytes: Gauge,
    binlog_file_number: Gauge,
}

impl BinlogCollector {
    #[must_use]
    #[allow(clippy::expect_used)]
    /// Create a new binlog collector.
    ///
    /// # Panics
    ///
    /// Panics if metric names are invalid (should not occur with static names).
    pub fn new() -> Self {
        Self {
            binlog_files: IntGauge::new(
                "mysql_binlog_files",
                "Number of binlog files on primary (requires binary logging)",
            )
            .expect("valid mysql_binlog_files metric"),
            binlog_size_bytes: Gauge::new(
                "mysql_binlog_size_bytes",
                "Combined size in bytes of all binlog files on primary",
            )
            .expect("valid mysql_binlog_size_bytes metric"),
            binlog_file_number: Gauge::new(
                "mysql_binlog_file_number",
                "Trailing numeric suffix of the most recent binlog file name",
            )
            .expect("valid mysql_binlog_file_number metric"),
        }
    }

    /// Get binlog files metric.
    #[must_use]
    pub const fn binlog_files(&self) -> &IntGauge {
        &self.binlog_files
    }

    #[must_use]
    pub const fn binlog_size_bytes(&self) -> &Gauge {
        &self.binlog_size_bytes
    }

    #[must_use]
    pub const fn binlog_file_number(&self) -> &Gauge {
        &self.binlog_file_number
    }

    /// Collect binlog metrics from SHOW BINARY LOGS.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails (though queries are best-effort).
    #[instrument(skip(self, pool), level = "debug", fields(sub_collector = "binlog"))]
    pub async fn collect(&self, pool: &MySqlPool) -> Result<()> {
        let span = info_span!(
            "db.query",
            db.system = "mysql",
            db.operation = "SHOW",
            db.statement = "SHOW BINARY LOGS",
            otel.kind = "client"
        );

        match sqlx::query("SHOW BINARY LOGS")
            .fetch_all(pool)
            .instrument(span)
            .await
        {
            Ok(rows) => {
                self.binlog_files
                    .set(i64::try_from(rows.len()).unwrap_or(i64::MAX));

                let mut total_size = 0f64;
                let mut last_name = None;
                for row in &rows {
                    if let Ok(size) = row.try_get::<i64, _>("File_size") {
                        total_size += size as f64;
                    }
                    if let Ok(name) = row.try_get::<String, _>("Log_name") {
                        last_name = Some(name);
                    }
                }
                self.binlog_size_bytes.set(total_size);

                if let Some(name) = last_name {
                    let (number, ok) = parse_status(&name);
                    if ok {
                        self.binlog_file_number.set(number);
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, "binary logging likely disabled; skipping binlog count");
                self.binlog_files.set(0);
                self.binlog_size_bytes.set(0.0);
            }
        }

        Ok(())
    }
}

impl Default for BinlogCollector {
    fn default() -> Self {
        Self::new()
    }
}
