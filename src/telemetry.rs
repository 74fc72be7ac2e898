//! Logging and (optional) distributed-trace export setup.
//!
//! Every collector already emits `tracing` spans for its SQL calls; this
//! module just decides where those spans go: stderr as human-readable text
//! by default, JSON when `--log.json` is set, and additionally to an OTLP
//! collector when `--otel.endpoint` (or `OTEL_EXPORTER_OTLP_ENDPOINT`) is
//! configured.

use anyhow::Result;
use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Initializes the global `tracing` subscriber.
///
/// # Errors
///
/// Returns an error if the OTLP exporter fails to build, or if a global
/// subscriber has already been installed.
pub fn init(filter: &str, json: bool, otel_endpoint: Option<&str>) -> Result<()> {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    let subscriber = Registry::default().with(env_filter).with(fmt_layer);

    if let Some(endpoint) = otel_endpoint {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?;

        let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .build();

        let tracer = provider.tracer("mariadb_exporter");
        global::set_tracer_provider(provider.clone());

        subscriber
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .try_init()?;
    } else {
        subscriber.try_init()?;
    }

    Ok(())
}
