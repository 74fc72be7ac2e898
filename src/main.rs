use anyhow::Result;
use mariadb_exporter::cli::{actions::run, commands, dispatch};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = commands::new().get_matches();

    let log_filter = matches
        .get_one::<String>("log.level")
        .cloned()
        .unwrap_or_else(|| "info".to_string());
    let json_logs = matches.get_flag("json-logs");
    let otel_endpoint = matches.get_one::<String>("otel.endpoint").cloned();

    mariadb_exporter::telemetry::init(&log_filter, json_logs, otel_endpoint.as_deref())?;

    let action = dispatch::handler(&matches)?;
    run::handle(action).await
}
