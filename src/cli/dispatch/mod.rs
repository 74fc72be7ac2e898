use crate::{
    cli::actions::Action,
    cli::commands::collectors::get_collect_overrides,
    collectors::{
        COLLECTOR_NAMES, Collector, all_factories,
        util::{get_excluded_databases, set_excluded_databases},
    },
};
use anyhow::{Result, anyhow};
use clap::ArgMatches;
use secrecy::SecretString;
use tracing::info;

/// # Errors
///
/// Returns an error if required arguments are missing or collector validation fails
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    // Initialize global excluded database list once from CLI/env
    init_excluded_databases(matches);

    info!("Excluded databases: {:?}", get_excluded_databases());

    // Get the port or return an error
    let port = matches
        .get_one::<u16>("port")
        .copied()
        .ok_or_else(|| anyhow!("Port is required. Please provide it using the --port flag."))?;

    // Get the listen address (None means auto-detect)
    let listen = matches
        .get_one::<String>("listen")
        .map(std::string::ToString::to_string);

    let dsn = resolve_dsn(matches)?;

    if let Some(extras_file) = matches.get_one::<String>("extras.file") {
        // SAFETY-equivalent: single-threaded CLI startup, before any other
        // task reads these vars.
        unsafe {
            std::env::set_var("MARIADB_EXPORTER_EXTRAS_FILE", extras_file);
        }
        if let Some(interval) = matches.get_one::<u64>("extras.refresh-interval") {
            unsafe {
                std::env::set_var("MARIADB_EXPORTER_EXTRAS_REFRESH_SECS", interval.to_string());
            }
        }
    }

    let lock_wait_timeout = matches
        .get_one::<u64>("exporter.lock-wait-timeout")
        .copied()
        .unwrap_or(2);
    let log_slow_filter = matches.get_flag("exporter.log-slow-filter");

    Ok(Action::Run {
        port,
        listen,
        dsn,
        collectors: get_enabled_collectors(matches),
        lock_wait_timeout,
        log_slow_filter,
        collect_overrides: get_collect_overrides(matches),
    })
}

/// Resolves the connection DSN from `--dsn` or, failing that,
/// `--config.my-cnf`.
///
/// # Errors
///
/// Returns an error if neither flag is set, or the credentials file cannot
/// be parsed.
fn resolve_dsn(matches: &ArgMatches) -> Result<SecretString> {
    if let Some(dsn) = matches.get_one::<String>("dsn") {
        return Ok(SecretString::from(dsn.clone()));
    }

    if let Some(path) = matches.get_one::<String>("config.my-cnf") {
        return crate::config::dsn_from_my_cnf(std::path::Path::new(path));
    }

    Err(anyhow!(
        "DSN is required. Provide --dsn or --config.my-cnf."
    ))
}

fn init_excluded_databases(matches: &ArgMatches) {
    // Collect values from Clap (supports --exclude-databases a,b and env)
    let excludes: Vec<String> = matches
        .get_many::<String>("exclude-databases")
        .map(|vals| {
            vals.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    // Set once globally for all collectors
    set_excluded_databases(excludes);
}

#[must_use]
pub fn get_enabled_collectors(matches: &ArgMatches) -> Vec<String> {
    let factories = all_factories();

    COLLECTOR_NAMES
        .iter()
        .filter(|&name| {
            let enable_flag = format!("collector.{name}");
            let disable_flag = format!("no-collector.{name}");

            // If explicitly disabled, skip it
            if matches.get_flag(&disable_flag) {
                return false;
            }

            // If explicitly enabled, include it
            if matches.get_flag(&enable_flag) {
                return true;
            }

            // Otherwise, check the collector's default setting
            factories.get(name).is_some_and(|factory| {
                let collector = factory();
                collector.enabled_by_default()
            })
        })
        .map(|&name| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn test_get_enabled_collectors_defaults() {
        let command = commands::new();
        let matches = command.get_matches_from(vec!["mariadb_exporter"]);
        let enabled = get_enabled_collectors(&matches);

        assert!(enabled.contains(&"default".to_string()));
    }

    #[test]
    fn test_get_enabled_collectors_explicit_enable() {
        let command = commands::new();
        let matches = command.get_matches_from(vec!["mariadb_exporter", "--collector.exporter"]);
        let enabled = get_enabled_collectors(&matches);

        assert!(enabled.contains(&"default".to_string()));
        assert!(enabled.contains(&"exporter".to_string()));
    }

    #[test]
    fn test_get_enabled_collectors_explicit_disable() {
        let command = commands::new();
        let matches = command.get_matches_from(vec!["mariadb_exporter", "--no-collector.default"]);
        let enabled = get_enabled_collectors(&matches);

        assert!(!enabled.contains(&"default".to_string()));
    }

    #[test]
    fn test_get_enabled_collectors_disable_all_defaults() {
        let command = commands::new();
        let matches = command.get_matches_from(vec!["mariadb_exporter", "--no-collector.default"]);
        let enabled = get_enabled_collectors(&matches);

        assert!(!enabled.contains(&"default".to_string()));
    }
}
