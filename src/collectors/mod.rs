use anyhow::Result;
use futures::future::BoxFuture;
use prometheus::Registry;
use sqlx::MySqlPool;
use std::collections::HashMap;

use arg::{Arg, ArgDef};

#[macro_use]
mod register_macro;

pub trait Collector {
    fn name(&self) -> &'static str;

    /// Register metrics with the prometheus registry
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails
    fn register_metrics(&self, registry: &Registry) -> Result<()>;

    // lifetime 'a is needed to tie the future to the lifetime of self and pool
    fn collect<'a>(&'a self, pool: &'a MySqlPool) -> BoxFuture<'a, Result<()>>;

    fn enabled_by_default(&self) -> bool {
        false
    }

    /// Minimum server version (expressed as `major.minor`, e.g. `10.6`)
    /// required for this collector to run. `0.0` means "always eligible".
    fn min_version(&self) -> f64 {
        0.0
    }

    /// Declares the tunable arguments this collector accepts beyond its
    /// enable/disable flag. Empty by default.
    fn arg_defs(&self) -> &'static [ArgDef] {
        &[]
    }

    /// Applies configuration parsed from CLI flags or another source.
    ///
    /// # Errors
    ///
    /// Returns an error if `args` contains an unknown name or a value that
    /// fails the collector's own validation.
    fn configure(&self, _args: &[Arg]) -> Result<()> {
        Ok(())
    }
}

// Make utils available to all collectors (exclusions, etc.)
pub mod util;

// Typed Arg/ArgDef model used by Collector::{arg_defs, configure}.
pub mod arg;

// THIS IS THE ONLY PLACE YOU NEED TO ADD NEW COLLECTORS
register_collectors! {
    default => DefaultCollector,
    exporter => ExporterCollector,
    tls => TlsCollector,
    query_response_time => QueryResponseTimeCollector,
    audit => AuditCollector,
    statements => StatementsCollector,
    schema => SchemaCollector,
    replication => ReplicationCollector,
    locks => LocksCollector,
    metadata => MetadataCollector,
    userstat => UserStatCollector,
    innodb => InnodbCollector,
    galera => GaleraCollector,
    // Add more collectors here -- just follow the same pattern!
}

pub mod config;
pub mod registry;
