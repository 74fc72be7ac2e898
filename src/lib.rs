pub mod cli;
pub mod collectors;
pub mod config;
pub mod exporter;
pub mod extras;
pub mod instance;
pub mod parse;
pub mod telemetry;
