//! Typed argument model used to configure a collector at runtime, on top of
//! its static enable/disable flag.
//!
//! A collector that needs tunables (a threshold, a table name, a digest
//! limit) declares a small set of [`ArgDef`]s; the CLI layer turns each one
//! into a `--collect.<name>.<arg>` flag and feeds the parsed [`Arg`] values
//! back through [`crate::collectors::Collector::configure`].

use anyhow::{Result, anyhow};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgKind {
    Bool,
    Int,
    Float,
    String,
}

#[derive(Clone, Debug)]
pub struct ArgDef {
    pub name: &'static str,
    pub kind: ArgKind,
    pub default: &'static str,
    pub help: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

#[derive(Clone, Debug)]
pub struct Arg {
    pub name: String,
    pub value: ArgValue,
}

impl Arg {
    #[must_use]
    pub fn new(name: impl Into<String>, value: ArgValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl ArgDef {
    /// Parses a raw CLI string into an [`ArgValue`] according to this
    /// definition's declared `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` cannot be parsed as the declared kind.
    pub fn parse(&self, raw: &str) -> Result<ArgValue> {
        match self.kind {
            ArgKind::Bool => raw
                .parse::<bool>()
                .map(ArgValue::Bool)
                .map_err(|_| anyhow!("arg '{}': '{raw}' is not a bool", self.name)),
            ArgKind::Int => raw
                .parse::<i64>()
                .map(ArgValue::Int)
                .map_err(|_| anyhow!("arg '{}': '{raw}' is not an integer", self.name)),
            ArgKind::Float => raw
                .parse::<f64>()
                .map(ArgValue::Float)
                .map_err(|_| anyhow!("arg '{}': '{raw}' is not a float", self.name)),
            ArgKind::String => Ok(ArgValue::String(raw.to_string())),
        }
    }
}

/// Finds the definition matching `arg.name` and rejects anything unknown.
/// Concrete collectors call this at the top of `configure()` before acting
/// on the parsed values.
///
/// # Errors
///
/// Returns an error if `args` references a name not present in `defs`.
pub fn validate_against(defs: &[ArgDef], args: &[Arg]) -> Result<()> {
    for arg in args {
        if !defs.iter().any(|d| d.name == arg.name) {
            return Err(anyhow!("unknown argument '{}'", arg.name));
        }
    }
    Ok(())
}
