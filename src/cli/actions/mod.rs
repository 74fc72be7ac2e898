use crate::collectors::arg::Arg;
use secrecy::SecretString;

pub mod run;

pub enum Action {
    Run {
        port: u16,
        listen: Option<String>,
        dsn: SecretString,
        collectors: Vec<String>,
        lock_wait_timeout: u64,
        log_slow_filter: bool,
        collect_overrides: Vec<(&'static str, Vec<Arg>)>,
    },
}
