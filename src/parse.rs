//! Coercion of raw MySQL/MariaDB status-style text values into floats.
//!
//! `SHOW [GLOBAL] STATUS`, `SHOW SLAVE STATUS` and similar commands return
//! every value as text, including booleans spelled `ON`/`OFF`/`Yes`/`No` and
//! replication states spelled as words. This module centralizes the coercion
//! rules so every collector applies them identically.

/// Parses a raw status-style cell into `(value, ok)`.
///
/// `ok` is `false` when no rule below applied and the raw text also failed to
/// parse as a plain float; in that case `value` is `0.0` and the caller
/// should skip emitting a sample rather than publish a misleading zero.
#[must_use]
pub fn parse_status(raw: &str) -> (f64, bool) {
    let trimmed = raw.trim();

    match trimmed {
        "Yes" | "ON" | "on" => return (1.0, true),
        "No" | "OFF" | "off" => return (0.0, true),
        "Connecting" => return (0.0, true),
        "Primary" => return (1.0, true),
        "Non-Primary" | "Disconnected" => return (0.0, true),
        _ => {}
    }

    if let Some(n) = trailing_digits_after_dot(trimmed) {
        return (n, true);
    }

    trimmed.parse::<f64>().map_or((0.0, false), |v| (v, true))
}

/// Parses a `Y`/`N` privilege flag cell (as seen in `mysql.user` rows) into
/// `(value, ok)`. Anything else is reported as not-ok with a sentinel `-1.0`
/// so callers can distinguish "explicitly absent" from "unparseable".
#[must_use]
pub fn parse_privilege(raw: &str) -> (f64, bool) {
    match raw.trim() {
        "Y" => (1.0, true),
        "N" => (0.0, true),
        _ => (-1.0, false),
    }
}

/// Extracts the trailing run of digits following the last `.` in strings
/// shaped like binlog file names (`mysql-bin.000123`). Returns `None` unless
/// the value contains a dot followed only by ASCII digits to the end.
fn trailing_digits_after_dot(s: &str) -> Option<f64> {
    let (_, suffix) = s.rsplit_once('.')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse::<f64>().ok()
}
