use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse SSL certificate timestamp from `MariaDB` format.
///
/// `MariaDB` returns timestamps in format: `"Nov 28 05:59:29 2035 GMT"`
/// or `"May 24 11:46:23 2020 GMT"`
///
/// # Errors
///
/// Returns an error if the timestamp string cannot be parsed.
pub fn parse_ssl_timestamp(timestamp_str: &str) -> Result<f64> {
    // Parse the timestamp string
    // Format: "Nov 28 05:59:29 2035 GMT"
    let dt = NaiveDateTime::parse_from_str(timestamp_str, "%b %d %H:%M:%S %Y GMT")
        .or_else(|_| {
            // Try alternative format without GMT suffix
            NaiveDateTime::parse_from_str(
                timestamp_str.trim_end_matches(" GMT"),
                "%b %d %H:%M:%S %Y",
            )
        })
        .map_err(|e| anyhow::anyhow!("Failed to parse timestamp '{timestamp_str}': {e}"))?;

    // Convert to UTC DateTime
    let utc_dt: DateTime<Utc> = DateTime::from_naive_utc_and_offset(dt, Utc);

    // Return Unix timestamp as f64
    // Note: i64 to f64 conversion is safe for timestamps in the valid range
    // (years ~1677-2262), precision loss only matters for nanoseconds
    #[allow(clippy::cast_precision_loss)]
    Ok(utc_dt.timestamp() as f64)
}
