//! Shared utility functions for culvert crates.

/// Timestamp utility functions
pub mod dates {
    use chrono::{DateTime, SecondsFormat, Utc};

    /// Format a timestamp as "YYYY-MM-DD HH:MM UTC" for reports.
    pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
        ts.format("%Y-%m-%d %H:%M UTC").to_string()
    }

    /// Format a timestamp as RFC 3339 with millisecond precision.
    pub fn format_rfc3339(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Parse an RFC 3339 timestamp, converting any offset to UTC.
    pub fn parse_rfc3339(s: &str) -> anyhow::Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(s.trim())?.with_timezone(&Utc))
    }

    /// Convert epoch milliseconds (as used in field-card ids) to a timestamp.
    pub fn from_epoch_millis(millis: i64) -> anyhow::Result<DateTime<Utc>> {
        DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| anyhow::anyhow!("epoch millis {} out of range", millis))
    }

}

/// Fixed-precision number formatting
pub mod format {
    /// Two decimal places, as used for areas, ratios, flows and velocities.
    pub fn two_dp(value: f64) -> String {
        format!("{:.2}", value)
    }

    /// Three decimal places, for factors that are usually close to 1.
    pub fn three_dp(value: f64) -> String {
        format!("{:.3}", value)
    }

    /// Integer millimetres, e.g. `1200 mm`.
    pub fn mm(value: u32) -> String {
        format!("{} mm", value)
    }

    /// Join a list of measurements at two decimal places, e.g. `1.50; 1.60`.
    pub fn measurement_list(values: &[f64]) -> String {
        values
            .iter()
            .map(|v| two_dp(*v))
            .collect::<Vec<_>>()
            .join("; ")
    }

}
