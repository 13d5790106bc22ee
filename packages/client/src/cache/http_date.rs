//! HTTP date parsing and formatting.
//!
//! Accepts the RFC 7231 date formats (IMF-fixdate preferred, RFC 850 and
//! asctime for legacy senders) with an RFC 2822 fallback.

/// HTTP date parsing error.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unrecognized HTTP date format: {0}")]
pub struct HttpDateParseError(pub String);

/// HTTP date parsing utilities.
pub mod httpdate {
    use chrono::{DateTime, NaiveDateTime, Utc};

    use super::HttpDateParseError;

    /// Parse an HTTP date string into a UTC timestamp.
    pub fn parse_http_date(date_str: &str) -> Result<DateTime<Utc>, HttpDateParseError> {
        // IMF-fixdate (RFC 7231 preferred): "Sun, 06 Nov 1994 08:49:37 GMT"
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, "%a, %d %b %Y %H:%M:%S GMT") {
            return Ok(dt.and_utc());
        }

        // RFC 850 with a 2-digit year: "Sunday, 06-Nov-94 08:49:37 GMT"
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, "%A, %d-%b-%y %H:%M:%S GMT") {
            return Ok(dt.and_utc());
        }

        // ANSI C asctime(), no timezone: "Sun Nov  6 08:49:37 1994"
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, "%a %b %e %H:%M:%S %Y") {
            return Ok(dt.and_utc());
        }

        // RFC 2822 fallback covers numeric-offset senders.
        if let Ok(dt) = DateTime::parse_from_rfc2822(date_str) {
            return Ok(dt.with_timezone(&Utc));
        }

        Err(HttpDateParseError(date_str.to_owned()))
    }

    /// Format a UTC timestamp as an IMF-fixdate string.
    pub fn fmt_http_date(time: DateTime<Utc>) -> String {
        time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
    }

}
