//! Immutable cached-response snapshot.

use chrono::{DateTime, Utc};
use http::HeaderMap;
use http::header::{DATE, ETAG, EXPIRES};

use super::cache_control::CacheControl;
use super::http_date::httpdate;
use crate::http::HttpResponse;

/// A cached response plus the metadata the freshness engine needs.
///
/// Built once from a stored response and never mutated; replacing a cached
/// response means replacing the whole entry.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    response: HttpResponse,
    etag: Option<String>,
    cache_control: Option<CacheControl>,
    date: DateTime<Utc>,
    expires: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn new(response: HttpResponse) -> Self {
        let etag = single_header(response.headers(), &ETAG);
        let cache_control = CacheControl::parse(response.headers());
        let date = single_header(response.headers(), &DATE)
            .and_then(|v| httpdate::parse_http_date(&v).ok())
            .unwrap_or_else(Utc::now);
        let expires = single_header(response.headers(), &EXPIRES).map(|v| {
            // An unparsable Expires means "already expired", per RFC 2616.
            httpdate::parse_http_date(&v).unwrap_or(DateTime::UNIX_EPOCH)
        });
        Self {
            response,
            etag,
            cache_control,
            date,
            expires,
        }
    }

    pub fn response(&self) -> &HttpResponse {
        &self.response
    }

    /// The entity tag, when the response carried exactly one.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn cache_control(&self) -> Option<&CacheControl> {
        self.cache_control.as_ref()
    }

    /// The response `Date`, falling back to capture time when the header
    /// is missing, repeated or unparsable.
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn expires(&self) -> Option<DateTime<Utc>> {
        self.expires
    }
}

/// Value of a header that appears exactly once, else `None`.
fn single_header(headers: &HeaderMap, name: &http::header::HeaderName) -> Option<String> {
    let mut values = headers.get_all(name).iter();
    let value = values.next()?;
    if values.next().is_some() {
        return None;
    }
    value.to_str().ok().map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http::{HeaderValue, StatusCode};

    use super::*;

    fn response(headers: &[(&'static str, &str)]) -> HttpResponse {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.append(
                http::header::HeaderName::from_static(name),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        HttpResponse::new(StatusCode::OK, map, Bytes::from_static(b"{}"))
    }

    #[test]
    fn extracts_single_etag_only() {
        let entry = CacheEntry::new(response(&[("etag", "\"v1\"")]));
        assert_eq!(entry.etag(), Some("\"v1\""));

        let entry = CacheEntry::new(response(&[("etag", "\"v1\""), ("etag", "\"v2\"")]));
        assert_eq!(entry.etag(), None);

        let entry = CacheEntry::new(response(&[]));
        assert_eq!(entry.etag(), None);
    }

    #[test]
    fn date_falls_back_to_capture_time() {
        let before = Utc::now();
        let entry = CacheEntry::new(response(&[("date", "not a date")]));
        assert!(entry.date() >= before);

        let entry = CacheEntry::new(response(&[("date", "Sun, 06 Nov 1994 08:49:37 GMT")]));
        assert_eq!(
            httpdate::fmt_http_date(entry.date()),
            "Sun, 06 Nov 1994 08:49:37 GMT"
        );
    }

    #[test]
    fn unparsable_expires_is_epoch() {
        let entry = CacheEntry::new(response(&[("expires", "-1")]));
        assert_eq!(entry.expires(), Some(DateTime::UNIX_EPOCH));

        let entry = CacheEntry::new(response(&[]));
        assert_eq!(entry.expires(), None);
    }

    #[test]
    fn parses_response_cache_control() {
        let entry = CacheEntry::new(response(&[("cache-control", "max-age=10")]));
        assert_eq!(entry.cache_control().unwrap().max_age, Some(10));
    }
}
