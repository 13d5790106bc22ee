//! `Cache-Control` directive parsing (RFC 2616 §14.9, GET subset).

use http::HeaderMap;
use http::header::CACHE_CONTROL;

/// Parsed `Cache-Control` directives of a request or response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    pub no_cache: bool,
    pub no_store: bool,
    pub no_transform: bool,
    pub must_revalidate: bool,
    pub proxy_revalidate: bool,
    pub public: bool,
    pub private: bool,
    pub only_if_cached: bool,
    /// `max-age` in seconds.
    pub max_age: Option<u64>,
    /// `s-maxage` in seconds. Takes priority over `max-age` and `Expires`
    /// in the freshness computation.
    pub s_max_age: Option<u64>,
}

impl CacheControl {
    /// Parse the `Cache-Control` header out of a header map.
    ///
    /// Exactly one header value is required; a missing header, repeated
    /// headers or a malformed numeric directive all yield `None`, which
    /// downstream store logic treats as "do not cache".
    pub fn parse(headers: &HeaderMap) -> Option<CacheControl> {
        let mut values = headers.get_all(CACHE_CONTROL).iter();
        let value = values.next()?;
        if values.next().is_some() {
            return None;
        }
        let value = value.to_str().ok()?;

        let mut cc = CacheControl::default();
        for directive in value.split(',') {
            let directive = directive.trim();
            if directive.starts_with("no-cache") {
                cc.no_cache = true;
            } else if directive.starts_with("no-store") {
                cc.no_store = true;
            } else if directive.starts_with("no-transform") {
                cc.no_transform = true;
            } else if directive.starts_with("must-revalidate") {
                cc.must_revalidate = true;
            } else if directive.starts_with("proxy-revalidate") {
                cc.proxy_revalidate = true;
            } else if directive.starts_with("public") {
                cc.public = true;
            } else if directive.starts_with("private") {
                cc.private = true;
            } else if directive.starts_with("only-if-cached") {
                cc.only_if_cached = true;
            } else if let Some(seconds) = directive.strip_prefix("max-age=") {
                cc.max_age = Some(seconds.parse().ok()?);
            } else if let Some(seconds) = directive.strip_prefix("s-maxage=") {
                cc.s_max_age = Some(seconds.parse().ok()?);
            }
        }
        Some(cc)
    }
}
