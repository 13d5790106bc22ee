//! RFC 2616 freshness and revalidation over a pluggable entry store.

use chrono::{DateTime, Utc};
use http::Method;
use http::StatusCode;
use http::header::IF_NONE_MATCH;
use url::Url;

use super::cache_entry::CacheEntry;
use super::{Cache, CacheControl};
use crate::error::Result;
use crate::http::{HttpResponse, Request};

/// Storage capability underneath [`HttpCache`]: a map from request
/// identity (URL) to at most one [`CacheEntry`].
pub trait CacheStore: Send + Sync {
    fn find(&self, url: &Url) -> Option<CacheEntry>;
    fn delete(&self, url: &Url);
    fn delete_all(&self);
    fn create(&self, url: Url, entry: CacheEntry);
}

impl<T: CacheStore + ?Sized> CacheStore for std::sync::Arc<T> {
    fn find(&self, url: &Url) -> Option<CacheEntry> {
        (**self).find(url)
    }

    fn delete(&self, url: &Url) {
        (**self).delete(url);
    }

    fn delete_all(&self) {
        (**self).delete_all();
    }

    fn create(&self, url: Url, entry: CacheEntry) {
        (**self).create(url, entry);
    }
}

/// The cache validity engine, implementing RFC 2616 §14.9 for GET
/// requests over any [`CacheStore`].
pub struct HttpCache<S> {
    store: S,
}

impl<S: CacheStore> HttpCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Expiry is governed by one freshness signal, in priority order:
    /// `s-maxage`, then `max-age`, then `Expires`. An entry with none of
    /// the three only leaves the store through explicit invalidation or
    /// eviction.
    fn is_expired(entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        let cc = entry.cache_control();
        if let Some(seconds) = cc.and_then(|cc| cc.s_max_age) {
            return (now - entry.date()).num_milliseconds() > seconds as i64 * 1000;
        }
        if let Some(seconds) = cc.and_then(|cc| cc.max_age) {
            return (now - entry.date()).num_milliseconds() > seconds as i64 * 1000;
        }
        if let Some(expires) = entry.expires() {
            return now > expires;
        }
        false
    }
}

impl<S: CacheStore> Cache for HttpCache<S> {
    fn get(&self, request: &Request) -> Option<HttpResponse> {
        // This cache manages validity itself; keep the transport layer
        // out of the picture.
        request.connection(|conn| conn.set_use_caches(false));

        if request.method() != Method::GET {
            return None;
        }
        let entry = self.store.find(request.url())?;

        if request
            .cache_control()
            .is_some_and(|cc| cc.only_if_cached)
        {
            return Some(entry.response().clone());
        }

        if let Some(etag) = entry.etag() {
            request.insert_header(IF_NONE_MATCH, etag);
        }

        if entry.cache_control().is_some_and(|cc| {
            cc.must_revalidate || cc.proxy_revalidate || cc.no_cache
        }) {
            return None;
        }

        if Self::is_expired(&entry, Utc::now()) {
            // Without an entity tag there is nothing left to revalidate.
            if entry.etag().is_none() {
                tracing::debug!(target: "restq::cache", url = %request.url(), "evicting expired entry");
                self.store.delete(request.url());
            }
            return None;
        }

        tracing::debug!(target: "restq::cache", url = %request.url(), "cache hit");
        Some(entry.response().clone())
    }

    fn put(&self, request: &Request, response: &HttpResponse) {
        if request.method() != Method::GET {
            return;
        }

        if response.status() == StatusCode::NOT_MODIFIED
            && let Some(entry) = self.store.find(request.url())
        {
            // The round trip revalidated the stored body; hand it back to
            // the request and leave the store untouched.
            tracing::debug!(target: "restq::cache", url = %request.url(), "304, reusing stored response");
            request.set_response(entry.response().clone());
            return;
        }

        let entry = CacheEntry::new(response.clone());
        match entry.cache_control() {
            None => return,
            Some(CacheControl { no_store: true, .. }) => return,
            Some(_) => {}
        }
        self.store.create(request.url().clone(), entry);
    }

    fn clear(&self) -> Result<()> {
        self.store.delete_all();
        Ok(())
    }
}
