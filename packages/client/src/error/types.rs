use std::error::Error as StdError;
use std::fmt;

use http::StatusCode;

/// A `Result` alias where the `Err` case is `restq_client::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors produced while scheduling, executing or delivering a
/// request.
#[derive(Clone)]
pub struct Error {
    inner: Box<Inner>,
}

struct Inner {
    kind: Kind,
    source: Option<Box<dyn StdError + Send + Sync>>,
    url: Option<url::Url>,
}

impl Clone for Inner {
    fn clone(&self) -> Self {
        Inner {
            kind: self.kind.clone(),
            source: None, // trait-object sources cannot be cloned
            url: self.url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Kind {
    /// Invalid request or pool configuration.
    Builder,
    /// Connection/connector creation failure. Reported straight to the
    /// error callback, never retried.
    Connect,
    /// I/O failure while writing or reading an in-flight request.
    Request,
    /// Request or response timeout.
    Timeout,
    /// The origin answered with a client or server error status. The
    /// diagnostic body is still captured on the request.
    Status(StatusCode),
    /// Response body could not be unmarshalled into a typed value.
    Decode,
    /// Request body value has no registered marshaller.
    Marshal,
    /// Submission to a pool that has been shut down.
    Rejected,
    /// Cache store backend failure.
    Cache,
}

impl Error {
    pub(crate) fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                url: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub(crate) fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        self.inner.source = Some(source.into());
        self
    }

    #[must_use]
    pub(crate) fn with_url(mut self, url: url::Url) -> Self {
        self.inner.url = Some(url);
        self
    }

    pub fn kind(&self) -> &Kind {
        &self.inner.kind
    }

    /// The URL associated with this error, if any.
    #[must_use]
    pub fn url(&self) -> Option<&url::Url> {
        self.inner.url.as_ref()
    }

    /// The HTTP status that produced this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self.inner.kind {
            Kind::Status(code) => Some(code),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self.inner.kind, Kind::Connect)
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.inner.kind, Kind::Timeout)
    }

    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self.inner.kind, Kind::Status(_))
    }

    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self.inner.kind, Kind::Decode)
    }

    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self.inner.kind, Kind::Rejected)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("restq::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref url) = self.inner.url {
            f.field("url", url);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.kind {
            Kind::Builder => f.write_str("builder error"),
            Kind::Connect => f.write_str("connection open error"),
            Kind::Request => f.write_str("error sending request"),
            Kind::Timeout => f.write_str("request timeout"),
            Kind::Decode => f.write_str("error decoding response body"),
            Kind::Marshal => f.write_str("error marshalling request body"),
            Kind::Rejected => f.write_str("request rejected: pool is shut down"),
            Kind::Cache => f.write_str("cache store error"),
            Kind::Status(code) => {
                let prefix = if code.is_client_error() {
                    "HTTP status client error"
                } else {
                    "HTTP status server error"
                };
                write!(f, "{prefix} ({code})")
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
