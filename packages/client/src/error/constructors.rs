use super::types::{Error, Kind};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Creates an `Error` for a builder error.
pub fn builder<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Builder).with(e.into())
}

/// Creates an `Error` for a connection open failure.
pub fn connect<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Connect).with(e.into())
}

/// Creates an `Error` for an in-flight request failure.
pub fn request<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Request).with(e.into())
}

/// Creates an `Error` for a request timeout.
pub fn timeout<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Timeout).with(e.into())
}

/// Creates an `Error` for a client or server error status.
pub fn status_code(status: http::StatusCode, url: url::Url) -> Error {
    Error::new(Kind::Status(status)).with_url(url)
}

/// Creates an `Error` for a response unmarshalling failure.
pub fn decode<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Decode).with(e.into())
}

/// Creates an `Error` for a request body marshalling failure.
pub fn marshal<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Marshal).with(e.into())
}

/// Creates an `Error` for a submission to a shut-down pool.
pub fn rejected() -> Error {
    Error::new(Kind::Rejected)
}

/// Creates an `Error` for a cache store backend failure.
pub fn cache<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Cache).with(e.into())
}
