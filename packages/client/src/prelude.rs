//! The canonical types end users interact with.

// Request/response model
pub use crate::http::{HttpResponse, Request, RequestBuilder};

// Error types
pub use crate::error::{Error, Kind, Result};

// Worker pool and delivery contexts
pub use crate::pool::{
    Dispatcher, InlineDispatcher, RequestPool, RequestPoolBuilder, SerialDispatcher,
};

// Caching
pub use crate::cache::{
    Cache, CacheControl, CacheEntry, CacheStore, DiskCache, HttpCache, LruStore, PlatformCache,
};

// Interceptors and response handlers
pub use crate::handler::{CallbackPolicy, ResponseHandler, RetryPolicy};
pub use crate::middleware::{
    CacheInterceptor, LoggingInterceptor, PreFlow, RequestInterceptor, ResponseInterceptor,
};

// Marshalling
pub use crate::marshal::{Body, MarshalRegistry, Marshaller};

// Transport SPI
pub use crate::connect::{Connection, Connector, Payload, TransportSecurity};

// HTTP standard types from the http crate (Extensions is the
// interceptor context type)
pub use ::http::{Extensions, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

// URL handling
pub use url::Url;
