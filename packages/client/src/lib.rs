//! # RestQ client engine
//!
//! Cache-aware HTTP request execution: a fixed-size worker pool runs
//! cancelable, retryable requests; an interceptor chain wraps every
//! execution attempt; and an RFC 2616 validity engine serves and
//! revalidates GET responses from pluggable cache stores.
//!
//! Raw transport is injected through the [`connect`] SPI; this crate
//! never opens sockets itself.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use restq_client::prelude::*;
//!
//! fn connector() -> Arc<dyn Connector> {
//!     unimplemented!("bring your own transport")
//! }
//!
//! # fn main() -> restq_client::Result<()> {
//! let pool = RequestPool::builder()
//!     .core_pool_size(4)
//!     .cache(HttpCache::new(LruStore::new(128)))
//!     .connector(connector())
//!     .build()?;
//!
//! let request = Request::builder("https://api.example.com/models".parse().unwrap())
//!     .cacheable()
//!     .retry(2)
//!     .on_success(|body, _response| println!("got {body:?}"))
//!     .on_error(|error, _response| eprintln!("failed: {error}"))
//!     .build();
//! pool.execute(request)?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod connect;
pub mod error;
pub mod handler;
pub mod http;
pub mod marshal;
pub mod middleware;
pub mod pool;

pub mod prelude;

pub use crate::prelude::*;
