//! # RestQ
//!
//! Cache-aware HTTP request engine with a fluent builder API. Requests
//! run on a fixed worker pool, retry on failure, can be canceled one by
//! one or purged in bulk, and GET responses are cached and revalidated
//! per RFC 2616.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use restq::prelude::*;
//!
//! fn connector() -> Arc<dyn Connector> {
//!     unimplemented!("bring your own transport")
//! }
//!
//! # fn main() -> restq::Result<()> {
//! #[derive(serde::Deserialize)]
//! struct Model {
//!     name: String,
//! }
//!
//! let pool = RequestPool::builder()
//!     .cache(HttpCache::new(LruStore::new(128)))
//!     .connector(connector())
//!     .build()?;
//!
//! let request = Rest::with(&pool)
//!     .headers([("authorization", "Bearer sk-...")])
//!     .cacheable()
//!     .retry(2)
//!     .on_json(|model: Model, _response| println!("model: {}", model.name))
//!     .on_error(|error, _response| eprintln!("failed: {error}"))
//!     .get("https://api.example.com/model")?;
//!
//! // The returned handle cancels the request if it is no longer wanted.
//! request.cancel();
//! # Ok(())
//! # }
//! ```

pub mod builder;

pub mod prelude;

pub use crate::prelude::*;

/// Fluent entry point alias.
pub type Rest = builder::RestBuilder;
