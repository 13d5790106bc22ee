//! Everything needed to configure a pool and issue requests.

pub use restq_client::prelude::*;

pub use crate::builder::RestBuilder;
pub use crate::Rest;
