//! HTTP request and response models.

mod request;
mod response;

pub use request::{Request, RequestBuilder};
pub use response::HttpResponse;
