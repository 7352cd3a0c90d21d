pub mod client;
pub mod error;
pub mod http;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transport;

pub use client::ApiClient;
pub use error::{ApiError, TransportError};
pub use harvest_api;
pub use http::{HttpClient, HttpRequest, HttpResponse, Method, SessionHooks, Transport};
pub use transport::ReqwestTransport;
