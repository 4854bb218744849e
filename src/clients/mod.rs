//! Upstream clients for monitoring instances

pub mod http_client;
pub mod session;

pub use http_client::{ApiRequest, SuiteApiClient};
pub use session::InstanceSession;
