//! Authentication adapters.

mod refresh_endpoint;

pub use refresh_endpoint::HttpRefreshClient;
