//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the session coordinator and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod http_transport;
mod refresh_client;
mod storage;

pub use clock::{Clock, ManualClock};
pub use http_transport::{HttpTransport, TransportError};
pub use refresh_client::{RefreshClient, RefreshGrant};
pub use storage::{KeyValueStorage, StorageError};
