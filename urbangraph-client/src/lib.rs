//! Urban Topology HTTP client and graph-load orchestration.
//!
//! Wraps the backend's city/region/graph endpoints in a typed [`ApiClient`]
//! and drives graph fetches through [`GraphLoader`]: request validation,
//! a per-request result cache, a bounded retry policy and stale-result
//! protection. Parsing and modeling live in `urbangraph-core`; this crate
//! owns everything that touches the network.

pub mod api;
pub mod error;
pub mod orchestrator;

pub use api::{ApiClient, ClientConfig, GraphBackend, DEFAULT_BASE_URL};
pub use error::{ApiError, LoadError};
pub use orchestrator::{GraphLoader, MapSelection, RETRY_BUDGET};
