//! Transport layer for presentation clients.
//!
//! Provides:
//! - Cluster CLI access for CRD introspection
//! - WebSocket transport bridging connections to sessions (feature: http)
//! - `/crd/` endpoint and static asset router (feature: http)

pub mod cluster;

#[cfg(feature = "http")]
pub mod crd;

#[cfg(feature = "http")]
pub mod router;

#[cfg(feature = "http")]
pub mod websocket;

pub use cluster::{ClusterCli, ClusterError, KubectlCli};

#[cfg(feature = "http")]
pub use router::{AppState, router};
