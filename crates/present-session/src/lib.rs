//! Session multiplexing for connected clients.
//!
//! A `Session` owns every execution started over one connection. Frames are
//! decoded, dispatched to the orchestrator by id, and the tagged events of all
//! executions are encoded back onto the same connection.

pub mod error;
pub mod session;

pub use error::SessionError;
pub use session::Session;
