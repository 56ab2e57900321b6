//! Domain layer - Pure data models.
//!
//! These types have no I/O dependencies and can be tested in isolation.

mod port;

// Re-export all domain types
pub use port::{PortRecord, PortStatus, ProcessOwner, Unresolved};
