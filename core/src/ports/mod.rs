//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interface the engine uses to talk to the host
//! operating system. Implementations live in `adapters`.

mod platform;

pub use platform::{CommandError, LookupMode, ProcessPlatform};
