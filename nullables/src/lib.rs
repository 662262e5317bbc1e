//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies are abstracted behind traits; this crate provides
//! test implementations that never touch the network and can be controlled
//! programmatically.

pub mod network;

pub use network::{NullNetwork, SendBehaviour};
