//! Builder API
//!
//! Fluent configuration of the ALPN wrapper.

pub mod core;

pub use core::AlpnEngineBuilder;
