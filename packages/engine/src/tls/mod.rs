//! TLS engine adapters
//!
//! Implementations of [`TlsEngine`](crate::engine::TlsEngine) over real TLS
//! stacks.

pub mod errors;
pub mod rustls_engine;

pub use errors::TlsError;
pub use rustls_engine::RustlsEngine;
