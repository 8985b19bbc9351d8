pub mod classification;
pub mod constructors;
pub mod conversions;
pub mod helpers;
pub mod types;

// Re-export main types and functions
pub use constructors::*;
pub use helpers::{MissingCapability, NotYetNegotiated, TranscriptMismatch, UnsupportedOperation};
pub use types::{Error, Kind, Result};

// Errors surfaced by the underlying TLS engine
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
