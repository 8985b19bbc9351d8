use super::BoxError;
use super::helpers::{MissingCapability, NotYetNegotiated, UnsupportedOperation};
use super::types::{Error, Kind};

/// Creates an `Error` for a rejected configuration.
pub fn configuration<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Configuration).with(e.into())
}

/// Creates an `Error` for a fatal handshake failure.
pub fn handshake<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Handshake).with(e.into())
}

/// Creates an `Error` for an engine that lacks a required capability.
pub fn environment(capability: &'static str) -> Error {
    Error::new(Kind::Environment).with(MissingCapability(capability))
}

/// Creates an `Error` wrapping a failure reported by the underlying engine.
pub fn engine<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Engine).with(e.into())
}

/// Creates an `Error` for an operation the active strategy cannot perform.
pub fn unsupported(operation: &'static str) -> Error {
    Error::new(Kind::Unsupported).with(UnsupportedOperation(operation))
}

/// Creates an `Error` for a negotiated-protocol query made mid-handshake.
pub fn not_negotiated() -> Error {
    Error::new(Kind::NotNegotiated).with(NotYetNegotiated)
}
