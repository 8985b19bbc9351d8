//! IANA-registered ALPN protocol identifiers.

pub const HTTP_1_0: &str = "http/1.0";
pub const HTTP_1_1: &str = "http/1.1";
pub const H2: &str = "h2";
/// HTTP/2 over cleartext TCP; never valid inside TLS, listed for completeness.
pub const H2C: &str = "h2c";
pub const H3: &str = "h3";
pub const SPDY_3_1: &str = "spdy/3.1";
pub const ACME_TLS_1: &str = "acme-tls/1";
