//! Connection establishment and HTTP/2 framing.
//!
//! - TCP, optionally wrapped in BoringSSL TLS with ALPN `h2`
//! - HTTP/2 frames and HPACK-coded messages on top of it

pub mod connector;
pub mod h2;
