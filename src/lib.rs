//! # h2fetch
//!
//! Multiplexed HTTP/2 GET client.
//!
//! One connection carries one stream per requested resource. Response
//! bodies are written to one output file per resource, named after the
//! path with every `/` replaced by `-`.
//!
//! ```no_run
//! use h2fetch::{ClientConfig, TlsMode};
//!
//! # async fn example() -> h2fetch::Result<()> {
//! let config = ClientConfig::new("example.com", 443)
//!     .path("/index.html")
//!     .path("/style.css")
//!     .tls(TlsMode::Tls { verify: true });
//! let summary = h2fetch::client::run(&config).await?;
//! for stream in summary {
//!     println!("{} -> {:?}", stream.resource_path, stream.response_status);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod transport;

// Re-exports
pub use config::{ClientConfig, TlsMode};
pub use error::{Error, Result};
pub use session::{Session, StreamStatus, StreamSummary};
