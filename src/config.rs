//! Client configuration and command-line parsing.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use lexopt::prelude::*;

use crate::error::{Error, Result};
use crate::transport::h2::frame::DEFAULT_MAX_FRAME_SIZE;

/// Default transport establishment deadline.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub const USAGE: &str = "\
Usage: client [options] <host> <port> <path> [path ...]

Options:
    --plaintext             HTTP/2 with prior knowledge over plain TCP
    --insecure              TLS without certificate verification
    -o, --output-dir <dir>  Directory for output files (default: .)
    --connect-timeout <s>   Connect timeout in seconds (default: 10)
    -v, --verbose           Debug logging
    -h, --help              Print this help";

/// How the transport is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// TLS with ALPN `h2`.
    Tls { verify: bool },
    /// HTTP/2 with prior knowledge over plain TCP.
    Plaintext,
}

impl Default for TlsMode {
    fn default() -> Self {
        TlsMode::Tls { verify: true }
    }
}

/// Everything a fetch session needs to run.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Resource paths, in request order.
    pub paths: Vec<String>,
    pub tls: TlsMode,
    pub output_dir: PathBuf,
    pub connect_timeout: Option<Duration>,
    /// Largest inbound frame payload accepted.
    pub max_frame_size: u32,
    pub verbose: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 443,
            paths: Vec::new(),
            tls: TlsMode::default(),
            output_dir: PathBuf::from("."),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            verbose: false,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Append a resource path to request.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self
    }

    pub fn tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn max_frame_size(mut self, size: u32) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Parse the process command line.
    pub fn from_env() -> Result<Self> {
        Self::parse(lexopt::Parser::from_env())
    }

    /// Parse an argument list (program name excluded).
    pub fn from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<OsString>,
    {
        Self::parse(lexopt::Parser::from_args(args))
    }

    fn parse(mut parser: lexopt::Parser) -> Result<Self> {
        let mut config = Self::default();
        let mut plaintext = false;
        let mut insecure = false;
        let mut positionals: Vec<String> = Vec::new();

        while let Some(arg) = parser.next().map_err(usage)? {
            match arg {
                Long("plaintext") => plaintext = true,
                Long("insecure") => insecure = true,
                Short('o') | Long("output-dir") => {
                    config.output_dir = PathBuf::from(parser.value().map_err(usage)?);
                }
                Long("connect-timeout") => {
                    let secs: u64 = parser.value().map_err(usage)?.parse().map_err(usage)?;
                    config.connect_timeout = (secs > 0).then(|| Duration::from_secs(secs));
                }
                Short('v') | Long("verbose") => config.verbose = true,
                Short('h') | Long("help") => return Err(Error::Usage(USAGE.to_string())),
                Value(value) => positionals.push(value.string().map_err(usage)?),
                _ => return Err(usage(arg.unexpected())),
            }
        }

        if positionals.len() < 3 {
            return Err(Error::Usage(USAGE.to_string()));
        }

        let mut positionals = positionals.into_iter();
        config.host = positionals.next().unwrap_or_default();
        let port = positionals.next().unwrap_or_default();
        config.port = match port.parse::<u16>() {
            Ok(p) if p > 0 => p,
            _ => return Err(Error::InvalidPort(port)),
        };
        config.paths = positionals.collect();

        config.tls = if plaintext {
            TlsMode::Plaintext
        } else {
            TlsMode::Tls { verify: !insecure }
        };

        Ok(config)
    }

    /// Authority sent in every request: the target host, without the port.
    /// IPv6 literals are bracketed.
    pub fn authority(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }
}

fn usage(err: impl std::fmt::Display) -> Error {
    Error::Usage(format!("{}\n\n{}", err, USAGE))
}
