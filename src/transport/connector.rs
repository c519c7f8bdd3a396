//! BoringSSL TLS connector.

use boring::ssl::{SslConnector, SslMethod, SslVerifyMode, SslVersion};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_boring::SslStream;

use crate::config::TlsMode;
use crate::error::Error;

/// Negotiated ALPN protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlpnProtocol {
    /// HTTP/2 ("h2")
    H2,
    /// Anything else, or no ALPN at all.
    Unknown,
}

/// Stream that can be either plain TCP or TLS.
#[derive(Debug)]
pub enum MaybeHttpsStream {
    /// Plain TCP stream (prior-knowledge h2c).
    Http(TcpStream),
    /// TLS-wrapped stream.
    Https(SslStream<TcpStream>),
}

impl MaybeHttpsStream {
    /// Get the negotiated ALPN protocol.
    ///
    /// Plain TCP connections never negotiate ALPN and report `Unknown`.
    pub fn alpn_protocol(&self) -> AlpnProtocol {
        match self {
            MaybeHttpsStream::Http(_) => AlpnProtocol::Unknown,
            MaybeHttpsStream::Https(stream) => match stream.ssl().selected_alpn_protocol() {
                Some(b"h2") => AlpnProtocol::H2,
                _ => AlpnProtocol::Unknown,
            },
        }
    }
}

impl AsyncRead for MaybeHttpsStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            MaybeHttpsStream::Http(stream) => Pin::new(stream).poll_read(cx, buf),
            MaybeHttpsStream::Https(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for MaybeHttpsStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            MaybeHttpsStream::Http(stream) => Pin::new(stream).poll_write(cx, buf),
            MaybeHttpsStream::Https(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            MaybeHttpsStream::Http(stream) => Pin::new(stream).poll_flush(cx),
            MaybeHttpsStream::Https(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            MaybeHttpsStream::Http(stream) => Pin::new(stream).poll_shutdown(cx),
            MaybeHttpsStream::Https(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Opens the single connection a session runs over.
#[derive(Debug, Clone)]
pub struct Connector {
    tls: TlsMode,
    connect_timeout: Option<Duration>,
}

impl Connector {
    pub fn new(tls: TlsMode, connect_timeout: Option<Duration>) -> Self {
        Self {
            tls,
            connect_timeout,
        }
    }

    fn configure_ssl(&self, verify: bool) -> Result<SslConnector, Error> {
        let mut builder = SslConnector::builder(SslMethod::tls_client())
            .map_err(|e| Error::tls(format!("Failed to create SSL connector: {}", e)))?;

        // RFC 9113 Section 9.2: TLS 1.2 or later
        builder
            .set_min_proto_version(Some(SslVersion::TLS1_2))
            .map_err(|e| Error::tls(format!("Failed to set min TLS version: {}", e)))?;

        if !verify {
            builder.set_verify(SslVerifyMode::NONE);
        }

        // Offer h2 only
        builder
            .set_alpn_protos(b"\x02h2")
            .map_err(|e| Error::tls(format!("Failed to set ALPN: {}", e)))?;

        Ok(builder.build())
    }

    /// Connect to `host:port`, bounded by the connect timeout if one is set.
    pub async fn connect(&self, host: &str, port: u16) -> Result<MaybeHttpsStream, Error> {
        let Some(limit) = self.connect_timeout else {
            return self.connect_inner(host, port).await;
        };
        match tokio::time::timeout(limit, self.connect_inner(host, port)).await {
            Ok(result) => result,
            Err(_) => Err(Error::ConnectTimeout(limit)),
        }
    }

    async fn connect_inner(&self, host: &str, port: u16) -> Result<MaybeHttpsStream, Error> {
        let addr = if host.contains(':') {
            format!("[{}]:{}", host, port)
        } else {
            format!("{}:{}", host, port)
        };

        let tcp_stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| Error::connection(format!("Failed to connect to {}: {}", addr, e)))?;
        tcp_stream.set_nodelay(true)?;

        let verify = match self.tls {
            TlsMode::Plaintext => {
                tracing::debug!(%addr, "connected (plaintext h2c)");
                return Ok(MaybeHttpsStream::Http(tcp_stream));
            }
            TlsMode::Tls { verify } => verify,
        };

        let ssl_connector = self.configure_ssl(verify)?;
        let mut ssl_config = ssl_connector
            .configure()
            .map_err(|e| Error::tls(format!("Failed to configure SSL: {}", e)))?;
        if !verify {
            ssl_config.set_verify_hostname(false);
        }

        let ssl_stream = tokio_boring::connect(ssl_config, host, tcp_stream)
            .await
            .map_err(|e| Error::tls(format!("TLS handshake failed: {}", e)))?;

        let stream = MaybeHttpsStream::Https(ssl_stream);
        if stream.alpn_protocol() != AlpnProtocol::H2 {
            return Err(Error::tls(format!("{} did not negotiate h2 via ALPN", addr)));
        }

        tracing::debug!(%addr, verify, "connected (TLS, h2)");
        Ok(stream)
    }
}
