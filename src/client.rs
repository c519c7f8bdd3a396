//! Top-level fetch: connect, request every path, drain responses.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::session::stream::FileSinkFactory;
use crate::session::{Session, StreamSummary};
use crate::transport::connector::Connector;

/// Run one session to completion.
///
/// Connection, sink and request failures abort before any response is read.
/// Sinks are closed and the connection shut down however the session ends.
pub async fn run(config: &ClientConfig) -> Result<Vec<StreamSummary>> {
    let connector = Connector::new(config.tls, config.connect_timeout);
    let stream = connector.connect(&config.host, config.port).await?;
    tracing::info!(host = %config.host, port = config.port, streams = config.paths.len(), "connected");

    let sinks = FileSinkFactory::new(&config.output_dir);
    let mut session = Session::new(
        stream,
        config.authority(),
        Box::new(sinks),
        config.max_frame_size,
    );

    let result = drive(&mut session, &config.paths).await;
    let summary = session.close().await;
    result.map(|()| summary)
}

async fn drive<S>(session: &mut Session<S>, paths: &[String]) -> Result<()>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    session.handshake().await?;
    session.issue_requests(paths).await?;
    session.run().await
}
