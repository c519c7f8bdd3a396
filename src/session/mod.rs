//! A fetch session over one HTTP/2 connection.
//!
//! The session owns the connection, the stream table and the HPACK state.
//! It runs a single read/dispatch loop: every inbound frame is processed to
//! completion, including any frames it causes us to send, before the next
//! one is read. Nothing here is shared across tasks.

pub mod flow;
pub mod machine;
pub mod stream;
pub mod table;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{Error, Result};
use crate::session::flow::FlowControlResponder;
use crate::session::machine::DataOutcome;
use crate::session::stream::SinkFactory;
use crate::session::table::StreamTable;
use crate::transport::h2::codec::FrameStream;
use crate::transport::h2::frame::{FrameType, SettingsFrame};
use crate::transport::h2::message::{Message, MessageCodec};

pub use stream::{StreamRecord, StreamStatus};

/// Per-stream outcome reported when a session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    pub stream_id: u32,
    pub resource_path: String,
    pub status: StreamStatus,
    pub response_status: Option<String>,
    pub bytes_written: u64,
}

pub struct Session<S> {
    io: FrameStream<S>,
    messages: MessageCodec,
    table: StreamTable,
    flow: FlowControlResponder,
    authority: String,
    next_stream_id: u32,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        authority: impl Into<String>,
        sinks: Box<dyn SinkFactory>,
        max_frame_size: u32,
    ) -> Self {
        Self {
            io: FrameStream::new(stream, max_frame_size),
            messages: MessageCodec::new(),
            table: StreamTable::new(sinks),
            flow: FlowControlResponder::new(),
            authority: authority.into(),
            next_stream_id: 1,
        }
    }

    /// Send the connection preface and an empty SETTINGS frame.
    pub async fn handshake(&mut self) -> Result<()> {
        self.io.write_preface().await?;
        self.io
            .write_frame(&SettingsFrame::new().serialize())
            .await?;
        tracing::debug!("sent preface and SETTINGS");
        Ok(())
    }

    /// Open one stream per path, in order, with ids 1, 3, 5, ...
    ///
    /// Each record (and its sink) exists before its request goes out. Any
    /// failure aborts the whole session.
    pub async fn issue_requests<P: AsRef<str>>(&mut self, paths: &[P]) -> Result<()> {
        for path in paths {
            let path = path.as_ref();
            let stream_id = self.next_stream_id;

            let frame = self
                .messages
                .encode_request(stream_id, &self.authority, path)?;
            self.table.register(stream_id, path)?;
            self.io.write_frame(&frame).await?;

            tracing::debug!(stream_id, path, "request sent");
            self.next_stream_id += 2;
        }
        Ok(())
    }

    /// Read and dispatch frames until every stream is Done.
    ///
    /// A read failure, or a decode failure that is not scoped to one stream,
    /// ends the loop with that error, whatever the state of the remaining
    /// streams.
    pub async fn run(&mut self) -> Result<()> {
        while !self.table.is_finished() {
            let frame = self.io.read_frame().await?;
            let frame_type = frame.header.frame_type;
            let stream_id = frame.header.stream_id;
            tracing::trace!(?frame_type, stream_id, len = frame.header.length, "frame received");

            match self.messages.decode(frame) {
                Ok(message) => self.dispatch(message).await?,
                Err(e) if e.is_stream_scoped() => self.on_decode_error(frame_type, stream_id, e),
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, message: Message) -> Result<()> {
        match message {
            Message::Headers(headers) => {
                if !machine::on_response_headers(&mut self.table, &headers) {
                    tracing::warn!(stream_id = headers.stream_id, "Unexpected stream ID");
                }
            }
            Message::Data(data) => match machine::on_data(&mut self.table, &data) {
                DataOutcome::Consumed { credit, .. } => {
                    self.flow.credit(&mut self.io, 0, credit).await?;
                    self.flow.credit(&mut self.io, data.stream_id, credit).await?;
                }
                DataOutcome::Dropped => {
                    if self.table.lookup(data.stream_id).is_none() {
                        tracing::warn!(stream_id = data.stream_id, "Unexpected stream ID");
                    }
                }
            },
            Message::Settings(settings) => {
                if settings.ack {
                    tracing::debug!("received SETTINGS ACK");
                } else {
                    tracing::debug!(params = ?settings.settings, "received SETTINGS");
                    self.io
                        .write_frame(&SettingsFrame::ack().serialize())
                        .await?;
                }
            }
            Message::WindowUpdate(update) => {
                tracing::debug!(
                    stream_id = update.stream_id,
                    increment = update.increment,
                    "received WINDOW_UPDATE"
                );
            }
            Message::GoAway {
                last_stream_id,
                error_code,
                debug: debug_data,
            } => {
                tracing::warn!(last_stream_id, ?error_code, debug = %debug_data, "received GOAWAY");
            }
            Message::Other {
                frame_type,
                stream_id,
            } => {
                tracing::debug!(?frame_type, stream_id, "ignored frame");
            }
        }
        Ok(())
    }

    /// A frame that could not be decoded only fails the stream it belongs to.
    fn on_decode_error(&mut self, frame_type: FrameType, stream_id: u32, error: Error) {
        let owned = matches!(frame_type, FrameType::Headers | FrameType::Data)
            && self.table.lookup(stream_id).is_some();
        if owned {
            tracing::warn!(stream_id, ?frame_type, error = %error, "stream failed");
            self.table.mark_done(stream_id);
        } else {
            tracing::warn!(stream_id, ?frame_type, error = %error, "undecodable frame ignored");
        }
    }

    pub fn table(&self) -> &StreamTable {
        &self.table
    }

    pub fn flow(&self) -> &FlowControlResponder {
        &self.flow
    }

    pub fn summary(&self) -> Vec<StreamSummary> {
        self.table
            .records()
            .map(|r| StreamSummary {
                stream_id: r.id(),
                resource_path: r.resource_path().to_string(),
                status: r.status(),
                response_status: r.response_status().map(str::to_string),
                bytes_written: r.bytes_written(),
            })
            .collect()
    }

    /// Close every open sink and shut down the connection.
    pub async fn close(&mut self) -> Vec<StreamSummary> {
        self.table.close_all();
        if let Err(e) = self.io.shutdown().await {
            tracing::debug!(error = %e, "shutdown failed");
        }

        let summary = self.summary();
        for s in &summary {
            tracing::info!(
                stream_id = s.stream_id,
                path = %s.resource_path,
                status = ?s.status,
                response = s.response_status.as_deref().unwrap_or("-"),
                bytes = s.bytes_written,
                "summary"
            );
        }
        summary
    }
}
