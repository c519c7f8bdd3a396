//! Flow-control responder.
//!
//! Credit is returned as soon as body bytes are consumed, one WINDOW_UPDATE
//! per call, so the peer's view of our window never shrinks.

use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::transport::h2::codec::FrameStream;
use crate::transport::h2::frame::{WindowUpdateFrame, MAX_WINDOW_INCREMENT};

#[derive(Debug, Default)]
pub struct FlowControlResponder {
    frames_sent: u64,
    bytes_credited: u64,
}

impl FlowControlResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send one WINDOW_UPDATE crediting `amount` octets on `stream_id`
    /// (0 for the connection). Zero credits send nothing.
    pub async fn credit<S>(
        &mut self,
        io: &mut FrameStream<S>,
        stream_id: u32,
        amount: u32,
    ) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        if amount == 0 {
            return Ok(());
        }
        let increment = amount.min(MAX_WINDOW_INCREMENT);
        io.write_frame(&WindowUpdateFrame::new(stream_id, increment).serialize())
            .await?;

        self.frames_sent += 1;
        self.bytes_credited += u64::from(increment);
        tracing::trace!(stream_id, increment, "sent WINDOW_UPDATE");
        Ok(())
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    pub fn bytes_credited(&self) -> u64 {
        self.bytes_credited
    }
}
