//! Frame-level reader/writer over a byte transport.

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::transport::h2::frame::{FrameHeader, CONNECTION_PREFACE, FRAME_HEADER_SIZE};

/// A frame as read off the wire, before payload decoding.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub header: FrameHeader,
    pub payload: Bytes,
}

/// Buffered frame reader/writer.
///
/// Writes are flushed immediately so the peer sees each frame as soon as it
/// is produced.
pub struct FrameStream<S> {
    stream: S,
    read_buf: BytesMut,
    max_frame_size: u32,
}

impl<S> FrameStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, max_frame_size: u32) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(16384),
            max_frame_size,
        }
    }

    /// Send the client connection preface.
    pub async fn write_preface(&mut self) -> Result<()> {
        self.write_frame(CONNECTION_PREFACE).await
    }

    /// Write one serialized frame and flush.
    pub async fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.stream
            .write_all(frame)
            .await
            .map_err(|e| Error::connection(format!("Failed to send frame: {}", e)))?;
        self.stream
            .flush()
            .await
            .map_err(|e| Error::connection(format!("Failed to flush: {}", e)))?;
        Ok(())
    }

    /// Read the next complete frame.
    ///
    /// A clean EOF between frames yields [`Error::ConnectionClosed`]; EOF in
    /// the middle of a frame, an oversized frame, or a set reserved bit is a
    /// [`Error::Frame`].
    pub async fn read_frame(&mut self) -> Result<RawFrame> {
        self.fill(FRAME_HEADER_SIZE).await?;

        let header = FrameHeader::parse(&self.read_buf[..FRAME_HEADER_SIZE])
            .ok_or_else(|| Error::frame("Invalid frame header (reserved bit set)"))?;

        // RFC 9113 Section 4.2
        if header.length > self.max_frame_size {
            return Err(Error::frame(format!(
                "FRAME_SIZE_ERROR: Frame size {} exceeds MAX_FRAME_SIZE {}",
                header.length, self.max_frame_size
            )));
        }

        let frame_len = FRAME_HEADER_SIZE + header.length as usize;
        self.fill(frame_len).await?;

        self.read_buf.advance(FRAME_HEADER_SIZE);
        let payload = self.read_buf.split_to(header.length as usize).freeze();

        Ok(RawFrame { header, payload })
    }

    /// Shut down the write half of the transport.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    async fn fill(&mut self, want: usize) -> Result<()> {
        while self.read_buf.len() < want {
            let mut buf = [0u8; 16384];
            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                if self.read_buf.is_empty() {
                    return Err(Error::ConnectionClosed);
                }
                return Err(Error::frame(format!(
                    "Connection closed mid-frame ({} of {} octets)",
                    self.read_buf.len(),
                    want
                )));
            }
            self.read_buf.extend_from_slice(&buf[..n]);
        }
        Ok(())
    }
}
