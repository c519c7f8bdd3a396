//! Typed messages on top of raw frames.
//!
//! `MessageCodec` owns the connection's HPACK state. Every inbound header
//! block passes through the same decoder, whether or not the stream it
//! belongs to is known, so the dynamic table never drifts from the peer's.

use bytes::{Bytes, BytesMut};
use http::uri::{Authority, PathAndQuery};

use crate::error::{Error, Result};
use crate::transport::h2::codec::RawFrame;
use crate::transport::h2::frame::{
    DataFrame, ErrorCode, FrameType, GoAwayFrame, HeadersFrame, SettingsFrame,
    WindowUpdateFrame, DEFAULT_MAX_FRAME_SIZE,
};

/// Decoded response header block.
#[derive(Debug, Clone)]
pub struct HeadersMessage {
    pub stream_id: u32,
    /// Header fields in wire order, pseudo-headers included.
    pub fields: Vec<(String, String)>,
    pub end_stream: bool,
}

impl HeadersMessage {
    /// First value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The `:status` pseudo-header.
    pub fn status(&self) -> Option<&str> {
        self.get(":status")
    }
}

/// Response body chunk.
#[derive(Debug, Clone)]
pub struct DataMessage {
    pub stream_id: u32,
    pub data: Bytes,
    pub end_stream: bool,
    /// Octets to credit back (payload including padding).
    pub flow_len: u32,
}

/// One decoded inbound frame.
#[derive(Debug, Clone)]
pub enum Message {
    Headers(HeadersMessage),
    Data(DataMessage),
    Settings(SettingsFrame),
    WindowUpdate(WindowUpdateFrame),
    GoAway {
        last_stream_id: u32,
        error_code: ErrorCode,
        debug: String,
    },
    /// Frame types this client does not act on.
    Other { frame_type: FrameType, stream_id: u32 },
}

/// HPACK-aware encoder/decoder for request and response messages.
pub struct MessageCodec {
    encoder: loona_hpack::Encoder<'static>,
    decoder: loona_hpack::Decoder<'static>,
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageCodec {
    pub fn new() -> Self {
        Self {
            encoder: loona_hpack::Encoder::new(),
            decoder: loona_hpack::Decoder::new(),
        }
    }

    /// Encode a GET request as a single HEADERS frame with END_STREAM and
    /// END_HEADERS set.
    pub fn encode_request(
        &mut self,
        stream_id: u32,
        authority: &str,
        path: &str,
    ) -> Result<BytesMut> {
        if stream_id == 0 || stream_id % 2 == 0 {
            return Err(Error::bad_attribute(format!(
                "Client stream ID must be odd, got {}",
                stream_id
            )));
        }
        let authority: Authority = authority
            .parse()
            .map_err(|e| Error::bad_attribute(format!("Invalid authority {:?}: {}", authority, e)))?;
        let path: PathAndQuery = path
            .parse()
            .map_err(|e| Error::bad_attribute(format!("Invalid path {:?}: {}", path, e)))?;

        let headers = [
            (&b":method"[..], &b"GET"[..]),
            (&b":path"[..], path.as_str().as_bytes()),
            (&b":authority"[..], authority.as_str().as_bytes()),
            (&b":scheme"[..], &b"https"[..]),
        ];

        let mut block = Vec::new();
        self.encoder
            .encode_into(headers, &mut block)
            .map_err(|e| Error::hpack(format!("Failed to encode request headers: {}", e)))?;

        if block.len() > DEFAULT_MAX_FRAME_SIZE as usize {
            return Err(Error::hpack(format!(
                "Header block of {} octets does not fit in one frame",
                block.len()
            )));
        }

        Ok(HeadersFrame::new(stream_id, Bytes::from(block))
            .end_stream(true)
            .serialize())
    }

    /// Decode a raw frame into a [`Message`].
    pub fn decode(&mut self, frame: RawFrame) -> Result<Message> {
        let RawFrame { header, payload } = frame;
        let stream_id = header.stream_id;

        match header.frame_type {
            FrameType::Headers => {
                let headers =
                    HeadersFrame::parse(stream_id, header.flags, payload).map_err(Error::frame)?;
                // A split header block never reaches the decoder, so the
                // shared HPACK table can no longer be trusted.
                if !headers.end_headers {
                    return Err(Error::protocol(format!(
                        "HEADERS on stream {} without END_HEADERS (CONTINUATION unsupported)",
                        stream_id
                    )));
                }
                let decoded = self
                    .decoder
                    .decode(&headers.header_block)
                    .map_err(|e| Error::hpack(format!("{:?}", e)))?;

                let mut fields = Vec::with_capacity(decoded.len());
                for (name, value) in decoded {
                    let name = String::from_utf8(name)
                        .map_err(|_| Error::bad_attribute("Header name is not valid UTF-8"))?;
                    let value = String::from_utf8(value).map_err(|_| {
                        Error::bad_attribute(format!("Value of {} is not valid UTF-8", name))
                    })?;
                    fields.push((name, value));
                }

                Ok(Message::Headers(HeadersMessage {
                    stream_id,
                    fields,
                    end_stream: headers.end_stream,
                }))
            }
            FrameType::Data => {
                let data = DataFrame::parse(stream_id, header.flags, payload).map_err(Error::frame)?;
                Ok(Message::Data(DataMessage {
                    stream_id,
                    data: data.data,
                    end_stream: data.end_stream,
                    flow_len: data.flow_len,
                }))
            }
            FrameType::Settings => {
                let settings =
                    SettingsFrame::parse(stream_id, header.flags, payload).map_err(Error::frame)?;
                Ok(Message::Settings(settings))
            }
            FrameType::WindowUpdate => {
                let update = WindowUpdateFrame::parse(stream_id, payload).map_err(Error::frame)?;
                Ok(Message::WindowUpdate(update))
            }
            FrameType::GoAway => {
                let goaway = GoAwayFrame::parse(payload).map_err(Error::frame)?;
                Ok(Message::GoAway {
                    last_stream_id: goaway.last_stream_id,
                    error_code: goaway.error_code,
                    debug: String::from_utf8_lossy(&goaway.debug_data).into_owned(),
                })
            }
            frame_type => Ok(Message::Other {
                frame_type,
                stream_id,
            }),
        }
    }
}
