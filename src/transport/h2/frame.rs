//! HTTP/2 frame types and binary serialization.
//!
//! Implements the RFC 9113 frame layouts this client sends (SETTINGS,
//! HEADERS, WINDOW_UPDATE) and the ones it reads on the response path
//! (DATA, HEADERS, SETTINGS, WINDOW_UPDATE, GOAWAY).

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Frame header size (9 bytes per RFC 9113).
pub const FRAME_HEADER_SIZE: usize = 9;

/// Default maximum frame size (16KB per RFC 9113).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16384;

/// Largest legal WINDOW_UPDATE increment (2^31 - 1).
pub const MAX_WINDOW_INCREMENT: u32 = 0x7fff_ffff;

/// HTTP/2 connection preface (client must send this first).
pub const CONNECTION_PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";

/// Frame type identifiers per RFC 9113.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Data,
    Headers,
    Priority,
    RstStream,
    Settings,
    PushPromise,
    Ping,
    GoAway,
    WindowUpdate,
    Continuation,
    Unknown(u8),
}

impl From<u8> for FrameType {
    fn from(v: u8) -> Self {
        match v {
            0x0 => Self::Data,
            0x1 => Self::Headers,
            0x2 => Self::Priority,
            0x3 => Self::RstStream,
            0x4 => Self::Settings,
            0x5 => Self::PushPromise,
            0x6 => Self::Ping,
            0x7 => Self::GoAway,
            0x8 => Self::WindowUpdate,
            0x9 => Self::Continuation,
            other => Self::Unknown(other),
        }
    }
}

impl From<FrameType> for u8 {
    fn from(ft: FrameType) -> u8 {
        match ft {
            FrameType::Data => 0x0,
            FrameType::Headers => 0x1,
            FrameType::Priority => 0x2,
            FrameType::RstStream => 0x3,
            FrameType::Settings => 0x4,
            FrameType::PushPromise => 0x5,
            FrameType::Ping => 0x6,
            FrameType::GoAway => 0x7,
            FrameType::WindowUpdate => 0x8,
            FrameType::Continuation => 0x9,
            FrameType::Unknown(v) => v,
        }
    }
}

/// Frame flags.
pub mod flags {
    pub const END_STREAM: u8 = 0x1;
    pub const ACK: u8 = 0x1; // Same value, SETTINGS/PING context
    pub const END_HEADERS: u8 = 0x4;
    pub const PADDED: u8 = 0x8;
    pub const PRIORITY: u8 = 0x20;
}

/// HTTP/2 error codes per RFC 9113 Section 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NoError,
    ProtocolError,
    InternalError,
    FlowControlError,
    SettingsTimeout,
    StreamClosed,
    FrameSizeError,
    RefusedStream,
    Cancel,
    CompressionError,
    ConnectError,
    EnhanceYourCalm,
    InadequateSecurity,
    Http11Required,
    Unknown(u32),
}

impl From<u32> for ErrorCode {
    fn from(v: u32) -> Self {
        match v {
            0x0 => Self::NoError,
            0x1 => Self::ProtocolError,
            0x2 => Self::InternalError,
            0x3 => Self::FlowControlError,
            0x4 => Self::SettingsTimeout,
            0x5 => Self::StreamClosed,
            0x6 => Self::FrameSizeError,
            0x7 => Self::RefusedStream,
            0x8 => Self::Cancel,
            0x9 => Self::CompressionError,
            0xa => Self::ConnectError,
            0xb => Self::EnhanceYourCalm,
            0xc => Self::InadequateSecurity,
            0xd => Self::Http11Required,
            other => Self::Unknown(other),
        }
    }
}

/// Parsed frame header.
#[derive(Debug, Clone)]
pub struct FrameHeader {
    pub length: u32,
    pub frame_type: FrameType,
    pub flags: u8,
    pub stream_id: u32,
}

impl FrameHeader {
    /// Parse a frame header from bytes.
    /// Returns None if the buffer is short or the reserved bit is set.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < FRAME_HEADER_SIZE {
            return None;
        }

        let length = ((buf[0] as u32) << 16) | ((buf[1] as u32) << 8) | (buf[2] as u32);
        let frame_type = FrameType::from(buf[3]);
        let flags = buf[4];

        // Stream ID is 31 bits; the high bit is reserved and must be 0
        if (buf[5] & 0x80) != 0 {
            return None;
        }

        let stream_id = ((buf[5] as u32 & 0x7f) << 24)
            | ((buf[6] as u32) << 16)
            | ((buf[7] as u32) << 8)
            | (buf[8] as u32);

        Some(Self {
            length,
            frame_type,
            flags,
            stream_id,
        })
    }

    /// Serialize frame header to bytes.
    pub fn serialize(&self, buf: &mut BytesMut) {
        buf.put_u8((self.length >> 16) as u8);
        buf.put_u8((self.length >> 8) as u8);
        buf.put_u8(self.length as u8);
        buf.put_u8(self.frame_type.into());
        buf.put_u8(self.flags);
        buf.put_u32(self.stream_id & 0x7fffffff);
    }

    pub fn has_flag(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }
}

/// Strip the pad-length octet and trailing padding from a PADDED payload.
fn strip_padding(frame: &str, mut payload: Bytes) -> Result<Bytes, String> {
    if payload.remaining() < 1 {
        return Err(format!("PADDED {frame} frame missing padding length"));
    }
    let pad_len = payload.get_u8() as usize;
    if pad_len > payload.remaining() {
        return Err("Padding length exceeds payload size".to_string());
    }
    payload.truncate(payload.len() - pad_len);
    Ok(payload)
}

/// SETTINGS frame payload.
#[derive(Debug, Clone, Default)]
pub struct SettingsFrame {
    /// (identifier, value) pairs in wire order.
    pub settings: Vec<(u16, u32)>,
    pub ack: bool,
}

impl SettingsFrame {
    /// Create a SETTINGS frame with no parameters (all defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a SETTINGS ACK frame.
    pub fn ack() -> Self {
        Self {
            settings: Vec::new(),
            ack: true,
        }
    }

    /// Serialize to bytes (including frame header).
    pub fn serialize(&self) -> BytesMut {
        let payload_len = if self.ack { 0 } else { self.settings.len() * 6 };
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload_len);

        let header = FrameHeader {
            length: payload_len as u32,
            frame_type: FrameType::Settings,
            flags: if self.ack { flags::ACK } else { 0 },
            stream_id: 0,
        };
        header.serialize(&mut buf);

        if !self.ack {
            for (id, value) in &self.settings {
                buf.put_u16(*id);
                buf.put_u32(*value);
            }
        }

        buf
    }

    /// Parse a SETTINGS frame payload.
    pub fn parse(stream_id: u32, flags: u8, mut payload: Bytes) -> Result<Self, String> {
        if stream_id != 0 {
            return Err("SETTINGS frame must be on stream 0".to_string());
        }
        if payload.len() % 6 != 0 {
            return Err(format!(
                "SETTINGS payload length {} is not a multiple of 6",
                payload.len()
            ));
        }
        let ack = (flags & flags::ACK) != 0;
        if ack && !payload.is_empty() {
            return Err("SETTINGS ACK must have an empty payload".to_string());
        }

        let mut settings = Vec::with_capacity(payload.len() / 6);
        while payload.remaining() >= 6 {
            let id = payload.get_u16();
            let value = payload.get_u32();
            settings.push((id, value));
        }

        Ok(Self { settings, ack })
    }
}

/// WINDOW_UPDATE frame.
#[derive(Debug, Clone)]
pub struct WindowUpdateFrame {
    pub stream_id: u32,
    pub increment: u32,
}

impl WindowUpdateFrame {
    /// Create a new WINDOW_UPDATE frame.
    pub fn new(stream_id: u32, increment: u32) -> Self {
        Self {
            stream_id,
            increment,
        }
    }

    /// Serialize to bytes (including frame header).
    pub fn serialize(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + 4);

        let header = FrameHeader {
            length: 4,
            frame_type: FrameType::WindowUpdate,
            flags: 0,
            stream_id: self.stream_id,
        };
        header.serialize(&mut buf);
        buf.put_u32(self.increment & MAX_WINDOW_INCREMENT);

        buf
    }

    /// Parse from payload.
    pub fn parse(stream_id: u32, mut payload: Bytes) -> Result<Self, String> {
        if payload.remaining() != 4 {
            return Err("WINDOW_UPDATE payload must be 4 octets".to_string());
        }
        let increment = payload.get_u32() & MAX_WINDOW_INCREMENT;

        // RFC 9113 Section 6.9.1: increment MUST be between 1 and 2^31-1
        if increment == 0 {
            return Err("WINDOW_UPDATE increment must be > 0".to_string());
        }

        Ok(Self {
            stream_id,
            increment,
        })
    }
}

/// HEADERS frame.
#[derive(Debug, Clone)]
pub struct HeadersFrame {
    pub stream_id: u32,
    pub header_block: Bytes,
    pub end_stream: bool,
    pub end_headers: bool,
}

impl HeadersFrame {
    /// Create a new HEADERS frame carrying a complete header block.
    pub fn new(stream_id: u32, header_block: Bytes) -> Self {
        Self {
            stream_id,
            header_block,
            end_stream: false,
            end_headers: true,
        }
    }

    /// Set end_stream flag.
    pub fn end_stream(mut self, end: bool) -> Self {
        self.end_stream = end;
        self
    }

    /// Serialize to bytes (including frame header). Never padded.
    pub fn serialize(&self) -> BytesMut {
        let payload_len = self.header_block.len();
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload_len);

        let mut frame_flags = 0u8;
        if self.end_stream {
            frame_flags |= flags::END_STREAM;
        }
        if self.end_headers {
            frame_flags |= flags::END_HEADERS;
        }

        let header = FrameHeader {
            length: payload_len as u32,
            frame_type: FrameType::Headers,
            flags: frame_flags,
            stream_id: self.stream_id,
        };
        header.serialize(&mut buf);
        buf.extend_from_slice(&self.header_block);

        buf
    }

    /// Parse a HEADERS frame, dropping padding and the priority block.
    pub fn parse(stream_id: u32, flags: u8, payload: Bytes) -> Result<Self, String> {
        if stream_id == 0 {
            return Err("HEADERS frame must have non-zero stream ID".to_string());
        }

        let end_stream = (flags & flags::END_STREAM) != 0;
        let end_headers = (flags & flags::END_HEADERS) != 0;

        let mut payload = if (flags & flags::PADDED) != 0 {
            strip_padding("HEADERS", payload)?
        } else {
            payload
        };

        if (flags & flags::PRIORITY) != 0 {
            if payload.remaining() < 5 {
                return Err("HEADERS frame with PRIORITY flag missing priority data".to_string());
            }
            payload.advance(5);
        }

        if payload.is_empty() {
            return Err("HEADERS frame header block is empty".to_string());
        }

        Ok(Self {
            stream_id,
            header_block: payload,
            end_stream,
            end_headers,
        })
    }
}

/// DATA frame.
#[derive(Debug, Clone)]
pub struct DataFrame {
    pub stream_id: u32,
    pub data: Bytes,
    pub end_stream: bool,
    /// Octets counted against flow control: the whole payload, padding included.
    pub flow_len: u32,
}

impl DataFrame {
    /// Create a new unpadded DATA frame.
    pub fn new(stream_id: u32, data: Bytes) -> Self {
        let flow_len = data.len() as u32;
        Self {
            stream_id,
            data,
            end_stream: false,
            flow_len,
        }
    }

    /// Set end_stream flag.
    pub fn end_stream(mut self, end: bool) -> Self {
        self.end_stream = end;
        self
    }

    /// Serialize to bytes (including frame header).
    pub fn serialize(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + self.data.len());

        let header = FrameHeader {
            length: self.data.len() as u32,
            frame_type: FrameType::Data,
            flags: if self.end_stream { flags::END_STREAM } else { 0 },
            stream_id: self.stream_id,
        };
        header.serialize(&mut buf);
        buf.extend_from_slice(&self.data);

        buf
    }

    /// Parse a DATA frame from payload (with padding handling).
    pub fn parse(stream_id: u32, flags: u8, payload: Bytes) -> Result<Self, String> {
        if stream_id == 0 {
            return Err("DATA frame must have non-zero stream ID".to_string());
        }

        let end_stream = (flags & flags::END_STREAM) != 0;
        let flow_len = payload.len() as u32;

        let data = if (flags & flags::PADDED) != 0 {
            strip_padding("DATA", payload)?
        } else {
            payload
        };

        Ok(Self {
            stream_id,
            data,
            end_stream,
            flow_len,
        })
    }
}

/// GOAWAY frame.
#[derive(Debug, Clone)]
pub struct GoAwayFrame {
    pub last_stream_id: u32,
    pub error_code: ErrorCode,
    pub debug_data: Bytes,
}

impl GoAwayFrame {
    /// Parse from payload.
    pub fn parse(mut payload: Bytes) -> Result<Self, String> {
        if payload.remaining() < 8 {
            return Err("GOAWAY payload too short".to_string());
        }
        let last_stream_id = payload.get_u32() & 0x7fffffff;
        let error_code = ErrorCode::from(payload.get_u32());

        Ok(Self {
            last_stream_id,
            error_code,
            debug_data: payload,
        })
    }
}
