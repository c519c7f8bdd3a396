//! HTTP/2 client framing.
//!
//! - [`frame`]: wire layouts for the frame types this client reads and writes
//! - [`codec`]: buffered frame reader/writer over any async byte stream
//! - [`message`]: typed inbound messages and HPACK request/response coding

pub mod codec;
pub mod frame;
pub mod message;

pub use codec::{FrameStream, RawFrame};
pub use frame::{
    flags, DataFrame, ErrorCode, FrameHeader, FrameType, GoAwayFrame, HeadersFrame, SettingsFrame,
    WindowUpdateFrame, CONNECTION_PREFACE, DEFAULT_MAX_FRAME_SIZE, FRAME_HEADER_SIZE,
};
pub use message::{DataMessage, HeadersMessage, Message, MessageCodec};
