//! Per-stream transitions for response HEADERS and DATA.
//!
//! Neither function does I/O on the connection. The caller sends whatever
//! credit a transition reports.

use crate::session::stream::StreamStatus;
use crate::session::table::StreamTable;
use crate::transport::h2::message::{DataMessage, HeadersMessage};

/// Result of applying a DATA frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOutcome {
    /// Stream unknown, not Active, or Done. Nothing written, nothing to credit.
    Dropped,
    /// Payload consumed. `credit` octets should be returned on the stream and
    /// the connection.
    Consumed { credit: u32, finished: bool },
}

/// Three ASCII digits, the first one '2'.
fn is_success(status: &str) -> bool {
    status.len() == 3 && status.bytes().all(|b| b.is_ascii_digit()) && status.starts_with('2')
}

/// Apply a response HEADERS frame to its stream.
///
/// Returns false when the stream id was never registered.
pub fn on_response_headers(table: &mut StreamTable, headers: &HeadersMessage) -> bool {
    let stream_id = headers.stream_id;
    let Some(record) = table.lookup_mut(stream_id) else {
        return false;
    };
    if record.is_done() {
        tracing::debug!(stream_id, "HEADERS for finished stream ignored");
        return true;
    }

    match headers.status() {
        Some(status) if is_success(status) => {
            record.set_response_status(status);
            record.activate();
            tracing::info!(stream_id, status, path = record.resource_path(), "response received");
        }
        Some(status) => {
            record.set_response_status(status);
            tracing::warn!(stream_id, status, path = record.resource_path(), "bad status");
            table.mark_done(stream_id);
        }
        None => {
            tracing::warn!(stream_id, "response HEADERS without :status");
            table.mark_done(stream_id);
        }
    }

    if headers.end_stream {
        table.mark_done(stream_id);
    }
    true
}

/// Apply a DATA frame to its stream.
pub fn on_data(table: &mut StreamTable, data: &DataMessage) -> DataOutcome {
    let stream_id = data.stream_id;
    let Some(record) = table.lookup_mut(stream_id) else {
        return DataOutcome::Dropped;
    };
    if record.status() != StreamStatus::Active {
        tracing::debug!(stream_id, status = ?record.status(), "DATA dropped");
        return DataOutcome::Dropped;
    }

    if !data.data.is_empty() {
        if let Err(e) = record.write(&data.data) {
            tracing::warn!(stream_id, error = %e, "failed to write response body");
        }
        tracing::trace!(stream_id, len = data.data.len(), "body bytes written");
    }

    let finished = data.end_stream && table.mark_done(stream_id);
    if finished {
        if let Some(record) = table.lookup(stream_id) {
            tracing::info!(
                stream_id,
                path = record.resource_path(),
                bytes = record.bytes_written(),
                "stream complete"
            );
        }
    }

    DataOutcome::Consumed {
        credit: data.flow_len,
        finished,
    }
}
