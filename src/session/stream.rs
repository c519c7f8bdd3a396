//! Per-stream state and output sinks.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Lifecycle of one requested stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// Request sent, no successful response yet.
    Idle,
    /// 2xx response headers seen; body frames are accepted.
    Active,
    /// Terminal.
    Done,
}

/// Append-only destination for one stream's response body.
pub trait Sink: Send {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;
    fn close(&mut self) -> io::Result<()>;
}

/// Opens one sink per requested resource.
pub trait SinkFactory: Send {
    fn create(&mut self, resource_path: &str) -> Result<Box<dyn Sink>>;
}

/// Sink name for a resource path: every '/' becomes '-'.
///
/// Distinct paths can map to the same name (`/a-b` and `/a/b`); the later
/// sink overwrites the earlier.
pub fn sink_name(resource_path: &str) -> String {
    resource_path.replace('/', "-")
}

/// Buffered file sink.
pub struct FileSink {
    writer: BufWriter<File>,
}

impl Sink for FileSink {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)
    }

    fn close(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Creates file sinks inside a directory.
#[derive(Debug, Clone)]
pub struct FileSinkFactory {
    dir: PathBuf,
}

impl FileSinkFactory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, resource_path: &str) -> PathBuf {
        self.dir.join(sink_name(resource_path))
    }
}

impl SinkFactory for FileSinkFactory {
    fn create(&mut self, resource_path: &str) -> Result<Box<dyn Sink>> {
        let path = self.path_for(resource_path);
        let file = File::create(&path).map_err(|source| Error::SinkCreation {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "created output file");
        Ok(Box::new(FileSink {
            writer: BufWriter::new(file),
        }))
    }
}

/// State for one requested resource.
pub struct StreamRecord {
    id: u32,
    resource_path: String,
    sink: Box<dyn Sink>,
    status: StreamStatus,
    sink_closed: bool,
    bytes_written: u64,
    response_status: Option<String>,
}

impl std::fmt::Debug for StreamRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRecord")
            .field("id", &self.id)
            .field("resource_path", &self.resource_path)
            .field("status", &self.status)
            .field("bytes_written", &self.bytes_written)
            .field("response_status", &self.response_status)
            .finish()
    }
}

impl StreamRecord {
    pub fn new(id: u32, resource_path: impl Into<String>, sink: Box<dyn Sink>) -> Self {
        Self {
            id,
            resource_path: resource_path.into(),
            sink,
            status: StreamStatus::Idle,
            sink_closed: false,
            bytes_written: 0,
            response_status: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn resource_path(&self) -> &str {
        &self.resource_path
    }

    pub fn status(&self) -> StreamStatus {
        self.status
    }

    pub fn is_done(&self) -> bool {
        self.status == StreamStatus::Done
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// `:status` of the response, once seen.
    pub fn response_status(&self) -> Option<&str> {
        self.response_status.as_deref()
    }

    pub(crate) fn set_response_status(&mut self, status: &str) {
        self.response_status = Some(status.to_string());
    }

    /// Idle -> Active. No effect on a Done stream.
    pub(crate) fn activate(&mut self) {
        if self.status != StreamStatus::Done {
            self.status = StreamStatus::Active;
        }
    }

    /// Append body bytes. Only called while Active.
    pub(crate) fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.sink.write(bytes)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Close the sink at most once.
    pub(crate) fn close_sink(&mut self) {
        if self.sink_closed {
            return;
        }
        self.sink_closed = true;
        if let Err(e) = self.sink.close() {
            tracing::warn!(stream_id = self.id, error = %e, "failed to close output");
        }
    }

    /// Move to Done and close the sink. Returns false if already Done.
    pub(crate) fn finish(&mut self) -> bool {
        if self.status == StreamStatus::Done {
            return false;
        }
        self.status = StreamStatus::Done;
        self.close_sink();
        true
    }
}
