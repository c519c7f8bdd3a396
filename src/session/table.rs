//! Stream table: identifier to record mapping plus the unfinished count.
//!
//! The table is the only place completion is counted. `mark_done` is
//! idempotent, so a stream that fails on a bad status and also carries
//! END_STREAM on the same frame is only counted once.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::session::stream::{SinkFactory, StreamRecord};

pub struct StreamTable {
    streams: HashMap<u32, StreamRecord>,
    /// Registration order.
    order: Vec<u32>,
    unfinished: usize,
    sinks: Box<dyn SinkFactory>,
}

impl StreamTable {
    pub fn new(sinks: Box<dyn SinkFactory>) -> Self {
        Self {
            streams: HashMap::new(),
            order: Vec::new(),
            unfinished: 0,
            sinks,
        }
    }

    /// Create the sink for `resource_path` and insert a new Idle record.
    pub fn register(&mut self, id: u32, resource_path: &str) -> Result<&StreamRecord> {
        if self.streams.contains_key(&id) {
            return Err(Error::DuplicateStream(id));
        }
        let sink = self.sinks.create(resource_path)?;

        self.order.push(id);
        self.unfinished += 1;
        Ok(self
            .streams
            .entry(id)
            .or_insert_with(|| StreamRecord::new(id, resource_path, sink)))
    }

    pub fn lookup(&self, id: u32) -> Option<&StreamRecord> {
        self.streams.get(&id)
    }

    pub fn lookup_mut(&mut self, id: u32) -> Option<&mut StreamRecord> {
        self.streams.get_mut(&id)
    }

    /// Move a stream to Done, close its sink, and count it finished.
    ///
    /// Returns true only on the call that actually completed the stream.
    /// Unknown ids and already-Done streams are no-ops.
    pub fn mark_done(&mut self, id: u32) -> bool {
        let Some(record) = self.streams.get_mut(&id) else {
            return false;
        };
        if !record.finish() {
            return false;
        }
        self.unfinished = self.unfinished.saturating_sub(1);
        tracing::debug!(stream_id = id, unfinished = self.unfinished, "stream done");
        true
    }

    pub fn is_finished(&self) -> bool {
        self.unfinished == 0
    }

    pub fn unfinished(&self) -> usize {
        self.unfinished
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Records in registration order.
    pub fn records(&self) -> impl Iterator<Item = &StreamRecord> + '_ {
        self.order.iter().filter_map(move |id| self.streams.get(id))
    }

    /// Close every sink that is still open. Does not change status or counts.
    pub fn close_all(&mut self) {
        for record in self.streams.values_mut() {
            record.close_sink();
        }
    }
}
