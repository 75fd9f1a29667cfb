#![warn(missing_docs)]
//! Deterministic testing surfaces: fixtures, the JSONL event stream, session
//! reports and golden snapshots.

mod fixtures;
mod report;
mod snapshot;

use anyhow::{Context, Result};
use multiverse_core::{SimTick, StampedEvent};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

pub use fixtures::*;
pub use report::*;
pub use snapshot::*;

/// One line of the event log.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a> {
    /// Tick at which the event committed.
    pub tick: SimTick,
    /// Snake_case kind label.
    pub kind: &'a str,
    /// Full event payload.
    pub event: &'a multiverse_core::MultiverseEvent,
}

impl<'a> From<&'a StampedEvent> for EventRecord<'a> {
    fn from(stamped: &'a StampedEvent) -> Self {
        Self {
            tick: stamped.tick,
            kind: stamped.event.kind(),
            event: &stamped.event,
        }
    }
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    file: BufWriter<File>,
    written: usize,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create event log {}", path.display()))?;
        debug!(path = %path.display(), "event log opened");
        Ok(Self {
            file: BufWriter::new(file),
            written: 0,
        })
    }

    /// Append an event to the log.
    pub fn write(&mut self, event: &EventRecord<'_>) -> Result<()> {
        let line = serde_json::to_string(event)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Append every event in order.
    pub fn write_all<'a>(
        &mut self,
        events: impl IntoIterator<Item = &'a StampedEvent>,
    ) -> Result<()> {
        for stamped in events {
            self.write(&EventRecord::from(stamped))?;
        }
        Ok(())
    }

    /// Lines written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush buffered lines to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}
