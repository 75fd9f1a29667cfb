//! End-of-session summary written for CI artifacts.

use anyhow::Result;
use multiverse_core::{SimTick, StampedEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Outcome counters of a scripted session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTally {
    /// Steps that committed.
    pub committed: usize,
    /// Steps rejected by the host.
    pub rejected: usize,
}

/// Summary of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// Session identifier.
    pub name: String,
    /// When the report was generated (RFC 3339).
    pub generated_at: String,
    /// Logical time at the end of the session.
    pub final_tick: SimTick,
    /// Step outcomes.
    pub steps: StepTally,
    /// Committed events per kind.
    pub events_by_kind: BTreeMap<String, usize>,
    /// Hosted worlds at the end.
    pub worlds: usize,
}

impl SessionReport {
    /// Summarize `events` for a session that ended at `final_tick`.
    pub fn new<'a>(
        name: impl Into<String>,
        final_tick: SimTick,
        steps: StepTally,
        events: impl IntoIterator<Item = &'a StampedEvent>,
        worlds: usize,
    ) -> Self {
        let mut events_by_kind = BTreeMap::new();
        for stamped in events {
            *events_by_kind
                .entry(stamped.event.kind().to_string())
                .or_insert(0) += 1;
        }
        Self {
            name: name.into(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            final_tick,
            steps,
            events_by_kind,
            worlds,
        }
    }

    /// Total committed events.
    pub fn event_count(&self) -> usize {
        self.events_by_kind.values().sum()
    }

    /// Persist as pretty JSON, creating parent dirs if needed.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
