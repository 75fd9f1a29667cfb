//! Golden-file snapshots of event journals and other serializable state.
//!
//! Goldens are stored as pretty JSON with object keys sorted, so a diff only
//! ever shows real changes. Set `MULTIVERSE_UPDATE_SNAPSHOTS=1` to rewrite them
//! from the current output.

use anyhow::{Context, Result};
use multiverse_core::StampedEvent;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::EventRecord;

/// Environment variable that enables snapshot updates.
pub const UPDATE_SNAPSHOTS_ENV: &str = "MULTIVERSE_UPDATE_SNAPSHOTS";

/// Compare `value` against the golden at `path`, or rewrite the golden when
/// updates are requested.
pub fn assert_json_snapshot<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let actual = canonical_json(value)?;

    if update_requested() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &actual)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        info!(path = %path.display(), "snapshot updated");
        return Ok(());
    }

    let expected = fs::read_to_string(path).with_context(|| {
        format!(
            "No snapshot at {} (set {UPDATE_SNAPSHOTS_ENV}=1 to record one)",
            path.display()
        )
    })?;
    if expected != actual {
        anyhow::bail!(
            "Snapshot {} differs (set {UPDATE_SNAPSHOTS_ENV}=1 to accept)\n\
             --- golden\n{expected}--- actual\n{actual}",
            path.display()
        );
    }
    Ok(())
}

/// Snapshot a journal as the records the JSONL event log carries.
pub fn assert_journal_snapshot<P: AsRef<Path>>(path: P, events: &[StampedEvent]) -> Result<()> {
    let records: Vec<EventRecord<'_>> = events.iter().map(EventRecord::from).collect();
    assert_json_snapshot(path, &records)
}

fn update_requested() -> bool {
    std::env::var(UPDATE_SNAPSHOTS_ENV)
        .map(|flag| matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Pretty JSON of `value` with every object's keys sorted, newline-terminated.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value).context("Failed to serialize snapshot value")?;
    let mut text = serde_json::to_string_pretty(&sorted(value))?;
    text.push('\n');
    Ok(text)
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sorted(value)))
                    .collect::<Map<_, _>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}
