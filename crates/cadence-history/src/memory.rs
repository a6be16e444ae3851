//! In-process history store.
//!
//! Used when no history API is configured: positions survive track switches
//! within the session but not a restart.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cadence_core::{Error, HistoryKey, HistoryStore, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::trace;

/// What the store remembers about one track or episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    pub key: HistoryKey,
    /// Whole seconds, floored like the server does.
    pub last_position: u64,
    pub play_count: u32,
    pub last_played_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Slot {
    /// Write order, breaks ties between equal timestamps.
    sequence: u64,
    record: HistoryRecord,
}

/// Thread-safe in-memory [`HistoryStore`]. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    records: Arc<DashMap<HistoryKey, Slot>>,
    sequence: Arc<AtomicU64>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &HistoryKey) -> Option<HistoryRecord> {
        self.records.get(key).map(|slot| slot.record.clone())
    }

    /// Most recently saved records, newest first.
    pub fn recent(&self, limit: usize) -> Vec<HistoryRecord> {
        let mut slots: Vec<(u64, HistoryRecord)> = self
            .records
            .iter()
            .map(|slot| (slot.sequence, slot.record.clone()))
            .collect();
        slots.sort_by(|(a_seq, a), (b_seq, b)| {
            b.last_played_at
                .cmp(&a.last_played_at)
                .then(b_seq.cmp(a_seq))
        });
        slots.into_iter().take(limit).map(|(_, r)| r).collect()
    }

    pub fn remove(&self, key: &HistoryKey) -> Option<HistoryRecord> {
        self.records.remove(key).map(|(_, slot)| slot.record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&self) {
        self.records.clear();
    }

    fn record(&self, key: &HistoryKey, position: f64) -> Result<()> {
        if !position.is_finite() || position < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "position must be a non-negative number, got {position}"
            )));
        }

        let last_position = position.floor() as u64;
        let now = Utc::now();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);

        self.records
            .entry(key.clone())
            .and_modify(|slot| {
                slot.sequence = sequence;
                slot.record.last_position = last_position;
                slot.record.play_count += 1;
                slot.record.last_played_at = now;
            })
            .or_insert_with(|| Slot {
                sequence,
                record: HistoryRecord {
                    key: key.clone(),
                    last_position,
                    play_count: 1,
                    last_played_at: now,
                },
            });

        trace!("Recorded {key} at {last_position}s");
        Ok(())
    }
}

impl HistoryStore for MemoryHistory {
    async fn resume_position(&self, key: &HistoryKey) -> Result<Option<f64>> {
        Ok(self
            .get(key)
            .filter(|r| r.last_position > 0)
            .map(|r| r.last_position as f64))
    }

    async fn save_position(&self, key: &HistoryKey, position: f64) -> Result<()> {
        self.record(key, position)
    }
}
