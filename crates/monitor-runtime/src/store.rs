//! In-memory record of what has already been announced.
//!
//! [`StateStore`] maps clarification id → the last record that was either
//! delivered successfully or seen in the baseline snapshot. Entries are only
//! ever inserted or replaced; nothing is evicted for the life of the process.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use monitor_core::models::ClarificationRecord;

/// A record as last acknowledged, with the time it was stored.
#[derive(Debug, Clone)]
pub struct StoredClarification {
    pub record: ClarificationRecord,
    pub recorded_at: DateTime<Utc>,
}

/// Last-notified state, owned by the monitoring loop.
#[derive(Debug, Default)]
pub struct StateStore {
    entries: HashMap<String, StoredClarification>,
    /// Set once the first snapshot has been absorbed.
    baselined: bool,
}

impl StateStore {
    /// Create an empty, not-yet-baselined store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb the first snapshot without announcing anything.
    ///
    /// Records without an id are skipped. Returns the number of distinct ids
    /// now held.
    pub fn seed_baseline(&mut self, snapshot: &[ClarificationRecord]) -> usize {
        let now = Utc::now();
        for record in snapshot.iter().filter(|r| r.is_identifiable()) {
            self.entries.insert(
                record.id.clone(),
                StoredClarification {
                    record: record.clone(),
                    recorded_at: now,
                },
            );
        }
        self.baselined = true;
        self.entries.len()
    }

    /// `true` after [`seed_baseline`](Self::seed_baseline) has run once.
    pub fn is_baselined(&self) -> bool {
        self.baselined
    }

    /// Store `record` as delivered. Returns `false` (and stores nothing) for
    /// records without an id.
    pub fn record_delivered(&mut self, record: ClarificationRecord) -> bool {
        if !record.is_identifiable() {
            return false;
        }
        self.entries.insert(
            record.id.clone(),
            StoredClarification {
                record,
                recorded_at: Utc::now(),
            },
        );
        true
    }

    pub fn get(&self, id: &str) -> Option<&ClarificationRecord> {
        self.entries.get(id).map(|e| &e.record)
    }

    pub fn entry(&self, id: &str) -> Option<&StoredClarification> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
