//! Snapshot-vs-state comparison.
//!
//! Only `response_text` is compared: on the contest site the answer is the
//! one field that changes after a clarification is created.

use std::collections::HashSet;

use monitor_core::models::{Change, ChangeKind, ClarificationRecord};

use crate::store::StateStore;

/// Outcome of comparing one record with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    New,
    Updated,
    Unchanged,
}

impl Classification {
    /// The notification kind, or `None` when nothing needs announcing.
    pub fn change_kind(self) -> Option<ChangeKind> {
        match self {
            Classification::New => Some(ChangeKind::New),
            Classification::Updated => Some(ChangeKind::Updated),
            Classification::Unchanged => None,
        }
    }
}

/// Compare `record` with what the store last acknowledged.
///
/// Returns `None` for records without an id; they never take part in diffing.
pub fn classify(record: &ClarificationRecord, store: &StateStore) -> Option<Classification> {
    if !record.is_identifiable() {
        return None;
    }
    Some(match store.get(&record.id) {
        None => Classification::New,
        Some(stored) if stored.response_text != record.response_text => Classification::Updated,
        Some(_) => Classification::Unchanged,
    })
}

/// Turns snapshots into the list of notifications they call for.
pub struct ChangeDetector;

impl ChangeDetector {
    /// Process one snapshot.
    ///
    /// The first snapshot seen by a store becomes its baseline and yields no
    /// changes. Afterwards every new or re-answered record yields one
    /// [`Change`], in document order.
    pub fn process(snapshot: &[ClarificationRecord], store: &mut StateStore) -> Vec<Change> {
        if !store.is_baselined() {
            let seeded = store.seed_baseline(snapshot);
            tracing::debug!(seeded, "baseline snapshot absorbed");
            return Vec::new();
        }
        Self::detect(snapshot, store)
    }

    /// Changes in `snapshot` relative to `store`, without touching it.
    ///
    /// A row repeated within the snapshot is reported once.
    pub fn detect(snapshot: &[ClarificationRecord], store: &StateStore) -> Vec<Change> {
        let mut emitted: HashSet<&str> = HashSet::new();
        let mut changes = Vec::new();

        for record in snapshot {
            let Some(kind) = classify(record, store).and_then(Classification::change_kind) else {
                continue;
            };
            if !emitted.insert(record.id.as_str()) {
                continue;
            }
            changes.push(Change {
                kind,
                record: record.clone(),
            });
        }

        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, question: &str, response: &str) -> ClarificationRecord {
        ClarificationRecord {
            id: id.to_string(),
            user_id: "alice".to_string(),
            clarification_text: question.to_string(),
            response_text: response.to_string(),
            ..Default::default()
        }
    }

    fn baselined(records: &[ClarificationRecord]) -> StateStore {
        let mut store = StateStore::new();
        store.seed_baseline(records);
        store
    }

    // ── classify ──────────────────────────────────────────────────────────────

    #[test]
    fn test_classify_cases() {
        let store = baselined(&[record("1", "q", "")]);

        assert_eq!(
            classify(&record("2", "q", ""), &store),
            Some(Classification::New)
        );
        assert_eq!(
            classify(&record("1", "q", "yes"), &store),
            Some(Classification::Updated)
        );
        assert_eq!(
            classify(&record("1", "q", ""), &store),
            Some(Classification::Unchanged)
        );
        assert_eq!(classify(&record("", "q", "yes"), &store), None);
    }

    #[test]
    fn test_change_kind_mapping() {
        assert_eq!(Classification::New.change_kind(), Some(ChangeKind::New));
        assert_eq!(
            Classification::Updated.change_kind(),
            Some(ChangeKind::Updated)
        );
        assert_eq!(Classification::Unchanged.change_kind(), None);
    }

    // ── process ───────────────────────────────────────────────────────────────

    #[test]
    fn test_baseline_suppresses_notification() {
        let mut store = StateStore::new();
        let snapshot = vec![record("1", "a", ""), record("2", "b", "ok"), record("3", "c", "")];

        let changes = ChangeDetector::process(&snapshot, &mut store);

        assert!(changes.is_empty());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_new_record_detected_after_baseline() {
        let mut store = StateStore::new();
        ChangeDetector::process(&[record("1", "a", "")], &mut store);

        let changes =
            ChangeDetector::process(&[record("1", "a", ""), record("X", "b", "")], &mut store);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::New);
        assert_eq!(changes[0].record.id, "X");
    }

    #[test]
    fn test_question_edit_is_not_a_change() {
        let mut store = baselined(&[record("Y", "original question", "")]);
        let changes = ChangeDetector::process(&[record("Y", "corrected question", "")], &mut store);
        assert!(changes.is_empty());
    }

    #[test]
    fn test_answer_detected_as_update() {
        let mut store = baselined(&[record("Y", "q", "")]);
        let changes = ChangeDetector::process(&[record("Y", "q", "42")], &mut store);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Updated);
        assert_eq!(changes[0].record.response_text, "42");
    }

    #[test]
    fn test_answer_edit_detected_as_update() {
        let mut store = baselined(&[record("Y", "q", "42")]);
        let changes = ChangeDetector::process(&[record("Y", "q", "43")], &mut store);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Updated);
    }

    #[test]
    fn test_detect_does_not_mutate_store() {
        let store = baselined(&[]);
        let changes = ChangeDetector::detect(&[record("1", "q", "")], &store);
        assert_eq!(changes.len(), 1);
        assert!(!store.contains("1"));
    }

    #[test]
    fn test_empty_id_records_are_inert() {
        let mut store = StateStore::new();
        ChangeDetector::process(&[record("", "q", "")], &mut store);
        assert!(store.is_empty());

        let changes = ChangeDetector::process(&[record("", "other", "answered")], &mut store);
        assert!(changes.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_multiple_changes_each_reported_in_order() {
        let mut store = baselined(&[record("1", "a", ""), record("2", "b", "")]);
        let snapshot = vec![
            record("3", "c", ""),
            record("1", "a", "yes"),
            record("2", "b", ""),
            record("4", "d", ""),
        ];

        let changes = ChangeDetector::process(&snapshot, &mut store);
        let summary: Vec<(&str, ChangeKind)> = changes
            .iter()
            .map(|c| (c.record.id.as_str(), c.kind))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("3", ChangeKind::New),
                ("1", ChangeKind::Updated),
                ("4", ChangeKind::New),
            ]
        );
    }

    #[test]
    fn test_repeated_row_reported_once() {
        let mut store = baselined(&[]);
        let snapshot = vec![record("7", "q", ""), record("7", "q", "")];
        let changes = ChangeDetector::process(&snapshot, &mut store);
        assert_eq!(changes.len(), 1);
    }
}
