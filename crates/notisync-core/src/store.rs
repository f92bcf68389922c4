//! In-memory notification store
//!
//! The single source of truth for one session's notification list. Mutation
//! happens exclusively through the primitives below, which maintain two
//! invariants: no two entries share an id, and the unread counter always
//! equals the number of unread entries. The primitives are synchronous and
//! perform no I/O; reconciling them with the server is the coordinator's job.

use std::collections::HashSet;
use std::time::Duration;

use crate::model::{Notification, RawNotification};
use crate::types::NotificationId;

// ----------------------------------------------------------------------------
// Constants
// ----------------------------------------------------------------------------

/// Default tolerance for the near-duplicate heuristic. Two records with
/// identical title and body whose creation times differ by strictly less
/// than this are treated as one logical event.
pub const DEFAULT_DUPLICATE_WINDOW: Duration = Duration::from_secs(5);

// ----------------------------------------------------------------------------
// Store Statistics
// ----------------------------------------------------------------------------

/// Counters for store behavior, mostly useful in logs and tests
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    /// Full-list replacements performed
    pub bulk_refreshes: u64,
    /// Upserts dropped because the id was already present
    pub duplicate_ids_ignored: u64,
    /// Upserts dropped by the content/time-window heuristic
    pub near_duplicates_ignored: u64,
}

// ----------------------------------------------------------------------------
// Notification Store
// ----------------------------------------------------------------------------

/// Ordered notification list (newest first) with a derived unread counter
#[derive(Debug)]
pub struct NotificationStore {
    /// Entries, newest first
    entries: Vec<Notification>,
    /// Id index backing O(1) duplicate checks
    ids: HashSet<NotificationId>,
    /// Unread counter, maintained incrementally
    unread: usize,
    /// Tolerance for the near-duplicate heuristic
    duplicate_window: Duration,
    /// Statistics
    stats: StoreStats,
}

impl NotificationStore {
    /// Create an empty store with the given near-duplicate window
    pub fn new(duplicate_window: Duration) -> Self {
        Self {
            entries: Vec::new(),
            ids: HashSet::new(),
            unread: 0,
            duplicate_window,
            stats: StoreStats::default(),
        }
    }

    /// Replace the whole list with a freshly fetched snapshot
    ///
    /// Every record is normalized; on duplicate ids within the snapshot the
    /// first occurrence wins so the uniqueness invariant holds. The server
    /// already returns newest-first, so order is taken verbatim. The unread
    /// counter is recomputed from scratch.
    pub fn bulk_replace(&mut self, raw: Vec<RawNotification>) {
        self.entries.clear();
        self.ids.clear();

        for record in raw {
            let notification = Notification::from(record);
            if self.ids.insert(notification.id) {
                self.entries.push(notification);
            }
        }

        self.unread = self.entries.iter().filter(|n| !n.read).count();
        self.stats.bulk_refreshes += 1;
    }

    /// Insert a push-delivered notification at the head of the list
    ///
    /// Duplicate delivery is idempotent: a record whose id is already present
    /// is dropped, as is a record that near-duplicates an existing entry
    /// (same title and body, creation times within the tolerance window;
    /// this absorbs the server race where one event is both pushed and
    /// polled under a transient id mismatch). Returns whether the record
    /// was inserted.
    pub fn upsert_one(&mut self, raw: RawNotification) -> bool {
        let notification = Notification::from(raw);

        if self.ids.contains(&notification.id) {
            self.stats.duplicate_ids_ignored += 1;
            return false;
        }
        if self.is_near_duplicate(&notification) {
            self.stats.near_duplicates_ignored += 1;
            return false;
        }

        if !notification.read {
            self.unread += 1;
        }
        self.ids.insert(notification.id);
        self.entries.insert(0, notification);
        true
    }

    /// Set a record's read flag; no-op when already read or id unknown
    pub fn mark_read(&mut self, id: NotificationId) -> bool {
        match self.entries.iter_mut().find(|n| n.id == id) {
            Some(entry) if !entry.read => {
                entry.read = true;
                self.unread = self.unread.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    /// Mark every record read; returns how many flipped
    pub fn mark_all_read(&mut self) -> usize {
        let mut flipped = 0;
        for entry in &mut self.entries {
            if !entry.read {
                entry.read = true;
                flipped += 1;
            }
        }
        self.unread = 0;
        flipped
    }

    /// Delete a record; no-op when the id is unknown
    pub fn remove(&mut self, id: NotificationId) -> bool {
        let Some(position) = self.entries.iter().position(|n| n.id == id) else {
            return false;
        };
        let removed = self.entries.remove(position);
        self.ids.remove(&id);
        if !removed.read {
            self.unread = self.unread.saturating_sub(1);
        }
        true
    }

    /// Current list, newest first
    pub fn notifications(&self) -> &[Notification] {
        &self.entries
    }

    /// Number of unread entries
    pub fn unread_count(&self) -> usize {
        self.unread
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.ids.contains(&id)
    }

    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Content/time-window duplicate heuristic. The comparison is strict, so
    /// a delta of exactly the window is not a duplicate. Records whose
    /// timestamps do not parse never fuzzy-match; their id is the only
    /// dedup key.
    fn is_near_duplicate(&self, candidate: &Notification) -> bool {
        let Some(candidate_at) = candidate.created_at_utc() else {
            return false;
        };
        let window_ms = self.duplicate_window.as_millis() as i64;

        self.entries.iter().any(|existing| {
            existing.title == candidate.title
                && existing.body == candidate.body
                && existing
                    .created_at_utc()
                    .is_some_and(|at| (at - candidate_at).num_milliseconds().abs() < window_ms)
        })
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new(DEFAULT_DUPLICATE_WINDOW)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: i64, read: bool, title: &str) -> RawNotification {
        serde_json::from_str(&format!(
            r#"{{"id": {}, "isRead": {}, "title": "{}"}}"#,
            id, read, title
        ))
        .unwrap()
    }

    fn raw_at(id: i64, title: &str, body: &str, created_at: &str) -> RawNotification {
        serde_json::from_str(&format!(
            r#"{{"id": {}, "title": "{}", "message": "{}", "createdAt": "{}"}}"#,
            id, title, body, created_at
        ))
        .unwrap()
    }

    fn recount(store: &NotificationStore) -> usize {
        store.notifications().iter().filter(|n| !n.read).count()
    }

    #[test]
    fn test_upsert_then_duplicate_then_read_then_remove() {
        let mut store = NotificationStore::default();

        assert!(store.upsert_one(raw(1, false, "A")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.unread_count(), 1);

        // Duplicate delivery of the same id is idempotent.
        assert!(!store.upsert_one(raw(1, false, "A")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.unread_count(), 1);
        assert_eq!(store.stats().duplicate_ids_ignored, 1);

        assert!(store.mark_read(NotificationId(1)));
        assert_eq!(store.unread_count(), 0);

        assert!(store.remove(NotificationId(1)));
        assert!(store.is_empty());
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_bulk_replace_then_prepend() {
        let mut store = NotificationStore::default();
        store.bulk_replace(vec![raw(5, false, "five"), raw(6, true, "six")]);
        assert_eq!(store.unread_count(), 1);

        assert!(store.upsert_one(raw(7, false, "seven")));
        let ids: Vec<i64> = store.notifications().iter().map(|n| n.id.as_i64()).collect();
        assert_eq!(ids, vec![7, 5, 6]);
        assert_eq!(store.unread_count(), 2);
    }

    #[test]
    fn test_bulk_replace_keeps_first_of_duplicate_ids() {
        let mut store = NotificationStore::default();
        store.bulk_replace(vec![raw(1, false, "first"), raw(1, true, "second")]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.notifications()[0].title, "first");
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_mark_read_is_noop_for_read_or_missing() {
        let mut store = NotificationStore::default();
        store.upsert_one(raw(1, true, "A"));

        assert!(!store.mark_read(NotificationId(1)));
        assert!(!store.mark_read(NotificationId(99)));
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_mark_all_read_idempotent() {
        let mut store = NotificationStore::default();
        store.bulk_replace(vec![raw(1, false, "a"), raw(2, false, "b"), raw(3, true, "c")]);

        assert_eq!(store.mark_all_read(), 2);
        assert_eq!(store.unread_count(), 0);

        assert_eq!(store.mark_all_read(), 0);
        assert_eq!(store.unread_count(), 0);
        assert_eq!(recount(&store), 0);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut store = NotificationStore::default();
        store.upsert_one(raw(1, false, "A"));

        assert!(!store.remove(NotificationId(2)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_near_duplicate_within_window_is_merged() {
        let mut store = NotificationStore::default();
        store.upsert_one(raw_at(10, "T", "B", "2024-03-01T12:00:00Z"));

        // Different id, same content, 3 s apart: same logical event.
        assert!(!store.upsert_one(raw_at(11, "T", "B", "2024-03-01T12:00:03Z")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.stats().near_duplicates_ignored, 1);
    }

    #[test]
    fn test_near_duplicate_at_exact_window_is_kept() {
        let mut store = NotificationStore::default();
        store.upsert_one(raw_at(10, "T", "B", "2024-03-01T12:00:00Z"));

        // Delta of exactly 5 s: the strict comparison keeps the record.
        assert!(store.upsert_one(raw_at(11, "T", "B", "2024-03-01T12:00:05Z")));
        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().near_duplicates_ignored, 0);
    }

    #[test]
    fn test_near_duplicate_outside_window_is_kept() {
        let mut store = NotificationStore::default();
        store.upsert_one(raw_at(10, "T", "B", "2024-03-01T12:00:00Z"));

        assert!(store.upsert_one(raw_at(11, "T", "B", "2024-03-01T12:00:06Z")));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_near_duplicate_window_is_tunable() {
        let mut store = NotificationStore::new(Duration::from_secs(30));
        store.upsert_one(raw_at(10, "T", "B", "2024-03-01T12:00:00Z"));

        assert!(!store.upsert_one(raw_at(11, "T", "B", "2024-03-01T12:00:20Z")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_malformed_timestamps_never_fuzzy_match() {
        let mut store = NotificationStore::default();
        store.upsert_one(raw_at(10, "T", "B", "garbage"));

        // Identical content but neither side has a parseable time.
        assert!(store.upsert_one(raw_at(11, "T", "B", "also garbage")));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_counter_invariant_across_mixed_sequence() {
        let mut store = NotificationStore::default();
        store.bulk_replace(vec![raw(1, false, "a"), raw(2, true, "b")]);
        store.upsert_one(raw(3, false, "c"));
        store.mark_read(NotificationId(1));
        store.remove(NotificationId(3));
        store.upsert_one(raw(4, false, "d"));
        store.mark_all_read();
        store.upsert_one(raw(5, false, "e"));
        store.remove(NotificationId(5));

        assert_eq!(store.unread_count(), recount(&store));
    }
}
