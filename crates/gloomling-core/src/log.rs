//! Bounded narrative log.
//!
//! Append-only apart from two operations: dropping the oldest entries
//! (capacity overflow or an explicit [`NarrativeLog::trim_to`]) and
//! replacing the text of one entry by id. A patch for an entry that has
//! already been dropped does nothing.

use std::collections::VecDeque;

use gloomling_types::{Archetype, LogEntry, LogEntryId, LogSource, Stage};

use crate::rules::DEFAULT_LOG_CAPACITY;

/// Ring buffer of [`LogEntry`] values, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl NarrativeLog {
    /// An empty log holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild a log from stored entries, keeping the newest `capacity`.
    pub fn from_entries(entries: Vec<LogEntry>, capacity: usize) -> Self {
        let mut log = Self::new(capacity);
        log.entries = entries.into();
        log.evict_overflow();
        log
    }

    /// Maximum number of entries kept.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a new entry and return its id.
    pub fn push(
        &mut self,
        text: impl Into<String>,
        source: LogSource,
        timestamp: u64,
        pending: bool,
    ) -> LogEntryId {
        let id = LogEntryId::new();
        self.entries.push_back(LogEntry {
            id,
            text: text.into(),
            source,
            timestamp,
            pending,
        });
        self.evict_overflow();
        id
    }

    /// Replace the text of entry `id` and clear its pending flag.
    ///
    /// Returns `false` if no such entry exists any more.
    pub fn patch(&mut self, id: LogEntryId, text: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.text = text.into();
                entry.pending = false;
                true
            }
            None => false,
        }
    }

    /// Keep only the newest `keep` entries. Returns how many were dropped.
    pub fn trim_to(&mut self, keep: usize) -> usize {
        let excess = self.entries.len().saturating_sub(keep);
        self.entries.drain(..excess);
        excess
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Look an entry up by id.
    pub fn get(&self, id: LogEntryId) -> Option<&LogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Iterate oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// All entries, oldest first.
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// The newest `limit` entries, oldest first.
    pub fn recent(&self, limit: usize) -> Vec<LogEntry> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(skip).cloned().collect()
    }

    fn evict_overflow(&mut self) {
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }
}

impl Default for NarrativeLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Standard system lines
// ---------------------------------------------------------------------------

/// SYSTEM line written when a pet is created.
pub fn birth_line(name: &str, archetype: Archetype) -> String {
    format!("{name} the {} stirs inside a fresh egg.", archetype.as_str().to_lowercase())
}

/// SYSTEM line written when the stage changes.
pub fn evolution_line(name: &str, stage: Stage) -> String {
    format!("{name} has evolved into {stage}.")
}

/// SYSTEM line written when the pet collapses.
pub fn death_line(name: &str) -> String {
    format!("{name} has collapsed and does not move.")
}

/// SYSTEM line written after a long offline gap.
pub fn time_passed_line(minutes: u64) -> String {
    let hours = minutes.checked_div(60).unwrap_or(0);
    let rest = minutes.checked_rem(60).unwrap_or(0);
    match (hours, rest) {
        (0, m) => format!("While you were away, {m} minutes passed."),
        (h, 0) => format!("While you were away, {h} hours passed."),
        (h, m) => format!("While you were away, {h} hours and {m} minutes passed."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_patch() {
        let mut log = NarrativeLog::new(10);
        let id = log.push("...", LogSource::Pet, 3, true);
        assert!(log.patch(id, "it hums softly"));
        let entry = log.get(id).cloned();
        assert_eq!(entry.as_ref().map(|e| e.text.as_str()), Some("it hums softly"));
        assert_eq!(entry.map(|e| e.pending), Some(false));
    }

    #[test]
    fn patch_of_evicted_entry_is_dropped() {
        let mut log = NarrativeLog::new(2);
        let first = log.push("one", LogSource::System, 0, true);
        log.push("two", LogSource::System, 1, false);
        log.push("three", LogSource::System, 2, false);
        assert_eq!(log.len(), 2);
        assert!(!log.patch(first, "late"));
        assert!(log.iter().all(|e| e.text != "late"));
    }

    #[test]
    fn trim_keeps_newest() {
        let mut log = NarrativeLog::new(100);
        for i in 0..60 {
            log.push(format!("entry {i}"), LogSource::System, i, false);
        }
        assert_eq!(log.trim_to(50), 10);
        assert_eq!(log.len(), 50);
        assert_eq!(log.iter().next().map(|e| e.timestamp), Some(10));
        assert_eq!(log.trim_to(80), 0);
    }

    #[test]
    fn from_entries_respects_capacity() {
        let mut source = NarrativeLog::new(10);
        for i in 0..5 {
            source.push(format!("e{i}"), LogSource::Pet, i, false);
        }
        let rebuilt = NarrativeLog::from_entries(source.to_vec(), 3);
        assert_eq!(rebuilt.len(), 3);
        assert_eq!(rebuilt.recent(1).first().map(|e| e.timestamp), Some(4));
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let mut log = NarrativeLog::default();
        for i in 0..4 {
            log.push(format!("e{i}"), LogSource::Pet, i, false);
        }
        let tail: Vec<u64> = log.recent(2).iter().map(|e| e.timestamp).collect();
        assert_eq!(tail, vec![2, 3]);
        assert_eq!(log.capacity(), 200);
    }

    #[test]
    fn standard_lines() {
        let birth = birth_line("Mote", Archetype::Husk);
        assert!(birth.contains("husk"));
        assert!(!birth.contains("BABY"));
        assert_eq!(evolution_line("Mote", Stage::Baby), "Mote has evolved into BABY.");
        assert_eq!(time_passed_line(60), "While you were away, 1 hours passed.");
        assert_eq!(
            time_passed_line(125),
            "While you were away, 2 hours and 5 minutes passed."
        );
    }
}
