//! In-memory table of submitted records

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use ulid::Ulid;

/// A submitted name/location pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Row key (ULID for timestamp + uniqueness)
    pub id: Ulid,
    pub name: String,
    pub location: String,
    /// Timestamp (Unix milliseconds)
    pub added_at_ms: u64,
}

impl Record {
    /// Create a new record stamped with the current time
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: Ulid::new(),
            name: name.into(),
            location: location.into(),
            added_at_ms: current_timestamp_ms(),
        }
    }
}

/// Append-only, session-local record table
#[derive(Default)]
pub struct RecordTable {
    rows: RwLock<Vec<Record>>,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, returning its row index
    pub fn push(&self, record: Record) -> usize {
        let mut rows = self.rows.write();
        rows.push(record);
        rows.len() - 1
    }

    /// All records in insertion order
    pub fn all(&self) -> Vec<Record> {
        self.rows.read().clone()
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
