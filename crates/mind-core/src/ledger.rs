//! Append-only event ledger: the mind's chronological record of everything
//! it perceives, does, and concludes.

use serde::{Deserialize, Serialize};
use sled::{Db, Tree};
use std::sync::atomic::{AtomicU64, Ordering};

const TREE_EVENTS: &str = "events";

/// Category of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Boot notices and other internal milestones.
    System,
    /// Inbound stimuli from the gateway.
    Perception,
    /// Memory or seed ingestion.
    Ingest,
    /// Outcome of a tool invocation.
    ToolResult,
    /// The committed conclusion of a cognition cycle.
    Reflection,
}

/// One immutable ledger entry. `seq` is store-assigned and strictly increasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub seq: u64,
    pub ts_ms: i64,
    pub kind: EventKind,
    pub payload: serde_json::Value,
}

impl Event {
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }
}

/// Sled-backed ledger. Entries are keyed by big-endian `seq` so iteration
/// order is chronological; nothing ever rewrites or deletes an entry.
///
/// The sequence counter is local to the events tree (resumed from the last
/// key at open), so seqs stay dense no matter what else writes to the db.
pub struct EventLedger {
    tree: Tree,
    next_seq: AtomicU64,
}

impl EventLedger {
    pub fn open(db: &Db) -> Result<Self, sled::Error> {
        let tree = db.open_tree(TREE_EVENTS)?;
        let next_seq = match tree.last()? {
            Some((key, _)) => key
                .as_ref()
                .try_into()
                .ok()
                .map(|bytes: [u8; 8]| u64::from_be_bytes(bytes) + 1)
                .unwrap_or(0),
            None => 0,
        };
        Ok(Self {
            tree,
            next_seq: AtomicU64::new(next_seq),
        })
    }

    /// Appends one entry and returns its assigned sequence number.
    pub fn append(&self, kind: EventKind, payload: serde_json::Value) -> Result<u64, sled::Error> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let event = Event {
            seq,
            ts_ms: crate::shared::now_ms(),
            kind,
            payload,
        };
        self.tree.insert(seq.to_be_bytes(), event.to_bytes())?;
        tracing::debug!(target: "mind::ledger", seq, kind = ?kind, "event appended");
        Ok(seq)
    }

    /// The most recent `limit` entries in chronological (oldest-first) order.
    /// Undecodable rows are skipped.
    pub fn recent(&self, limit: usize) -> Result<Vec<Event>, sled::Error> {
        let mut events = Vec::new();
        for item in self.tree.iter().rev().take(limit) {
            let (_key, value) = item?;
            if let Some(event) = Event::from_bytes(&value) {
                events.push(event);
            }
        }
        events.reverse();
        Ok(events)
    }

    /// Total number of entries in the ledger.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
