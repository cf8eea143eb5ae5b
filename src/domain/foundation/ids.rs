//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Correlation token for one request/response exchange on a connection.
///
/// Opaque to clients: on the wire it is just a string. The server mints them
/// from a [`RequestIdSequence`] so they are unique for the connection's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Wraps an id received from the wire.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Connection-scoped, monotonically increasing source of [`RequestId`]s.
///
/// Ids start at 1 and never repeat within one sequence, so concurrent
/// requests on the same connection cannot collide.
#[derive(Debug, Default)]
pub struct RequestIdSequence {
    next: AtomicU64,
}

impl RequestIdSequence {
    /// Creates a fresh sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next id.
    pub fn next_id(&self) -> RequestId {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        RequestId(n.to_string())
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

/// Identifier of a client-side transcript entry.
///
/// Always generated on the client. Request ids restart on every connection,
/// so they never key transcript entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Creates a new random EntryId.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a transport connection (used in logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new random ConnectionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    mod request_id {
        use super::*;

        #[test]
        fn sequence_starts_at_one_and_increments() {
            let seq = RequestIdSequence::new();
            assert_eq!(seq.next_id().as_str(), "1");
            assert_eq!(seq.next_id().as_str(), "2");
            assert_eq!(seq.allocated(), 2);
        }

        #[test]
        fn sequences_are_independent() {
            let a = RequestIdSequence::new();
            let b = RequestIdSequence::new();
            a.next_id();
            assert_eq!(b.next_id().as_str(), "1");
        }

        #[test]
        fn concurrent_allocation_never_collides() {
            let seq = Arc::new(RequestIdSequence::new());
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let seq = seq.clone();
                    std::thread::spawn(move || (0..250).map(|_| seq.next_id()).collect::<Vec<_>>())
                })
                .collect();

            let mut seen = HashSet::new();
            for handle in handles {
                for id in handle.join().unwrap() {
                    assert!(seen.insert(id), "duplicate request id");
                }
            }
            assert_eq!(seen.len(), 2000);
        }

        #[test]
        fn serializes_as_plain_string() {
            let json = serde_json::to_string(&RequestId::new("42")).unwrap();
            assert_eq!(json, "\"42\"");
        }
    }

    mod entry_id {
        use super::*;

        #[test]
        fn generated_ids_are_unique() {
            assert_ne!(EntryId::generate(), EntryId::generate());
        }
    }
}
