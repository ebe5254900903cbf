//! Last-issued-request-wins bookkeeping for in-flight catalog reads.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::keys::{QueryFamily, QueryKey};

/// Proof that a request was issued for `key` at a given generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    key: QueryKey,
    generation: u64,
}

/// Tracks the most recently issued request per query key.
///
/// A response is only allowed to update shared state while its ticket is
/// still current; issuing a newer request for the same key, or retiring the
/// key's family after a write, supersedes every older ticket.
#[derive(Debug, Default)]
pub struct RequestGenerations {
    next: AtomicU64,
    current: DashMap<QueryKey, u64>,
}

impl RequestGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, key: QueryKey) -> RequestTicket {
        let generation = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        self.current.insert(key.clone(), generation);
        RequestTicket { key, generation }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.current
            .get(&ticket.key)
            .is_some_and(|entry| *entry.value() == ticket.generation)
    }

    /// Mark the ticket's request as finished, returning whether it was still
    /// current. Finished keys stop being tracked.
    pub fn complete(&self, ticket: &RequestTicket) -> bool {
        self.current
            .remove_if(&ticket.key, |_, generation| *generation == ticket.generation)
            .is_some()
    }

    /// Supersede all in-flight requests for keys in `family`.
    pub fn retire_family(&self, family: QueryFamily) {
        self.current.retain(|key, _| key.family() != family);
    }

    pub fn retire_all(&self) {
        self.current.clear();
    }
}
