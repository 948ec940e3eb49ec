// Per-container baselines for the derived metrics (CPU ratio, network increments).
// Only the last observation per container is kept.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct CpuHistoryEntry {
    pub total_usage: u64,
    pub system_usage: u64,
    pub last_seen: Instant,
    /// Display name the container's series were last published under.
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetHistoryEntry {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Previous entries handed back by `replace`; both `None` on first observation.
#[derive(Debug, Clone, Default)]
pub struct PriorEntries {
    pub cpu: Option<CpuHistoryEntry>,
    pub net: Option<NetHistoryEntry>,
}

#[derive(Default)]
struct Inner {
    cpu: HashMap<String, CpuHistoryEntry>,
    net: HashMap<String, NetHistoryEntry>,
}

/// Thread-safe store keyed by full container id.
#[derive(Default)]
pub struct DeltaStore {
    inner: RwLock<Inner>,
}

impl DeltaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the new baselines for `id` and return whatever they replaced, in one step.
    pub fn replace(&self, id: &str, cpu: CpuHistoryEntry, net: NetHistoryEntry) -> PriorEntries {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        PriorEntries {
            cpu: inner.cpu.insert(id.to_string(), cpu),
            net: inner.net.insert(id.to_string(), net),
        }
    }

    pub fn cpu(&self, id: &str) -> Option<CpuHistoryEntry> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.cpu.get(id).cloned()
    }

    pub fn net(&self, id: &str) -> Option<NetHistoryEntry> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.net.get(id).copied()
    }

    /// Drop both entries for `id`; returns the CPU entry if one was tracked.
    pub fn remove(&self, id: &str) -> Option<CpuHistoryEntry> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.net.remove(id);
        inner.cpu.remove(id)
    }

    /// (id, name) of every container last seen more than `window` before `now`.
    pub fn stale(&self, now: Instant, window: Duration) -> Vec<(String, String)> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .cpu
            .iter()
            .filter(|(_, e)| now.saturating_duration_since(e.last_seen) > window)
            .map(|(id, e)| (id.clone(), e.name.clone()))
            .collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.cpu.contains_key(id)
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.cpu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
