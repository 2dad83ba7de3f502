use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use arc_swap::ArcSwap;
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};

use crate::credential::VerifiableCredential;
use crate::error::CredentialError;

/// One issued credential as recorded in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Monotonic append sequence number.
    pub seq: u64,
    pub credential_id: String,
    pub issuer: String,
    pub subject: String,
    pub types: Vec<String>,
    pub recorded_at: String,
    pub credential: VerifiableCredential,
}

impl HistoryEntry {
    fn new(seq: u64, credential: VerifiableCredential, recorded_at: String) -> Self {
        Self {
            seq,
            credential_id: credential.id.clone(),
            issuer: credential.issuer.to_string(),
            subject: credential.subject_id().unwrap_or_default().to_string(),
            types: credential.credential_types().map(String::from).collect(),
            recorded_at,
            credential,
        }
    }
}

/// Selects history entries. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFilter {
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default, rename = "type")]
    pub credential_type: Option<String>,
}

impl HistoryFilter {
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        self.issuer.as_ref().map_or(true, |i| *i == entry.issuer)
            && self.subject.as_ref().map_or(true, |s| *s == entry.subject)
            && self
                .credential_type
                .as_ref()
                .map_or(true, |t| entry.types.iter().any(|et| et == t))
    }
}

/// Durable key-value collaborator behind the history.
pub trait HistoryBackend: Send + Sync {
    fn put(&self, entry: &HistoryEntry) -> Result<(), CredentialError>;

    /// Drop an evicted entry.
    fn delete(&self, seq: u64) -> Result<(), CredentialError>;

    /// Record that a credential was removed by the user.
    fn tombstone(&self, credential_id: &str) -> Result<(), CredentialError>;

    /// All stored entries, in ascending `seq` order.
    fn entries(&self) -> Result<Vec<HistoryEntry>, CredentialError>;

    fn tombstones(&self) -> Result<HashSet<String>, CredentialError>;
}

/// Process-local backend; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryHistoryBackend {
    entries: DashMap<u64, HistoryEntry>,
    tombstones: DashSet<String>,
}

impl MemoryHistoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryBackend for MemoryHistoryBackend {
    fn put(&self, entry: &HistoryEntry) -> Result<(), CredentialError> {
        self.entries.insert(entry.seq, entry.clone());
        Ok(())
    }

    fn delete(&self, seq: u64) -> Result<(), CredentialError> {
        self.entries.remove(&seq);
        Ok(())
    }

    fn tombstone(&self, credential_id: &str) -> Result<(), CredentialError> {
        self.tombstones.insert(credential_id.to_string());
        Ok(())
    }

    fn entries(&self) -> Result<Vec<HistoryEntry>, CredentialError> {
        let mut entries: Vec<HistoryEntry> =
            self.entries.iter().map(|e| e.value().clone()).collect();
        entries.sort_by_key(|e| e.seq);
        Ok(entries)
    }

    fn tombstones(&self) -> Result<HashSet<String>, CredentialError> {
        Ok(self.tombstones.iter().map(|t| t.key().clone()).collect())
    }
}

/// Bounded, append-only record of issued credentials.
///
/// `append` and `remove` are serialized by a single writer lock; readers
/// load an immutable snapshot and never block. Once more than `capacity`
/// entries are visible the oldest is evicted.
pub struct CredentialHistory {
    capacity: usize,
    backend: Arc<dyn HistoryBackend>,
    /// Next sequence number; the lock doubles as the writer lock.
    writer: Mutex<u64>,
    snapshot: ArcSwap<Vec<HistoryEntry>>,
}

impl CredentialHistory {
    /// An empty in-memory history.
    pub fn in_memory(capacity: usize) -> Self {
        Self::empty(capacity, Arc::new(MemoryHistoryBackend::new()))
    }

    fn empty(capacity: usize, backend: Arc<dyn HistoryBackend>) -> Self {
        Self {
            capacity: capacity.max(1),
            backend,
            writer: Mutex::new(0),
            snapshot: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Rebuild the history from a backend, skipping tombstoned credentials
    /// and keeping only the newest `capacity` entries.
    pub fn restore(
        capacity: usize,
        backend: Arc<dyn HistoryBackend>,
    ) -> Result<Self, CredentialError> {
        let history = Self::empty(capacity, backend);
        let tombstones = history.backend.tombstones()?;
        let stored = history.backend.entries()?;
        let next_seq = stored.last().map_or(0, |e| e.seq + 1);

        let mut visible: Vec<HistoryEntry> = stored
            .into_iter()
            .filter(|e| !tombstones.contains(&e.credential_id))
            .collect();
        let overflow = visible.len().saturating_sub(history.capacity);
        for evicted in visible.drain(..overflow) {
            history.evict(&evicted);
        }

        tracing::info!(
            entries = visible.len(),
            tombstones = tombstones.len(),
            "credential history restored"
        );
        *history.lock_writer() = next_seq;
        history.snapshot.store(Arc::new(visible));
        Ok(history)
    }

    fn lock_writer(&self) -> MutexGuard<'_, u64> {
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record an issued credential, evicting the oldest entries past capacity.
    pub fn append(
        &self,
        credential: VerifiableCredential,
        recorded_at: String,
    ) -> Result<HistoryEntry, CredentialError> {
        let mut next_seq = self.lock_writer();
        let entry = HistoryEntry::new(*next_seq, credential, recorded_at);
        self.backend.put(&entry)?;
        *next_seq += 1;

        let current = self.snapshot.load();
        let mut entries = Vec::with_capacity(current.len() + 1);
        entries.extend(current.iter().cloned());
        entries.push(entry.clone());

        let overflow = entries.len().saturating_sub(self.capacity);
        let evicted: Vec<HistoryEntry> = entries.drain(..overflow).collect();
        self.snapshot.store(Arc::new(entries));
        tracing::debug!(seq = entry.seq, credential_id = %entry.credential_id, "history entry appended");

        // The entry is committed once stored; a stale evicted record is
        // trimmed again by `restore`.
        for evicted in evicted {
            self.evict(&evicted);
        }
        Ok(entry)
    }

    fn evict(&self, evicted: &HistoryEntry) {
        match self.backend.delete(evicted.seq) {
            Ok(()) => {
                tracing::debug!(credential_id = %evicted.credential_id, "history entry evicted")
            }
            Err(e) => tracing::warn!(
                seq = evicted.seq,
                credential_id = %evicted.credential_id,
                error = %e,
                "failed to delete evicted history entry"
            ),
        }
    }

    /// Tombstone a credential so it no longer appears in listings.
    pub fn remove(&self, credential_id: &str) -> Result<HistoryEntry, CredentialError> {
        let _writer = self.lock_writer();
        let current = self.snapshot.load_full();
        let removed = current
            .iter()
            .find(|e| e.credential_id == credential_id)
            .cloned()
            .ok_or_else(|| CredentialError::CredentialNotFound(credential_id.to_string()))?;

        self.backend.tombstone(credential_id)?;
        let remaining: Vec<HistoryEntry> = current
            .iter()
            .filter(|e| e.credential_id != credential_id)
            .cloned()
            .collect();
        self.snapshot.store(Arc::new(remaining));

        tracing::info!(credential_id, "history entry removed");
        Ok(removed)
    }

    /// Matching entries, newest first.
    pub fn list(&self, filter: &HistoryFilter) -> Vec<HistoryEntry> {
        self.snapshot
            .load()
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect()
    }

    pub fn get(&self, credential_id: &str) -> Option<HistoryEntry> {
        self.snapshot
            .load()
            .iter()
            .find(|e| e.credential_id == credential_id)
            .cloned()
    }

    /// The current snapshot, oldest first.
    pub fn snapshot(&self) -> Arc<Vec<HistoryEntry>> {
        self.snapshot.load_full()
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
