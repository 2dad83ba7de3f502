//! RocksDB history backend for the Cachet node.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, DB};

use cachet_credentials::{CredentialError, HistoryBackend, HistoryEntry};

/// Column family names for different data types.
const CF_HISTORY: &str = "history";
const CF_TOMBSTONES: &str = "tombstones";

/// Credential history persisted in RocksDB.
///
/// Entries are keyed by big-endian sequence number so iteration yields them
/// in append order. Tombstones are keyed by credential id.
pub struct RocksHistoryBackend {
    db: DB,
}

impl RocksHistoryBackend {
    /// Open or create a RocksDB database at the given path with column families.
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_HISTORY, Options::default()),
            ColumnFamilyDescriptor::new(CF_TOMBSTONES, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;
        tracing::debug!(path = %path.display(), "history database opened");

        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, CredentialError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| CredentialError::Storage(format!("column family '{}' not found", name)))
    }
}

fn storage_err(e: rocksdb::Error) -> CredentialError {
    CredentialError::Storage(e.to_string())
}

impl HistoryBackend for RocksHistoryBackend {
    fn put(&self, entry: &HistoryEntry) -> Result<(), CredentialError> {
        let value =
            serde_json::to_vec(entry).map_err(|e| CredentialError::Storage(e.to_string()))?;
        self.db
            .put_cf(self.cf(CF_HISTORY)?, entry.seq.to_be_bytes(), value)
            .map_err(storage_err)
    }

    fn delete(&self, seq: u64) -> Result<(), CredentialError> {
        self.db
            .delete_cf(self.cf(CF_HISTORY)?, seq.to_be_bytes())
            .map_err(storage_err)
    }

    fn tombstone(&self, credential_id: &str) -> Result<(), CredentialError> {
        self.db
            .put_cf(self.cf(CF_TOMBSTONES)?, credential_id.as_bytes(), b"")
            .map_err(storage_err)
    }

    fn entries(&self) -> Result<Vec<HistoryEntry>, CredentialError> {
        let mut entries = Vec::new();
        for item in self.db.iterator_cf(self.cf(CF_HISTORY)?, IteratorMode::Start) {
            let (_, value) = item.map_err(storage_err)?;
            let entry: HistoryEntry = serde_json::from_slice(&value)
                .map_err(|e| CredentialError::Storage(format!("corrupt history entry: {}", e)))?;
            entries.push(entry);
        }
        Ok(entries)
    }

    fn tombstones(&self) -> Result<HashSet<String>, CredentialError> {
        let mut ids = HashSet::new();
        for item in self
            .db
            .iterator_cf(self.cf(CF_TOMBSTONES)?, IteratorMode::Start)
        {
            let (key, _) = item.map_err(storage_err)?;
            ids.insert(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(ids)
    }
}
