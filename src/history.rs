use crate::error::StorageError;
use crate::model::HistoryEntry;
use crate::storage::Storage;

/// Newest-first log of past predictions, mirrored in full to one storage key
/// after every mutation.
pub struct HistoryLog<S: Storage> {
    storage: S,
    key: String,
    entries: Vec<HistoryEntry>,
}

impl<S: Storage> HistoryLog<S> {
    /// Never fails: unreadable or unparsable data yields an empty log.
    pub fn load(storage: S, key: &str) -> Self {
        let entries = match read_entries(&storage, key) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to load history, starting empty");
                Vec::new()
            }
        };
        tracing::info!(count = entries.len(), "history loaded");
        Self {
            storage,
            key: key.to_string(),
            entries,
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.persist();
    }

    pub fn remove(&mut self, id: &str) {
        self.entries.retain(|e| e.id != id);
        self.persist();
    }

    /// Callers confirm with the user first; the log itself never asks.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// Case-insensitive match on bill details or category, order preserved.
    pub fn search(&self, query: &str) -> Vec<&HistoryEntry> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return self.entries.iter().collect();
        }
        self.entries.iter().filter(|e| e.matches(&needle)).collect()
    }

    // Best effort: a failed write is logged and the in-memory log stays authoritative.
    fn persist(&mut self) {
        let result = serde_json::to_string(&self.entries)
            .map_err(StorageError::from)
            .and_then(|json| self.storage.set(&self.key, &json));
        if let Err(e) = result {
            tracing::warn!(key = %self.key, error = %e, "failed to save history");
        }
    }

    #[cfg(test)]
    pub fn into_storage(self) -> S {
        self.storage
    }
}

fn read_entries<S: Storage>(storage: &S, key: &str) -> Result<Vec<HistoryEntry>, StorageError> {
    match storage.get(key)? {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(Vec::new()),
    }
}
