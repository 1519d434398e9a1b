//! Durable local key-value storage.
//!
//! The client persists three kinds of entries, all string-valued:
//! the session id, the selected customer, and one JSON message log per
//! session.  [`FileStore`] keeps them in a single JSON object on disk and
//! writes through on every mutation; [`MemoryStore`] keeps them in process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cd_domain::error::{Error, Result};
use parking_lot::RwLock;

/// Key holding the device's conversation session id.
pub const SESSION_ID_KEY: &str = "chat_session_id";
/// Key holding the last-picked customer id.
pub const SELECTED_CUSTOMER_KEY: &str = "selected_customer_id";
/// Prefix of the per-session message log key.
pub const MESSAGES_KEY_PREFIX: &str = "chat_messages_";

/// Storage key of the message log for `session_id`.
pub fn messages_key(session_id: &str) -> String {
    format!("{MESSAGES_KEY_PREFIX}{session_id}")
}

/// Synchronous string key-value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// File-backed store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Key-value store backed by one JSON object file.
///
/// The file is read once on open.  Every `set`/`remove` rewrites it via a
/// temp file + rename, so a crash mid-write leaves the previous contents.
/// The in-memory map is only updated once the write succeeded.
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A file that exists but does not parse is logged and treated as
    /// empty; it is overwritten on the next mutation.
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "storage file is corrupt, starting empty"
                    );
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        tracing::debug!(
            entries = entries.len(),
            path = %path.display(),
            "storage opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_snapshot(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| Error::Storage(format!("serializing storage: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(Error::Io(e));
        }
        Ok(())
    }

    /// Apply `mutate` to a copy of the map, persist it, then swap it in.
    fn update(&self, mutate: impl FnOnce(&mut HashMap<String, String>)) -> Result<()> {
        let mut entries = self.entries.write();
        let mut next = entries.clone();
        mutate(&mut next);
        self.write_snapshot(&next)?;
        *entries = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !self.entries.read().contains_key(key) {
            return Ok(());
        }
        self.update(|map| {
            map.remove(key);
        })
    }
}
