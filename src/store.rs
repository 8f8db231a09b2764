//! Persistent local key-value storage.
//!
//! Everything the application keeps between runs (credential, theme,
//! background settings and cached analyses) lives under distinct string keys
//! in one store. [`FileStore`] persists a flat JSON object to disk and rewrites
//! it on every mutation; [`MemoryStore`] backs `--ephemeral` runs.
//!
//! The trait is synchronous. File writes are small and happen inline on the
//! calling task, the same way the CLI reads its config file.
//!
//! Neither backend is encrypted or shared across machines.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// String key to string value storage.
///
/// Reads never fail: an unreadable backend behaves as empty. Writes report
/// [`Error::Store`] when the backend cannot persist.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    /// All keys starting with `prefix`, in sorted order.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;
}

/// In-process store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        prefix_keys(&lock(&self.entries), prefix)
    }
}

/// Store persisted as a single JSON object file.
///
/// The whole map is held in memory. Every `set` or `remove` first re-reads
/// the file, so keys written by another process since `open` survive, then
/// writes the merged map back via a temporary file and a rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store. A file that is not a JSON object of
    /// strings is logged and treated as empty; it is replaced on the next write.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = read_entries(&path)?.unwrap_or_default();
        info!(entries = entries.len(), "Opened local store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory map with what is on disk, if the file is readable.
    fn reload(&self, entries: &mut BTreeMap<String, String>) -> Result<()> {
        if let Some(on_disk) = read_entries(&self.path)? {
            *entries = on_disk;
        }
        Ok(())
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Store(format!("creating {}: {e}", parent.display())))?;
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| Error::Store(format!("serializing store: {e}")))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| Error::Store(format!("writing {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| Error::Store(format!("replacing {}: {e}", self.path.display())))?;
        debug!(entries = entries.len(), "Persisted local store");
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = lock(&self.entries);
        self.reload(&mut entries)?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = lock(&self.entries);
        self.reload(&mut entries)?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        prefix_keys(&lock(&self.entries), prefix)
    }
}

/// Read the store file. `None` when it is missing or not a JSON object of strings.
fn read_entries(path: &Path) -> Result<Option<BTreeMap<String, String>>> {
    match fs::read_to_string(path) {
        Ok(raw) => match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
            Ok(map) => Ok(Some(map)),
            Err(e) => {
                warn!(error = %e, "Store file is not a JSON object of strings; ignoring it");
                Ok(None)
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::Store(format!("reading {}: {e}", path.display()))),
    }
}

/// Lock a map, recovering the data if another thread panicked mid-write.
fn lock(m: &Mutex<BTreeMap<String, String>>) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn prefix_keys(entries: &BTreeMap<String, String>, prefix: &str) -> Vec<String> {
    entries
        .range(prefix.to_string()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, _)| k.clone())
        .collect()
}
