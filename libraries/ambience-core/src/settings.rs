//! Settings access
//!
//! Typed accessors over the persisted resource list and the last played
//! entry. The session controller and the UI layer receive a `SettingsStore`
//! explicitly; there is no process-wide settings object.

use crate::error::{CoreError, Result};
use crate::types::{Entry, EntryId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// Settings access interface
///
/// Implementations must be cheap to call from the controller task; they are
/// invoked once per activation at most.
pub trait SettingsStore: Send + Sync {
    /// Ordered resource list
    fn entries(&self) -> Result<Vec<Entry>>;

    /// Id of the entry that last started playing, if any
    fn last_played(&self) -> Result<Option<EntryId>>;

    /// Record the entry that just started playing
    fn set_last_played(&self, id: EntryId) -> Result<()>;

    /// Look up a single entry by id
    fn entry(&self, id: EntryId) -> Result<Option<Entry>> {
        Ok(self.entries()?.into_iter().find(|entry| entry.id == id))
    }
}

/// On-disk / in-memory document layout
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    resources: Vec<Entry>,

    #[serde(rename = "last-played", default, skip_serializing_if = "Option::is_none")]
    last_played: Option<EntryId>,
}

fn poisoned() -> CoreError {
    CoreError::settings("settings lock poisoned")
}

/// In-memory settings store
#[derive(Debug, Default)]
pub struct MemorySettings {
    document: RwLock<SettingsDocument>,
}

impl MemorySettings {
    /// Create a store holding the given entries
    pub fn new(entries: Vec<Entry>) -> Self {
        Self {
            document: RwLock::new(SettingsDocument {
                resources: entries,
                last_played: None,
            }),
        }
    }

    /// Preset the last played entry
    pub fn with_last_played(self, id: EntryId) -> Self {
        if let Ok(mut document) = self.document.write() {
            document.last_played = Some(id);
        }
        self
    }
}

impl SettingsStore for MemorySettings {
    fn entries(&self) -> Result<Vec<Entry>> {
        Ok(self.document.read().map_err(|_| poisoned())?.resources.clone())
    }

    fn last_played(&self) -> Result<Option<EntryId>> {
        Ok(self.document.read().map_err(|_| poisoned())?.last_played)
    }

    fn set_last_played(&self, id: EntryId) -> Result<()> {
        self.document.write().map_err(|_| poisoned())?.last_played = Some(id);
        Ok(())
    }
}

/// JSON-file settings store
///
/// File layout:
///
/// ```json
/// {
///   "resources": [{ "type": 0, "name": "Rain", "uri": "/tmp/rain.ogg", "id": 1 }],
///   "last-played": 1
/// }
/// ```
///
/// The file is re-read on every `entries()` call so edits made by another
/// process (for example a preferences tool) are picked up.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    write_lock: RwLock<()>,
}

impl JsonFileSettings {
    /// Open a store backed by `path`
    ///
    /// A missing file is treated as an empty resource list; it is created on
    /// the first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: RwLock::new(()),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the resource list (used by tooling and tests)
    pub fn save_entries(&self, entries: Vec<Entry>) -> Result<()> {
        let _guard = self.write_lock.write().map_err(|_| poisoned())?;
        let mut document = self.load()?;
        document.resources = entries;
        self.store(&document)
    }

    fn load(&self) -> Result<SettingsDocument> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(SettingsDocument::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Settings file {} does not exist yet", self.path.display());
                Ok(SettingsDocument::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, document: &SettingsDocument) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Write to a sibling file first so readers never see a torn document
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(document)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileSettings {
    fn entries(&self) -> Result<Vec<Entry>> {
        let _guard = self.write_lock.read().map_err(|_| poisoned())?;
        Ok(self.load()?.resources)
    }

    fn last_played(&self) -> Result<Option<EntryId>> {
        let _guard = self.write_lock.read().map_err(|_| poisoned())?;
        Ok(self.load()?.last_played)
    }

    fn set_last_played(&self, id: EntryId) -> Result<()> {
        let _guard = self.write_lock.write().map_err(|_| poisoned())?;
        let mut document = self.load()?;
        document.last_played = Some(id);
        self.store(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceKind;

    #[test]
    fn memory_store_looks_up_entries_by_id() {
        let store = MemorySettings::new(vec![
            Entry::new(1, "Rain", SourceKind::LocalFile, "/tmp/rain.ogg"),
            Entry::new(2, "Forest", SourceKind::VideoLink, "https://video/xyz"),
        ]);

        let forest = store.entry(EntryId::new(2)).unwrap().unwrap();
        assert_eq!(forest.name, "Forest");
        assert!(store.entry(EntryId::new(3)).unwrap().is_none());
    }

    #[test]
    fn memory_store_tracks_last_played() {
        let store = MemorySettings::new(Vec::new()).with_last_played(EntryId::new(4));
        assert_eq!(store.last_played().unwrap(), Some(EntryId::new(4)));

        store.set_last_played(EntryId::new(5)).unwrap();
        assert_eq!(store.last_played().unwrap(), Some(EntryId::new(5)));
    }
}
