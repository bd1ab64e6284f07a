//! Store persisted as one JSON document on disk.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::{Map, Value};

use super::KeyValueStore;
use crate::error::{OptionExt, ZoomReelResult};

const STORE_FILE: &str = "store.json";

/// Store that rewrites its file after every change.
///
/// Writes go to a sibling temp file that is then renamed over the real one,
/// so the file on disk is always a complete snapshot.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<Map<String, Value>>,
}

impl FileStore {
    /// Open (or start) the store at `path`.
    ///
    /// A missing file is an empty store; an unreadable one is an error rather
    /// than being silently overwritten.
    pub fn open(path: impl Into<PathBuf>) -> ZoomReelResult<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Map::new()
        };

        log::debug!(
            "[STORE] Opened {} ({} entries)",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Open the store in the user's data directory.
    pub fn open_default() -> ZoomReelResult<Self> {
        let dir = dirs::data_dir()
            .context("Failed to get data directory")?
            .join("zoomreel");
        fs::create_dir_all(&dir)?;
        Self::open(dir.join(STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &Map<String, Value>) -> ZoomReelResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| STORE_FILE.to_string());
        let tmp = self.path.with_file_name(format!(".{}.tmp", file_name));

        let content = serde_json::to_string(entries)?;
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> ZoomReelResult<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> ZoomReelResult<()> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value);
        self.flush(&entries)
    }

    fn remove(&self, keys: &[&str]) -> ZoomReelResult<()> {
        let mut entries = self.entries.write();
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() == before {
            return Ok(());
        }
        self.flush(&entries)
    }
}
