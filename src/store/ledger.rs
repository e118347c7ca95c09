//! Durable single-document store.
//!
//! The whole document lives in one JSON file and is read-modify-written as
//! a unit. Writes go through a temp file plus rename so a crash mid-write
//! leaves the previous blob intact. An unreadable or unparseable blob is
//! treated as "no data"; corrupt persisted state must never hard-crash the
//! app.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::migration;
use super::models::{Action, Document};
use crate::error::{HoldoutError, Result};

pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default blob location under the platform data directory.
    pub fn default_path() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("holdout").join("ledger.json"))
            .ok_or(HoldoutError::DataDirNotFound)
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and migrate the stored document. `Ok(None)` means no usable
    /// data is present (missing file or corrupt blob) and the caller should
    /// start fresh.
    pub fn load(&self) -> Result<Option<Document>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut value: serde_json::Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("ledger blob at {:?} is not parseable ({}), starting fresh", self.path, e);
                return Ok(None);
            }
        };

        migration::migrate(&mut value);

        match serde_json::from_value(value) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) => {
                log::warn!("migrated ledger did not match the document model ({}), starting fresh", e);
                Ok(None)
            }
        }
    }

    pub fn load_or_default(&self) -> Result<Document> {
        Ok(self.load()?.unwrap_or_default())
    }

    /// Replace the whole document on disk.
    pub fn save(&self, doc: &Document) -> Result<()> {
        let dir = self
            .path
            .parent()
            .ok_or_else(|| HoldoutError::validation("ledger path has no parent directory"))?;
        fs::create_dir_all(dir)?;

        let data = serde_json::to_string_pretty(doc)?;
        let tmp_path = dir.join(format!(".ledger.json.tmp.{}", std::process::id()));

        {
            let mut f = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)?;
            f.write_all(data.as_bytes())?;
            f.flush()?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            HoldoutError::Io(e)
        })?;

        Ok(())
    }

    /// Append one action: read whole, push, write whole.
    pub fn append(&self, action: Action) -> Result<Document> {
        let mut doc = self.load_or_default()?;
        doc.action.push(action);
        self.save(&doc)?;
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{ActionKind, CURRENT_VERSION};

    fn store_in(dir: &tempfile::TempDir) -> LedgerStore {
        LedgerStore::new(dir.path().join("ledger.json"))
    }

    #[test]
    fn missing_file_means_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut doc = Document::default();
        doc.action.push(Action::new(100, 100, ActionKind::Used));
        store.save(&doc).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn corrupt_blob_is_fresh_start() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{ not json").unwrap();

        assert!(store.load().unwrap().is_none());
        assert_eq!(store.load_or_default().unwrap(), Document::default());
    }

    #[test]
    fn load_migrates_old_versions() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            r#"{ "version": 1, "action": [], "option": { "activeGoalUse": true } }"#,
        )
        .unwrap();

        let doc = store.load().unwrap().unwrap();
        assert_eq!(doc.version, CURRENT_VERSION);
        assert!(doc.option.active_wait_use);
    }

    #[test]
    fn append_reads_and_writes_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.append(Action::new(10, 10, ActionKind::Used)).unwrap();
        let doc = store.append(Action::new(20, 20, ActionKind::Craved)).unwrap();

        assert_eq!(doc.action.len(), 2);
        assert_eq!(store.load().unwrap().unwrap().action.len(), 2);
    }
}
