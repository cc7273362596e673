//! Filesystem-backed loader and storage for the economy engine.
use solefood_economy::{ConfigError, ConfigLoader, EconomyConfig, SessionSnapshot, SessionStorage};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid session data in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid save slot name {slot:?}")]
    InvalidSlot { slot: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Reads an optional JSON config file. No path means the built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct JsonConfigLoader {
    path: Option<PathBuf>,
}

impl JsonConfigLoader {
    pub const fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl ConfigLoader for JsonConfigLoader {
    type Error = StorageError;

    fn load_config(&self) -> Result<EconomyConfig, Self::Error> {
        let Some(path) = &self.path else {
            return Ok(EconomyConfig::default());
        };
        let raw = fs::read_to_string(path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(EconomyConfig::from_json(&raw)?)
    }
}

/// One pretty-printed JSON file per save slot.
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Slots are plain names made of ASCII letters, digits, `-` and `_`,
    /// so a slot can never address a file outside `root`.
    fn slot_path(&self, slot: &str) -> Result<PathBuf, StorageError> {
        let valid = !slot.is_empty()
            && slot
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            log::warn!("rejected save slot {slot:?}");
            return Err(StorageError::InvalidSlot {
                slot: slot.to_string(),
            });
        }
        Ok(self.root.join(format!("{slot}.json")))
    }
}

impl SessionStorage for DirStorage {
    type Error = StorageError;

    fn save_session(&self, slot: &str, snapshot: &SessionSnapshot) -> Result<(), Self::Error> {
        let path = self.slot_path(slot)?;
        fs::create_dir_all(&self.root).map_err(|source| StorageError::Io {
            path: self.root.clone(),
            source,
        })?;
        let payload = serde_json::to_vec_pretty(snapshot).map_err(|source| StorageError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, payload).map_err(|source| StorageError::Io { path, source })
    }

    fn load_session(&self, slot: &str) -> Result<Option<SessionSnapshot>, Self::Error> {
        let path = self.slot_path(slot)?;
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| StorageError::Json { path, source })
    }

    fn delete_session(&self, slot: &str) -> Result<(), Self::Error> {
        let path = self.slot_path(slot)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solefood_economy::EconomySession;

    fn temp_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "solefood-storage-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn dir_storage_roundtrips_and_deletes() {
        let storage = DirStorage::new(temp_dir("roundtrip"));
        let mut session = EconomySession::new(EconomyConfig::default());
        session.ledger_mut().decay_hygiene(25.0).unwrap();

        storage.save_session("slot", &session.snapshot()).unwrap();
        let loaded = storage.load_session("slot").unwrap().expect("saved");
        assert_eq!(loaded, session.snapshot());

        storage.delete_session("slot").unwrap();
        assert!(storage.load_session("slot").unwrap().is_none());
        storage.delete_session("slot").unwrap();
        let _ = fs::remove_dir_all(storage.root());
    }

    #[test]
    fn slot_names_cannot_leave_the_root() {
        let root = temp_dir("slots");
        let storage = DirStorage::new(root.join("saves"));
        let snapshot = EconomySession::new(EconomyConfig::default()).snapshot();
        for slot in ["../escape", "..", "a/b", "a\\b", "", "/abs", "slot.json"] {
            assert!(
                matches!(
                    storage.save_session(slot, &snapshot),
                    Err(StorageError::InvalidSlot { .. })
                ),
                "slot {slot:?} accepted"
            );
            assert!(storage.load_session(slot).is_err());
            assert!(storage.delete_session(slot).is_err());
        }
        assert!(!root.join("escape.json").exists());
        storage.save_session("seed-42_a", &snapshot).unwrap();
        assert!(storage.load_session("seed-42_a").unwrap().is_some());
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn loader_defaults_without_path_and_reports_bad_files() {
        let cfg = JsonConfigLoader::new(None).load_config().unwrap();
        assert_eq!(cfg, EconomyConfig::default());

        let missing = JsonConfigLoader::new(Some(temp_dir("missing").join("cfg.json")));
        assert!(matches!(
            missing.load_config(),
            Err(StorageError::Io { .. })
        ));

        let dir = temp_dir("bad");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("cfg.json");
        fs::write(&path, r#"{"rescue":{"temp_expansion_ratio":-1}}"#).unwrap();
        let err = JsonConfigLoader::new(Some(path)).load_config().unwrap_err();
        assert!(matches!(err, StorageError::Config(_)));
        let _ = fs::remove_dir_all(dir);
    }
}
