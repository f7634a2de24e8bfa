use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use westward_game::{GameStorage, SaveData};

static SAVE_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 _-]{0,63}$").ok());

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("`{0}` is not a valid save name")]
    InvalidName(String),
    #[error("save file {path} could not be accessed")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("save file {path} is malformed")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One `<save name>.json` file per journey.
#[derive(Debug, Clone)]
pub struct DirStorage {
    root: PathBuf,
}

impl DirStorage {
    /// Open (creating if needed) a save directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StorageError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_valid_name(save_name: &str) -> bool {
        SAVE_NAME
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(save_name))
    }

    fn path_for(&self, save_name: &str) -> Result<PathBuf, StorageError> {
        if Self::is_valid_name(save_name) {
            Ok(self.root.join(format!("{save_name}.json")))
        } else {
            Err(StorageError::InvalidName(save_name.to_string()))
        }
    }
}

impl GameStorage for DirStorage {
    type Error = StorageError;

    fn save(&self, data: &SaveData) -> Result<(), Self::Error> {
        let path = self.path_for(&data.save_name)?;
        let json = data.to_json().map_err(|source| StorageError::Malformed {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        log::debug!("wrote {}", path.display());
        Ok(())
    }

    fn load(&self, save_name: &str) -> Result<Option<SaveData>, Self::Error> {
        let path = self.path_for(save_name)?;
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        SaveData::from_json(&json)
            .map(Some)
            .map_err(|source| StorageError::Malformed { path, source })
    }

    fn delete(&self, save_name: &str) -> Result<(), Self::Error> {
        let path = self.path_for(save_name)?;
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
    use westward_game::{Difficulty, GameAssets, SaveDataBuilder};

    fn temp_storage(label: &str) -> DirStorage {
        DirStorage::open(std::env::temp_dir().join(format!(
            "westward-saves-{label}-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        )))
        .unwrap()
    }

    #[test]
    fn names_must_stay_inside_the_directory() {
        assert!(DirStorage::is_valid_name("oregon-1"));
        assert!(DirStorage::is_valid_name("Donner Party"));
        assert!(!DirStorage::is_valid_name("../escape"));
        assert!(!DirStorage::is_valid_name(""));
        assert!(!DirStorage::is_valid_name(" leading"));
    }

    #[test]
    fn save_load_delete_cycle() {
        let storage = temp_storage("cycle");
        let assets = GameAssets::bundled().unwrap();
        let save = SaveDataBuilder::new(&assets.catalog, &assets.config, 3)
            .save_name("oregon")
            .add_random_member()
            .difficulty(Difficulty::Normal)
            .build()
            .unwrap();
        assert!(storage.load("oregon").unwrap().is_none());
        storage.save(&save).unwrap();
        assert_eq!(storage.load("oregon").unwrap(), Some(save));
        storage.delete("oregon").unwrap();
        assert!(storage.load("oregon").unwrap().is_none());
        storage.delete("oregon").unwrap();
    }

    #[test]
    fn invalid_names_are_rejected_before_io() {
        let storage = temp_storage("invalid");
        assert!(matches!(
            storage.load("a/b"),
            Err(StorageError::InvalidName(name)) if name == "a/b"
        ));
    }
}
