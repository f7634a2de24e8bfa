use serde::de::DeserializeOwned;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use westward_game::{AssetError, DataLoader, StaticLoader, parse_asset};

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Loads `<name>.json` documents from a directory. Documents missing from the
/// directory fall back to the bundled copies, so a data directory only needs
/// to hold the catalogs it overrides.
#[derive(Debug, Clone)]
pub struct DirLoader {
    root: PathBuf,
}

impl DirLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DataLoader for DirLoader {
    type Error = LoaderError;

    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned,
    {
        let path = self.path_for(config_name);
        match fs::read_to_string(&path) {
            Ok(json) => {
                log::debug!("loading {config_name} from {}", path.display());
                Ok(parse_asset(config_name, &json)?)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("{config_name} not in {}; using bundled copy", self.root.display());
                Ok(StaticLoader.load_config(config_name)?)
            }
            Err(source) => Err(LoaderError::Io { path, source }),
        }
    }
}
