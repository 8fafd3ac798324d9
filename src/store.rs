use std::fs;
use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::{Builder, NamedTempFile};

use crate::error::HarvestError;

#[derive(Debug, Clone)]
pub struct ImageStore {
    root: Utf8PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn ensure_root(&self) -> Result<(), HarvestError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| HarvestError::Filesystem(err.to_string()))
    }

    pub fn photo_path(&self, observation_id: u64, index: usize) -> Utf8PathBuf {
        self.root.join(format!("obs_{observation_id}_photo_{index}.jpg"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Created,
    AlreadyExists,
}

pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), HarvestError> {
    stage(path, content)?
        .persist(path.as_std_path())
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    Ok(())
}

pub fn create_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<Placement, HarvestError> {
    match stage(path, content)?.persist_noclobber(path.as_std_path()) {
        Ok(_) => Ok(Placement::Created),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
            Ok(Placement::AlreadyExists)
        }
        Err(err) => Err(HarvestError::Filesystem(err.to_string())),
    }
}

fn stage(path: &Utf8Path, content: &[u8]) -> Result<NamedTempFile, HarvestError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    let mut temp = Builder::new()
        .prefix(".inat-harvest")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| HarvestError::Filesystem(err.to_string()))?;
    Ok(temp)
}
