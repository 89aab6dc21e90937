// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use log::{debug, warn};

use crate::{
    error::{self, Result},
    metadata,
};

use super::{IsPersistent, Slot, Storage};

/// Unencrypted JSON object on disk, one string member per slot.
pub(crate) struct File {
    path: PathBuf,
}

impl File {
    /// Places the file in the user's data directory for this client.
    pub(crate) fn new<P: AsRef<Path>>(file: P) -> Result<Self> {
        let dirs = metadata::PROJECT_DIRS
            .as_ref()
            .ok_or(error::Storage::NoProjectDirs)?;
        Ok(Self::with_path(dirs.data_dir().join(file)))
    }

    pub(crate) fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<BTreeMap<String, String>> {
        match fs::File::open(&self.path) {
            Ok(fp) => Ok(serde_json::from_reader(io::BufReader::new(fp))?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Like [`Self::read`], but content that is not a JSON object of strings is
    /// deleted and treated as empty so it cannot wedge later writes.
    fn read_or_discard(&self) -> Result<BTreeMap<String, String>> {
        match self.read() {
            Err(error::Error::Json(e)) => {
                warn!(
                    "Discarding unreadable session file {}: {}",
                    self.path.display(),
                    e
                );
                let data = BTreeMap::new();
                self.write(&data)?;
                Ok(data)
            }
            other => other,
        }
    }

    fn write(&self, data: &BTreeMap<String, String>) -> Result<()> {
        if data.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
                Ok(()) | Err(_) => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(&self.path)?;
        serde_json::to_writer(file, data)?;
        Ok(())
    }
}

impl IsPersistent for File {
    fn is_persistent(&self) -> bool {
        true
    }
}

#[async_trait]
impl Storage for File {
    async fn get(&mut self, slot: Slot) -> Result<Option<String>> {
        Ok(self.read()?.remove(slot.key()))
    }

    async fn update(&mut self, slot: Slot, value: &str) -> Result<()> {
        let mut data = self.read_or_discard()?;
        _ = data.insert(slot.key().to_owned(), value.to_owned());
        debug!("Writing {} to {}", slot, self.path.display());
        self.write(&data)
    }

    async fn clear(&mut self, slot: Slot) -> Result<()> {
        let mut data = self.read_or_discard()?;
        if data.remove(slot.key()).is_some() {
            self.write(&data)?;
        }
        Ok(())
    }
}
