// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;

use super::{IsPersistent, Slot, Storage};

/// Session storage that lives only as long as the process. Clones share the
/// same slots.
#[derive(Clone, Default)]
pub(crate) struct Memory {
    data: Arc<RwLock<HashMap<Slot, String>>>,
}

impl Memory {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl IsPersistent for Memory {
    fn is_persistent(&self) -> bool {
        false
    }
}

#[async_trait]
impl Storage for Memory {
    async fn get(&mut self, slot: Slot) -> Result<Option<String>> {
        let guard = self.data.read().await;
        Ok(guard.get(&slot).cloned())
    }

    async fn update(&mut self, slot: Slot, value: &str) -> Result<()> {
        let target_data = Arc::clone(&self.data);
        let mut guard = target_data.write_owned().await;
        _ = guard.insert(slot, value.to_owned());
        Ok(())
    }

    async fn clear(&mut self, slot: Slot) -> Result<()> {
        let target_data = Arc::clone(&self.data);
        let mut guard = target_data.write_owned().await;
        _ = guard.remove(&slot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Result;

    use super::*;

    #[tokio::test]
    async fn slots_are_independent() -> Result<()> {
        let mut storage = Memory::new();
        storage.update(Slot::AccessToken, "t1").await?;
        storage.update(Slot::RefreshToken, "t2").await?;

        storage.clear(Slot::AccessToken).await?;

        assert_eq!(storage.get(Slot::AccessToken).await?, None);
        assert_eq!(storage.get(Slot::RefreshToken).await?.as_deref(), Some("t2"));
        assert_eq!(storage.get(Slot::User).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn clones_share_state() -> Result<()> {
        let mut storage = Memory::new();
        let mut observer = storage.clone();
        storage.update(Slot::User, r#"{"role":"parent"}"#).await?;

        assert_eq!(
            observer.get(Slot::User).await?.as_deref(),
            Some(r#"{"role":"parent"}"#)
        );
        assert!(!observer.is_persistent());
        Ok(())
    }
}
