// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::{
    error::{self, Result},
    metadata,
};

use super::{IsPersistent, Slot, Storage};

pub(crate) struct SecretService {
    keyring: oo7::Keyring,
    url: String,
}

impl SecretService {
    fn attributes(&self, slot: Slot) -> HashMap<&str, &str> {
        HashMap::from([
            ("campus.kind", "session"),
            ("campus.url", self.url.as_str()),
            ("campus.slot", slot.key()),
        ])
    }

    async fn item(&self, slot: Slot) -> Result<Option<oo7::Item>> {
        Ok(self
            .keyring
            .search_items(self.attributes(slot))
            .await
            .map_err(error::Storage::from)?
            .into_iter()
            .next())
    }

    pub(crate) async fn new(url: &url::Url) -> Result<Self> {
        Ok(Self {
            keyring: oo7::Keyring::new().await.map_err(error::Storage::from)?,
            url: url.as_str().to_owned(),
        })
    }
}

impl IsPersistent for SecretService {
    fn is_persistent(&self) -> bool {
        true
    }
}

#[async_trait]
impl Storage for SecretService {
    async fn get(&mut self, slot: Slot) -> Result<Option<String>> {
        let data = match self.item(slot).await? {
            Some(item) => {
                let secret = item.secret().await.map_err(error::Storage::from)?;
                Some(String::from_utf8_lossy(&secret).into_owned())
            }
            None => None,
        };
        Ok(data)
    }

    async fn update(&mut self, slot: Slot, value: &str) -> Result<()> {
        let label = format!("{} {}", *metadata::CLIENT_DISPLAY_NAME, slot);
        let secret = SecretString::new(value.to_owned());
        self.keyring
            .create_item(
                &label,
                self.attributes(slot),
                secret.expose_secret().as_bytes(),
                true,
            )
            .await
            .map_err(error::Storage::from)?;
        Ok(())
    }

    async fn clear(&mut self, slot: Slot) -> Result<()> {
        if let Some(item) = self.item(slot).await? {
            item.delete().await.map_err(error::Storage::from)?;
        }
        Ok(())
    }
}
