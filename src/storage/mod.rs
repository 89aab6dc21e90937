// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

mod file;
#[cfg(feature = "keychain")]
mod keychain;
mod memory;
#[cfg(feature = "secret-service")]
mod secret_service;

use std::fmt;

use async_trait::async_trait;

use crate::error::Result;

pub(crate) use file::File;
#[cfg(feature = "keychain")]
pub(crate) use keychain::Keychain;
pub(crate) use memory::Memory;
#[cfg(feature = "secret-service")]
pub(crate) use secret_service::SecretService;

/// One of the independent string-keyed values a session is persisted as.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Slot {
    AccessToken,
    RefreshToken,
    User,
}

impl Slot {
    pub(crate) const ALL: [Self; 3] = [Self::AccessToken, Self::RefreshToken, Self::User];

    pub(crate) const fn key(self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
            Self::User => "user",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

pub(crate) trait IsPersistent {
    fn is_persistent(&self) -> bool;
}

impl<T: IsPersistent + ?Sized> IsPersistent for Box<T> {
    fn is_persistent(&self) -> bool {
        (**self).is_persistent()
    }
}

#[async_trait]
pub(crate) trait Storage: Send + Sync + IsPersistent {
    async fn get(&mut self, slot: Slot) -> Result<Option<String>>;
    async fn update(&mut self, slot: Slot, value: &str) -> Result<()>;
    /// Removes the value in the slot. Clearing an empty slot succeeds.
    async fn clear(&mut self, slot: Slot) -> Result<()>;
}

#[async_trait]
impl<T: Storage + ?Sized> Storage for Box<T> {
    async fn get(&mut self, slot: Slot) -> Result<Option<String>> {
        (**self).get(slot).await
    }

    async fn update(&mut self, slot: Slot, value: &str) -> Result<()> {
        (**self).update(slot, value).await
    }

    async fn clear(&mut self, slot: Slot) -> Result<()> {
        (**self).clear(slot).await
    }
}
