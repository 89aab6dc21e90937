// SPDX-FileCopyrightText: 2022 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use futures_util::lock::Mutex;
use log::{debug, info, warn};
use secrecy::{ExposeSecret as _, SecretString};

use crate::{
    api::{self, Executor as _, Transport, UserRecord},
    error::{self, Result},
    storage::{Slot, Storage},
};

/// A point-in-time view of the persisted session, handed to whatever needs to
/// make decisions about it without touching storage.
#[derive(Debug, Default)]
pub(crate) struct Session {
    access_token: Option<SecretString>,
    refresh_token: Option<SecretString>,
    user: Option<UserRecord>,
}

impl Session {
    #[cfg(test)]
    pub(crate) fn authenticated(
        access_token: SecretString,
        refresh_token: SecretString,
        user: UserRecord,
    ) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token: Some(refresh_token),
            user: Some(user),
        }
    }

    /// Presence of a non-empty access token is all that counts. Expiry is left
    /// to the server.
    pub(crate) const fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub(crate) const fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    pub(crate) const fn refresh_token(&self) -> Option<&SecretString> {
        self.refresh_token.as_ref()
    }
}

fn parse_user(raw: &str) -> Option<UserRecord> {
    match serde_json::from_str(raw) {
        Ok(user) => Some(user),
        Err(e) => {
            warn!("Ignoring cached user profile that could not be read: {}", e);
            None
        }
    }
}

/// Sole owner of writes to the session storage.
pub(crate) struct Manager<S: Storage, T: Transport> {
    storage: Arc<Mutex<S>>,
    transport: Arc<T>,
}

impl<S: Storage, T: Transport> Manager<S, T> {
    pub(crate) fn new(storage: Arc<Mutex<S>>, transport: Arc<T>) -> Self {
        Self { storage, transport }
    }

    /// Exchanges the credentials for a token pair, then fetches and caches the
    /// user's profile. If anything after the exchange fails, every slot is
    /// cleared again so that tokens are never left behind without a user.
    pub(crate) async fn login(&self, identifier: &str, secret: &SecretString) -> Result<UserRecord> {
        let tokens = api::ObtainToken { identifier, secret }
            .execute(&*self.transport)
            .await
            .map_err(|err| match err {
                error::Error::Api(error::Api::Status { status, payload }) => {
                    error::Auth::Rejected { status, payload }.into()
                }
                other => other,
            })?;

        let mut storage = self.storage.lock().await;
        let result = async {
            storage
                .update(Slot::AccessToken, tokens.access.expose_secret())
                .await?;
            storage
                .update(Slot::RefreshToken, tokens.refresh.expose_secret())
                .await?;

            let access = storage
                .get(Slot::AccessToken)
                .await?
                .filter(|token| !token.is_empty())
                .ok_or(error::Auth::NotAuthenticated)?;
            let user = api::CurrentUser {
                access: SecretString::new(access),
            }
            .execute(&*self.transport)
            .await?;

            storage
                .update(Slot::User, &serde_json::to_string(&user)?)
                .await?;
            Ok::<_, error::Error>(user)
        }
        .await;

        match result {
            Ok(user) => {
                info!("Signed in {} with role {}", identifier, user.role);
                Ok(user)
            }
            Err(e) => {
                warn!("Sign-in for {} did not complete, discarding tokens: {}", identifier, e);
                clear_all(&mut *storage).await;
                Err(e)
            }
        }
    }

    pub(crate) async fn logout(&self) {
        let mut storage = self.storage.lock().await;
        clear_all(&mut *storage).await;
        debug!("Session cleared");
    }

    pub(crate) async fn is_authenticated(&self) -> bool {
        self.access_token().await.is_some()
    }

    /// The cached profile, or `None` if there is none or it cannot be read.
    pub(crate) async fn current_user(&self) -> Option<UserRecord> {
        self.read(Slot::User).await.as_deref().and_then(parse_user)
    }

    pub(crate) async fn session(&self) -> Session {
        let mut storage = self.storage.lock().await;
        let access_token = read_slot(&mut *storage, Slot::AccessToken)
            .await
            .filter(|token| !token.is_empty())
            .map(SecretString::new);
        let refresh_token = read_slot(&mut *storage, Slot::RefreshToken)
            .await
            .map(SecretString::new);
        let user = read_slot(&mut *storage, Slot::User)
            .await
            .as_deref()
            .and_then(parse_user);
        Session {
            access_token,
            refresh_token,
            user,
        }
    }

    /// Changes the password of the signed-in user. When the server explains a
    /// refusal, its payload is handed back in [`error::Auth::SecretChangeRejected`].
    pub(crate) async fn change_secret(&self, old: &SecretString, new: &SecretString) -> Result<()> {
        let access = self
            .access_token()
            .await
            .ok_or(error::Auth::NotAuthenticated)?;

        let body = api::ChangePassword {
            access: SecretString::new(access),
            old,
            new,
        }
        .execute(&*self.transport)
        .await
        .map_err(|err| match err {
            error::Error::Api(error::Api::Status { status, payload }) => {
                error::Auth::SecretChangeRejected { status, payload }.into()
            }
            other => other,
        })?;
        debug!("Password change accepted: {}", body);
        Ok(())
    }

    pub(crate) async fn storage_is_persistent(&self) -> bool {
        self.storage.lock().await.is_persistent()
    }

    /// An empty stored token counts as no token.
    async fn access_token(&self) -> Option<String> {
        self.read(Slot::AccessToken)
            .await
            .filter(|token| !token.is_empty())
    }

    async fn read(&self, slot: Slot) -> Option<String> {
        let mut storage = self.storage.lock().await;
        read_slot(&mut *storage, slot).await
    }
}

async fn read_slot<S: Storage + ?Sized>(storage: &mut S, slot: Slot) -> Option<String> {
    match storage.get(slot).await {
        Ok(value) => value,
        Err(e) => {
            warn!("Could not read {} from session storage: {}", slot, e);
            None
        }
    }
}

async fn clear_all<S: Storage + ?Sized>(storage: &mut S) {
    for slot in Slot::ALL {
        if let Err(e) = storage.clear(slot).await {
            warn!("Could not clear {} from session storage: {}", slot, e);
        }
    }
}
