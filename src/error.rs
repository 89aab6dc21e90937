// SPDX-FileCopyrightText: 2022 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{convert::Infallible, io, result};

use thiserror::Error;

pub(crate) type Result<T, E = Error> = result::Result<T, E>;

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("JSON format error: {0}")]
    Json(serde_json::Error),
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("API error: {0}")]
    Api(#[from] Api),
    #[error("authentication error: {0}")]
    Auth(#[from] Auth),
    #[error("storage error: {0}")]
    Storage(#[from] Storage),
    #[error("password retrieval error: {0}")]
    Password(#[from] Password),
    #[error("command execution failed")]
    Command,
    #[error("operation cancelled")]
    Cancelled,
}

impl From<pinentry::Error> for Error {
    fn from(value: pinentry::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(
            clippy::wildcard_enum_match_arm,
            clippy::match_wildcard_for_single_variants
        )]
        match value {
            pinentry::Error::Cancelled | pinentry::Error::Timeout => Self::Cancelled,
            pinentry::Error::Io(e) => Self::Io(e),
            _ => Self::Password(Password::Pinentry(value)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(clippy::wildcard_enum_match_arm)]
        match value.classify() {
            serde_json::error::Category::Io => Self::Io(value.into()),
            _ => Self::Json(value),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Io(value.into())
    }
}

impl From<Infallible> for Error {
    fn from(_: Infallible) -> Self {
        unreachable!()
    }
}

/// A response the server sent back with a non-success status. The payload is
/// the decoded JSON body, or the raw text when the body was not JSON.
#[derive(Error, Debug)]
pub(crate) enum Api {
    #[error("server responded with status {status}: {payload}")]
    Status {
        status: u16,
        payload: serde_json::Value,
    },
}

#[derive(Error, Debug)]
pub(crate) enum Auth {
    #[error("the server rejected the supplied credentials (status {status}): {payload}")]
    Rejected {
        status: u16,
        payload: serde_json::Value,
    },
    #[error("the server refused the password change (status {status}): {payload}")]
    SecretChangeRejected {
        status: u16,
        payload: serde_json::Value,
    },
    #[error("there is no signed-in session")]
    NotAuthenticated,
}

impl Auth {
    /// The structured payload the server explained the failure with, if any.
    pub(crate) const fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Rejected { payload, .. } | Self::SecretChangeRejected { payload, .. } => {
                Some(payload)
            }
            Self::NotAuthenticated => None,
        }
    }
}

#[derive(Error, Debug)]
pub(crate) enum Storage {
    #[error("no project directories are available on this system")]
    NoProjectDirs,
    #[cfg(feature = "secret-service")]
    #[error("secret service error: {0}")]
    SecretService(#[from] oo7::Error),
    #[cfg(feature = "keychain")]
    #[error("keychain error: {0}")]
    Keychain(#[from] security_framework::base::Error),
}

#[derive(Error, Debug)]
pub(crate) enum Password {
    #[error("no password prompt available")]
    NoPrompt,
    #[error("Pinentry implementation error: {0}")]
    Pinentry(pinentry::Error),
}
