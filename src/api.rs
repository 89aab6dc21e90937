// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace};
use reqwest::Method;
use secrecy::{ExposeSecret as _, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use url::Url;

use crate::{
    error::{self, Result},
    metadata,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A single call against the REST API, relative to the transport's base URL.
#[derive(Debug)]
pub(crate) struct Request {
    pub(crate) method: Method,
    pub(crate) path: &'static str,
    pub(crate) bearer: Option<SecretString>,
    pub(crate) body: Option<Value>,
}

impl Request {
    pub(crate) const fn new(method: Method, path: &'static str) -> Self {
        Self {
            method,
            path,
            bearer: None,
            body: None,
        }
    }

    pub(crate) fn with_bearer(mut self, token: SecretString) -> Self {
        self.bearer = Some(token);
        self
    }

    pub(crate) fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Sends requests and hands back the decoded response body. A response with a
/// non-success status is reported as [`error::Api::Status`]; failures to talk
/// to the server at all are reported as [`error::Error::Transport`].
#[async_trait]
pub(crate) trait Transport: Send + Sync {
    async fn send(&self, req: Request) -> Result<Value>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, req: Request) -> Result<Value> {
        (**self).send(req).await
    }
}

pub(crate) struct Http {
    client: reqwest::Client,
    base: Url,
}

impl Http {
    pub(crate) fn new(mut base: Url) -> Result<Self> {
        // Endpoint paths are relative, so the base has to look like a
        // directory for Url::join to keep its last segment.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .user_agent(metadata::USER_AGENT.as_str())
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client, base })
    }

    pub(crate) const fn base(&self) -> &Url {
        &self.base
    }
}

fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[async_trait]
impl Transport for Http {
    async fn send(&self, req: Request) -> Result<Value> {
        let url = self.base.join(req.path)?;
        debug!("{} {}", req.method, url);

        let mut builder = self.client.request(req.method, url);
        if let Some(token) = req.bearer.as_ref() {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = req.body.as_ref() {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let payload = decode_body(&resp.bytes().await?);
        trace!("Response status {}", status);

        if status.is_success() {
            Ok(payload)
        } else {
            Err(error::Api::Status {
                status: status.as_u16(),
                payload,
            }
            .into())
        }
    }
}

#[async_trait]
pub(crate) trait Executor: Into<Request> + Send + Sized {
    type Response: DeserializeOwned;

    async fn execute<T: Transport + ?Sized>(self, transport: &T) -> Result<Self::Response> {
        let value = transport.send(self.into()).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenPair {
    pub(crate) access: SecretString,
    pub(crate) refresh: SecretString,
}

/// The signed-in user's profile. Only the role is interpreted; everything
/// else the server sends is carried along untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct UserRecord {
    pub(crate) role: String,
    #[serde(flatten)]
    pub(crate) fields: Map<String, Value>,
}

impl UserRecord {
    #[cfg(test)]
    pub(crate) fn with_role(role: &str) -> Self {
        Self {
            role: role.to_owned(),
            fields: Map::new(),
        }
    }
}

pub(crate) struct ObtainToken<'a> {
    pub(crate) identifier: &'a str,
    pub(crate) secret: &'a SecretString,
}

impl From<ObtainToken<'_>> for Request {
    fn from(value: ObtainToken<'_>) -> Self {
        Self::new(Method::POST, "token/").with_body(json!({
            "email": value.identifier,
            "password": value.secret.expose_secret(),
        }))
    }
}

impl Executor for ObtainToken<'_> {
    type Response = TokenPair;
}

pub(crate) struct CurrentUser {
    pub(crate) access: SecretString,
}

impl From<CurrentUser> for Request {
    fn from(value: CurrentUser) -> Self {
        Self::new(Method::GET, "users/me/").with_bearer(value.access)
    }
}

impl Executor for CurrentUser {
    type Response = UserRecord;
}

pub(crate) struct ChangePassword<'a> {
    pub(crate) access: SecretString,
    pub(crate) old: &'a SecretString,
    pub(crate) new: &'a SecretString,
}

impl From<ChangePassword<'_>> for Request {
    fn from(value: ChangePassword<'_>) -> Self {
        Self::new(Method::PUT, "password-change/")
            .with_bearer(value.access)
            .with_body(json!({
                "old_password": value.old.expose_secret(),
                "new_password": value.new.expose_secret(),
            }))
    }
}

impl Executor for ChangePassword<'_> {
    type Response = Value;
}
