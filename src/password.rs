// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{ffi::OsString, path::Path};

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::task;

use crate::{error::Result, metadata};

#[derive(Debug, Clone)]
pub(crate) struct Request {
    description: String,
    prompt: String,
    error: Option<String>,
}

pub(crate) struct RequestBuilder {
    description: String,
    prompt: String,
    error: Option<String>,
}

impl RequestBuilder {
    pub(crate) fn new(prompt: &str) -> Self {
        Self {
            description: String::new(),
            prompt: prompt.to_owned(),
            error: None,
        }
    }

    pub(crate) fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    pub(crate) fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_owned());
        self
    }

    pub(crate) fn into_request(self) -> Request {
        Request {
            description: self.description,
            prompt: self.prompt,
            error: self.error,
        }
    }
}

#[async_trait]
pub(crate) trait Prompt: Send + Sync {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>>;
}

#[async_trait]
impl<T: Prompt + ?Sized> Prompt for Box<T> {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        (**self).prompt(req).await
    }
}

#[async_trait]
impl<T: Prompt> Prompt for Vec<T> {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        for candidate in self {
            if let r @ (Ok(Some(_)) | Err(_)) = candidate.prompt(req.clone()).await {
                return r;
            }
        }

        Ok(None)
    }
}

pub(crate) struct PinentryPrompt {
    executable: Option<OsString>,
}

impl PinentryPrompt {
    pub(crate) const fn new() -> Self {
        Self { executable: None }
    }

    pub(crate) fn new_with_executable<P: AsRef<Path>>(executable: P) -> Self {
        Self {
            executable: Some(executable.as_ref().as_os_str().into()),
        }
    }
}

#[async_trait]
impl Prompt for PinentryPrompt {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        fn interact<'input>(
            mut input: pinentry::PassphraseInput<'input>,
            title: &'input str,
            req: &'input Request,
        ) -> Result<SecretString> {
            _ = input.required("A password is required to continue.");
            _ = input.with_title(title);
            _ = input.with_prompt(&req.prompt);
            if !req.description.is_empty() {
                _ = input.with_description(&req.description);
            }
            if let Some(e) = req.error.as_ref() {
                _ = input.with_error(e);
            }

            Ok(input.interact()?)
        }

        let title = format!("{} - {}", req.prompt, *metadata::CLIENT_DISPLAY_NAME);

        let input = self
            .executable
            .as_ref()
            .and_then(pinentry::PassphraseInput::with_binary)
            .or_else(pinentry::PassphraseInput::with_default_binary)
            .map(|input| task::spawn_blocking(move || interact(input, &title, &req)));

        Ok(match input {
            Some(fut) => Some(fut.await??),
            None => None,
        })
    }
}

pub(crate) struct RpasswordPrompt;

#[async_trait]
impl Prompt for RpasswordPrompt {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        if let Some(error) = req.error {
            eprintln!("Error: {error}");
        }
        if !req.description.is_empty() {
            eprintln!("{}", req.description);
        }
        let prompt = format!("{}: ", req.prompt);

        Ok(Some(
            task::spawn_blocking(move || rpassword::prompt_password(prompt).map(SecretString::new))
                .await??,
        ))
    }
}

/// Asks for a password, failing if no prompt could produce one.
pub(crate) async fn require<P: Prompt + ?Sized>(prompt: &P, req: Request) -> Result<SecretString> {
    prompt
        .prompt(req)
        .await?
        .ok_or_else(|| crate::error::Password::NoPrompt.into())
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret as _;

    use crate::error::{Error, Result};

    use super::*;

    struct Fixed(Option<&'static str>);

    #[async_trait]
    impl Prompt for Fixed {
        async fn prompt(&self, _: Request) -> Result<Option<SecretString>> {
            Ok(self.0.map(|s| SecretString::new(s.to_owned())))
        }
    }

    #[tokio::test]
    async fn first_answering_prompt_wins() -> Result<()> {
        let chain = vec![Fixed(None), Fixed(Some("pw")), Fixed(Some("other"))];
        let secret = require(&chain, RequestBuilder::new("Password").into_request()).await?;
        assert_eq!(secret.expose_secret(), "pw");
        Ok(())
    }

    #[tokio::test]
    async fn no_answer_is_an_error() {
        let chain = vec![Fixed(None)];
        let result = require(
            &chain,
            RequestBuilder::new("Password")
                .with_description("Sign in")
                .with_error("try again")
                .into_request(),
        )
        .await;
        assert!(matches!(
            result,
            Err(Error::Password(crate::error::Password::NoPrompt))
        ));
    }
}
