// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::warn;

use crate::{
    error::Result,
    password::{self, RequestBuilder},
};

use super::Context;

/// Sign in and remember the session.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The email address to sign in with.
    #[arg(env = "CAMPUS_EMAIL")]
    email: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        if ctx.manager.is_authenticated().await {
            warn!("Replacing the existing session");
        }

        let secret = password::require(
            &*ctx.prompt,
            RequestBuilder::new("Password")
                .with_description(&format!("Sign in as {}", self.email))
                .into_request(),
        )
        .await?;

        let user = ctx.manager.login(&self.email, &secret).await?;
        println!("Signed in as {} ({})", self.email, user.role);
        if !ctx.manager.storage_is_persistent().await {
            warn!("The session will not be kept after this command exits");
        }
        Ok(())
    }
}
