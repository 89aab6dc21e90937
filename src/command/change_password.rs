// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::error;
use secrecy::ExposeSecret as _;

use crate::{
    error::{self, Result},
    password::{self, RequestBuilder},
};

use super::Context;

const ATTEMPTS: usize = 3;

/// Change the signed-in user's password.
#[derive(Debug, Parser)]
pub(crate) struct Command;

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let old = password::require(
            &*ctx.prompt,
            RequestBuilder::new("Current password").into_request(),
        )
        .await?;

        let mut mismatch = None;
        for _ in 0..ATTEMPTS {
            let mut req = RequestBuilder::new("New password");
            if let Some(message) = mismatch {
                req = req.with_error(message);
            }
            let new = password::require(&*ctx.prompt, req.into_request()).await?;
            let confirmation = password::require(
                &*ctx.prompt,
                RequestBuilder::new("Repeat new password").into_request(),
            )
            .await?;

            if new.expose_secret() != confirmation.expose_secret() {
                mismatch = Some("The passwords did not match.");
                continue;
            }

            return match ctx.manager.change_secret(&old, &new).await {
                Ok(()) => {
                    println!("Password changed");
                    Ok(())
                }
                Err(error::Error::Auth(e)) => {
                    if let Some(payload) = e.payload() {
                        eprintln!("{payload:#}");
                    }
                    Err(e.into())
                }
                Err(e) => Err(e),
            };
        }

        error!("The new password was not confirmed");
        Err(error::Error::Command)
    }
}
