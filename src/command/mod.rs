// SPDX-FileCopyrightText: 2022 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::{api, error::Result, gate::Gate, password, session, storage};

pub(crate) mod change_password;
pub(crate) mod login;
pub(crate) mod logout;
pub(crate) mod navigate;
pub(crate) mod routes;
pub(crate) mod whoami;

/// Everything a command may need, wired up once by `main`.
pub(crate) struct Context {
    pub(crate) manager: session::Manager<Box<dyn storage::Storage>, api::Http>,
    pub(crate) gate: Gate,
    pub(crate) prompt: Box<dyn password::Prompt>,
}

#[async_trait]
pub(crate) trait Command {
    async fn execute(self, ctx: &Context) -> Result<()>;
}
