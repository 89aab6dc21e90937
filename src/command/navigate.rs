// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::error::Result;

use super::Context;

/// Check where an attempt to open a page would end up for the current session.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Print the parameters captured from the path.
    #[arg(long, short)]
    params: bool,

    /// The path of the page, for example /teachers/student/12.
    #[clap()]
    path: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let session = ctx.manager.session().await;
        let navigation = ctx.gate.navigate(&self.path, &session);
        let route = navigation.route.as_deref().unwrap_or("(no matching page)");

        match ctx.gate.location(navigation.decision) {
            None => println!("allow {} {}", navigation.path, route),
            Some(location) => println!(
                "{}: {} (wanted {} {})",
                navigation.decision, location, navigation.path, route
            ),
        }

        if self.params {
            for (name, value) in &navigation.params {
                println!("{name}={value}");
            }
        }
        Ok(())
    }
}
