// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use inflector::Inflector as _;
use log::error;
use serde_json::Value;
use tabled::{settings::Style, Table, Tabled};

use crate::{
    api::UserRecord,
    error::{self, Result},
};

use super::Context;

/// Show the signed-in user's cached profile.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Print only the user's role.
    #[arg(long)]
    role: bool,
}

#[derive(Clone, Debug, Tabled)]
struct Field {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn fields(user: &UserRecord) -> Vec<Field> {
    let mut fields = vec![Field {
        name: "Role".to_owned(),
        value: user.role.clone(),
    }];
    fields.extend(user.fields.iter().map(|(name, value)| Field {
        name: name.to_title_case(),
        value: match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        },
    }));
    fields
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        if self.role {
            let Some(user) = ctx.manager.current_user().await else {
                error!("No signed-in user");
                return Err(error::Error::Command);
            };
            println!("{}", user.role);
            return Ok(());
        }

        let session = ctx.manager.session().await;
        if !session.is_authenticated() {
            error!("Not signed in");
            return Err(error::Error::Command);
        }

        let Some(user) = session.user() else {
            error!("Signed in, but the cached profile is missing or unreadable; sign in again");
            return Err(error::Error::Command);
        };

        println!("{}", Table::new(fields(user)).with(Style::rounded()));
        if session.refresh_token().is_none() {
            println!("No refresh token is stored.");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn role_comes_first_and_values_are_flattened() -> Result<()> {
        let user: UserRecord = serde_json::from_value(json!({
            "role": "teacher",
            "first_name": "Ada",
            "id": 7,
            "phone": null,
        }))?;

        let rows: Vec<(String, String)> = fields(&user)
            .into_iter()
            .map(|field| (field.name, field.value))
            .collect();

        assert_eq!(
            rows,
            vec![
                ("Role".to_owned(), "teacher".to_owned()),
                ("First Name".to_owned(), "Ada".to_owned()),
                ("Id".to_owned(), "7".to_owned()),
                ("Phone".to_owned(), String::new()),
            ]
        );
        Ok(())
    }
}
