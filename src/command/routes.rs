// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use inflector::Inflector as _;
use tabled::{
    settings::{object::Segment, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::{
    error::Result,
    route::{Record, Redirect},
};

use super::Context;

/// List the pages of the application and who may open them.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Only list pages whose path starts with this prefix.
    #[arg(long, short)]
    prefix: Option<String>,
}

#[derive(Clone, Debug, Tabled)]
struct Row {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Access")]
    access: String,
    #[tabled(rename = "Redirect")]
    redirect: String,
}

impl From<&Record> for Row {
    fn from(record: &Record) -> Self {
        let declaration = record.declaration();
        Self {
            path: record.pattern().to_owned(),
            name: record.name().unwrap_or_default().to_owned(),
            access: match (declaration.public, declaration.required_role.as_deref()) {
                (true, _) => "Public".to_owned(),
                (false, None) => "Signed In".to_owned(),
                (false, Some(role)) => role.to_title_case(),
            },
            redirect: record
                .redirect()
                .map(Redirect::to_string)
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &Context) -> Result<()> {
        let mut rows: Vec<Row> = ctx
            .gate
            .router()
            .records()
            .iter()
            .filter(|record| {
                self.prefix
                    .as_deref()
                    .map_or(true, |prefix| record.pattern().starts_with(prefix))
            })
            .map(Row::from)
            .collect();
        rows.sort_by(|a, b| a.path.cmp(&b.path));

        if !rows.is_empty() {
            println!(
                "{}",
                Table::new(rows)
                    .with(Style::rounded())
                    .with(Modify::new(Segment::all()).with(Alignment::left()))
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::route::{Route, Router};

    use super::*;

    #[test]
    fn rows_describe_access() {
        let router = Router::new(vec![
            Route::new("/").public(),
            Route::new("/finance").role("finance").children(vec![
                Route::new("").named("FinanceDashboard"),
                Route::new("old").redirect_to_name("FinanceDashboard"),
            ]),
            Route::new("/dash").redirect_to("/finance"),
        ]);

        let rows: Vec<(String, String, String)> = router
            .records()
            .iter()
            .map(Row::from)
            .map(|row| (row.path, row.access, row.redirect))
            .collect();

        assert_eq!(
            rows,
            vec![
                ("/".to_owned(), "Public".to_owned(), String::new()),
                ("/finance".to_owned(), "Finance".to_owned(), String::new()),
                (
                    "/finance/old".to_owned(),
                    "Finance".to_owned(),
                    "FinanceDashboard (by name)".to_owned()
                ),
                ("/finance".to_owned(), "Finance".to_owned(), String::new()),
                ("/dash".to_owned(), "Signed In".to_owned(), "/finance".to_owned()),
            ]
        );
    }
}
