//! List records command implementation.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use crate::catalog::Resource;
use crate::output;
use crate::storage::Storage;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Resource to list
    #[arg(value_enum)]
    pub resource: Resource,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(args: ListArgs, storage: &Storage) -> Result<()> {
    let service = storage.open(args.resource).await?;

    let records = service.list().await.context("Failed to list records")?;

    if records.is_empty() {
        eprintln!("{}", "No records found.".dimmed());
        return Ok(());
    }

    for record in &records {
        output::json(record, args.pretty)?;
    }

    Ok(())
}
