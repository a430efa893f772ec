//! Create record command implementation.

use anyhow::{Context, Result};
use clap::Args;
use tabula_core::Mode;

use crate::catalog::Resource;
use crate::output;
use crate::storage::Storage;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Resource to add the record to
    #[arg(value_enum)]
    pub resource: Resource,

    /// JSON file with record fields (use - for stdin)
    #[arg(long)]
    pub json: Option<String>,
}

pub async fn run(args: CreateArgs, storage: &Storage) -> Result<()> {
    let fields = super::read_json(args.json.as_deref())?;
    let service = storage.open(args.resource).await?;
    service
        .validate(&fields, Mode::Create)
        .context("Invalid record")?;

    let record = service
        .create(&fields)
        .await
        .context("Failed to create record")?;

    output::json(&record, false)?;
    output::success(&format!(
        "Created {}/{}",
        args.resource.name(),
        record.id()
    ));

    Ok(())
}
