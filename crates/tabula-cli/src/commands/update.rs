//! Update record command implementation.

use anyhow::{Context, Result};
use clap::Args;
use tabula_core::Mode;

use crate::catalog::Resource;
use crate::output;
use crate::storage::Storage;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Resource holding the record
    #[arg(value_enum)]
    pub resource: Resource,

    /// Record id
    pub id: String,

    /// JSON file with the fields to change (use - for stdin)
    #[arg(long)]
    pub json: Option<String>,
}

pub async fn run(args: UpdateArgs, storage: &Storage) -> Result<()> {
    let id = super::parse_id(&args.id)?;
    let changes = super::read_json(args.json.as_deref())?;
    let service = storage.open(args.resource).await?;
    let context = || format!("Failed to update {}/{}", args.resource.name(), id);

    service.get(&id).await.with_context(context)?;
    service
        .validate(&changes, Mode::Update)
        .context("Invalid changes")?;

    let record = service
        .update(&id, &changes)
        .await
        .with_context(context)?;

    output::json(&record, false)?;
    output::success(&format!("Updated {}/{}", args.resource.name(), id));

    Ok(())
}
