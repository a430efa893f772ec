//! Delete record command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::catalog::Resource;
use crate::output;
use crate::storage::Storage;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Resource holding the record
    #[arg(value_enum)]
    pub resource: Resource,

    /// Record id
    pub id: String,
}

pub async fn run(args: DeleteArgs, storage: &Storage) -> Result<()> {
    let id = super::parse_id(&args.id)?;
    let service = storage.open(args.resource).await?;

    let record = service
        .delete(&id)
        .await
        .with_context(|| format!("Failed to delete {}/{}", args.resource.name(), id))?;

    output::json(&record, false)?;
    output::success(&format!("Deleted {}/{}", args.resource.name(), id));

    Ok(())
}
