//! Get record command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::catalog::Resource;
use crate::output;
use crate::storage::Storage;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Resource holding the record
    #[arg(value_enum)]
    pub resource: Resource,

    /// Record id
    pub id: String,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn run(args: GetArgs, storage: &Storage) -> Result<()> {
    let id = super::parse_id(&args.id)?;
    let service = storage.open(args.resource).await?;

    let record = service
        .get(&id)
        .await
        .with_context(|| format!("Failed to get {}/{}", args.resource.name(), id))?;

    output::json(&record, args.pretty)
}
