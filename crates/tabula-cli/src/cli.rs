//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::catalog::Backend;
use crate::commands::{create, delete, get, list, serve, update};

/// Serve and manage tabula record collections.
#[derive(Parser, Debug)]
#[command(name = "tabula")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Directory holding the collection documents
    #[arg(long, env = "TABULA_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Store every resource in this backend instead of its default
    #[arg(long, value_enum, env = "TABULA_BACKEND", global = true)]
    pub backend: Option<Backend>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve resources over HTTP, seeding empty ones first
    Serve(serve::ServeArgs),

    /// List all records of a resource
    List(list::ListArgs),

    /// Fetch a single record
    Get(get::GetArgs),

    /// Create a record
    Create(create::CreateArgs),

    /// Update fields of a record
    Update(update::UpdateArgs),

    /// Delete a record
    Delete(delete::DeleteArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["tabula", "serve"]).unwrap();
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.bind, "0.0.0.0:3000");
        assert!(args.resources.is_empty());
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tabula", "list", "tarefas", "--backend", "sqlite", "--data-dir", "/tmp/x", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.backend, Some(Backend::Sqlite));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(cli.verbose, 2);
    }
}
