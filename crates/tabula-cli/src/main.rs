//! tabula - serve and manage small JSON record collections.
//!
//! `tabula serve` exposes the built-in resources over HTTP; the other
//! subcommands operate on the same data directory without a server.

mod catalog;
mod cli;
mod commands;
mod output;
mod storage;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use storage::Storage;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let storage = Storage::new(cli.data_dir, cli.backend)?;

    match cli.command {
        Commands::Serve(args) => commands::serve::run(args, &storage).await,
        Commands::List(args) => commands::list::run(args, &storage).await,
        Commands::Get(args) => commands::get::run(args, &storage).await,
        Commands::Create(args) => commands::create::run(args, &storage).await,
        Commands::Update(args) => commands::update::run(args, &storage).await,
        Commands::Delete(args) => commands::delete::run(args, &storage).await,
    }
}

fn init_logging(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
