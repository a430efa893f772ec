//! Serve command implementation.

use std::io;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use tokio::net::TcpListener;
use tracing::{info, warn};

use tabula_http::{Api, RunMode};

use crate::catalog::Resource;
use crate::output;
use crate::storage::Storage;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Resources to serve (default: all)
    #[arg(value_enum)]
    pub resources: Vec<Resource>,

    /// Address to listen on
    #[arg(long, env = "TABULA_BIND", default_value = "0.0.0.0:3000")]
    pub bind: String,

    /// Development mode echoes server error detail to clients
    #[arg(long, value_enum, env = "TABULA_MODE", default_value = "production")]
    pub mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Development,
    Production,
}

impl From<Mode> for RunMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Development => RunMode::Development,
            Mode::Production => RunMode::Production,
        }
    }
}

pub async fn run(args: ServeArgs, storage: &Storage) -> Result<()> {
    let mut resources = if args.resources.is_empty() {
        Resource::ALL.to_vec()
    } else {
        args.resources
    };
    resources.sort();
    resources.dedup();

    let mut api = Api::new(args.mode.into());
    for resource in resources {
        let service = storage.open(resource).await?;
        storage.seed(resource, &service).await?;
        let count = service
            .list()
            .await
            .with_context(|| format!("Failed to initialize {}", resource.name()))?
            .len();
        info!(
            resource = resource.name(),
            backend = ?storage.backend_for(resource),
            records = count,
            "Initialized store"
        );
        api = api.resource(service);
    }

    let listener = match TcpListener::bind(&args.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            if e.kind() == io::ErrorKind::AddrInUse {
                output::error(&format!("Address {} is already in use", args.bind));
                eprintln!("Stop the other server or pass a different --bind address.");
            }
            return Err(e).with_context(|| format!("Failed to bind {}", args.bind));
        }
    };
    let addr = listener.local_addr().context("Failed to read bound address")?;

    output::success(&format!("Listening on http://{addr}"));
    output::field("Data", &storage.data_dir().display().to_string());
    for endpoint in api.endpoints() {
        output::field("Route", &endpoint);
    }

    tabula_http::serve(listener, api.router(), shutdown_signal())
        .await
        .context("Server failed")?;

    output::success("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
