//! Data directory resolution and opening resource services.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing::{debug, info};

use tabula_core::{DocumentRepository, EntityService};
use tabula_file::JsonFileStore;
use tabula_sqlite::SqliteRepository;

use crate::catalog::{Backend, Resource};

/// Where and how resources are stored.
#[derive(Debug)]
pub struct Storage {
    data_dir: PathBuf,
    backend: Option<Backend>,
}

impl Storage {
    /// Use `data_dir`, or the platform data directory when unset.
    pub fn new(data_dir: Option<PathBuf>, backend: Option<Backend>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => ProjectDirs::from("", "", "tabula")
                .context("Could not determine data directory")?
                .data_dir()
                .to_path_buf(),
        };

        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;

        debug!(data_dir = %data_dir.display(), "Using data directory");
        Ok(Self { data_dir, backend })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn backend_for(&self, resource: Resource) -> Backend {
        self.backend.unwrap_or(resource.default_backend())
    }

    /// Open the service for a resource.
    pub async fn open(&self, resource: Resource) -> Result<EntityService> {
        let backend = self.backend_for(resource);
        let path = self.data_dir.join(resource.file_name(backend));
        let schema = resource.schema();

        let service = match backend {
            Backend::Json => {
                EntityService::new(schema, DocumentRepository::new(JsonFileStore::new(&path)))
            }
            Backend::Sqlite => {
                let repo = SqliteRepository::open(&path, &schema)
                    .with_context(|| format!("Failed to open database {}", path.display()))?;
                EntityService::new(schema, repo)
            }
        };

        Ok(service)
    }

    /// Fill an empty resource with its initial records. Returns how many were added.
    pub async fn seed(&self, resource: Resource, service: &EntityService) -> Result<usize> {
        let seeded = service
            .seed(&resource.seeds())
            .await
            .with_context(|| format!("Failed to seed {}", resource.name()))?;
        if seeded > 0 {
            info!(resource = resource.name(), count = seeded, "Seeded initial records");
        }
        Ok(seeded)
    }
}
