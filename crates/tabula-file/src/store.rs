//! Filesystem storage for record collections.
//!
//! Each collection is one pretty-printed JSON array:
//!
//! ```text
//! $DATA/
//! ├── contatos.json
//! ├── contatos.json.lock
//! └── .contatos.json.<uuid>.tmp   (only while a save is in flight)
//! ```

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use tabula_core::traits::RecordStore;
use tabula_core::{RecordCollection, Result, StorageError};

/// A record store backed by a single JSON file.
///
/// Saves never truncate the target in place: the new document is written
/// to a uniquely named temporary file in the same directory, synced, and
/// renamed over the target while an exclusive lock is held on a sibling
/// `.lock` file. Readers therefore always see either the old or the new
/// complete document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store for the given document path. Nothing is touched on disk
    /// until the first load or save.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_name(&self) -> OsString {
        self.path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("records.json"))
    }

    /// Get the lock file path.
    fn lock_path(&self) -> PathBuf {
        let mut name = self.file_name();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Get a fresh temporary path next to the document.
    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(".");
        name.push(self.file_name());
        name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
        self.path.with_file_name(name)
    }

    fn parse(&self, content: &str) -> Result<RecordCollection> {
        serde_json::from_str(content).map_err(|e| StorageError::corrupt(&self.path, e).into())
    }

    fn write_atomically(&self, content: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;
        lock_file.lock_exclusive()?;

        let temp_path = self.temp_path();
        let written = write_synced(&temp_path, content).and_then(|()| fs::rename(&temp_path, &self.path));

        if written.is_err() && temp_path.exists() {
            if let Err(e) = fs::remove_file(&temp_path) {
                warn!(path = %temp_path.display(), error = %e, "Failed to remove temporary file");
            }
        }

        lock_file.unlock()?;
        written
    }
}

fn write_synced(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content)?;
    file.sync_all()
}

#[async_trait]
impl RecordStore for JsonFileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<RecordCollection> {
        match fs::read_to_string(&self.path) {
            Ok(content) => self.parse(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let empty = RecordCollection::new();
                self.save(&empty).await?;
                debug!("Initialized empty collection");
                Ok(empty)
            }
            Err(e) => Err(StorageError::io(&self.path, e).into()),
        }
    }

    #[instrument(skip(self, collection), fields(path = %self.path.display(), count = collection.len()))]
    async fn save(&self, collection: &RecordCollection) -> Result<()> {
        let mut content = serde_json::to_string_pretty(collection).map_err(StorageError::from)?;
        content.push('\n');

        self.write_atomically(content.as_bytes())
            .map_err(|e| StorageError::io(&self.path, e))?;

        debug!("Saved collection");
        Ok(())
    }
}
