//! FileGateway: fragment metadata and data on a local filesystem.
//!
//! Layout:
//! ```text
//! {base_path}/
//! ├── metadata/
//! │   └── {owner_key}/
//! │       └── {id_key}.json   # FragmentRecord
//! └── objects/
//!     └── {owner_key}/
//!         └── {id_key}        # raw payload
//! ```
//!
//! Both keys are fixed-length digests, so file names stay short whatever the
//! ids look like. Writes go to a temporary sibling first and are renamed into
//! place, so a reader never observes a half-written file. All I/O goes through
//! `tokio::fs`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::key::{IdKey, OwnerKey};
use super::StorageGateway;
use crate::error::{FragmentError, FragmentResult};
use crate::record::{FragmentRecord, ListEntry};

/// Filesystem-backed gateway.
#[derive(Debug, Clone)]
pub struct FileGateway {
    base_path: PathBuf,
}

impl FileGateway {
    /// Create a gateway rooted at `path`. Directories are created on first write.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn metadata_dir(&self, owner_id: &str) -> PathBuf {
        self.base_path
            .join("metadata")
            .join(OwnerKey::from_owner(owner_id).as_str())
    }

    fn metadata_path(&self, owner_id: &str, id: &str) -> PathBuf {
        self.metadata_dir(owner_id)
            .join(format!("{}.json", IdKey::from_id(id).as_str()))
    }

    fn object_path(&self, owner_id: &str, id: &str) -> PathBuf {
        self.base_path
            .join("objects")
            .join(OwnerKey::from_owner(owner_id).as_str())
            .join(IdKey::from_id(id).as_str())
    }

    async fn read_record(path: &Path) -> FragmentResult<FragmentRecord> {
        let json = fs::read(path).await?;
        Ok(serde_json::from_slice(&json)?)
    }
}

/// Write via a temporary file and rename into place.
async fn write_atomic(path: &Path, contents: &[u8]) -> FragmentResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension(format!("tmp-{}", Uuid::new_v4().simple()));
    let written = match fs::write(&tmp, contents).await {
        Ok(()) => fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        // A failed write can leave a partial temp file behind too.
        let _ = fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

fn not_found_or_io(err: std::io::Error, id: &str) -> FragmentError {
    if err.kind() == ErrorKind::NotFound {
        FragmentError::NotFound(id.to_string())
    } else {
        FragmentError::Io(err.to_string())
    }
}

#[async_trait]
impl StorageGateway for FileGateway {
    async fn read_metadata(&self, owner_id: &str, id: &str) -> FragmentResult<FragmentRecord> {
        let path = self.metadata_path(owner_id, id);
        let json = fs::read(&path)
            .await
            .map_err(|e| not_found_or_io(e, id))?;
        Ok(serde_json::from_slice(&json)?)
    }

    #[instrument(skip(self, record))]
    async fn write_metadata(
        &self,
        owner_id: &str,
        id: &str,
        record: &FragmentRecord,
    ) -> FragmentResult<()> {
        let json = serde_json::to_vec(record)?;
        write_atomic(&self.metadata_path(owner_id, id), &json).await
    }

    async fn read_data(&self, owner_id: &str, id: &str) -> FragmentResult<Vec<u8>> {
        fs::read(self.object_path(owner_id, id))
            .await
            .map_err(|e| not_found_or_io(e, id))
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn write_data(&self, owner_id: &str, id: &str, data: &[u8]) -> FragmentResult<()> {
        write_atomic(&self.object_path(owner_id, id), data).await
    }

    #[instrument(skip(self))]
    async fn list_metadata(&self, owner_id: &str, expand: bool) -> FragmentResult<Vec<ListEntry>> {
        let dir = self.metadata_dir(owner_id);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            // Skip anything that is not a key we wrote.
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.parse::<IdKey>().is_err() {
                continue;
            }

            let record = Self::read_record(&path).await?;
            let id = record.id.clone().ok_or_else(|| {
                FragmentError::Io(format!("metadata file {} has no id", path.display()))
            })?;
            records.push((id, record));
        }
        records.sort_by(|a, b| a.0.cmp(&b.0));

        let listing: Vec<ListEntry> = records
            .into_iter()
            .map(|(id, record)| {
                if expand {
                    ListEntry::Record(record)
                } else {
                    ListEntry::Id(id)
                }
            })
            .collect();
        debug!(owner = %owner_id, count = listing.len(), "listed metadata");
        Ok(listing)
    }

    #[instrument(skip(self))]
    async fn delete(&self, owner_id: &str, id: &str) -> FragmentResult<()> {
        let meta_path = self.metadata_path(owner_id, id);
        if !fs::try_exists(&meta_path).await? {
            return Err(FragmentError::NotFound(id.to_string()));
        }

        // Data first: if metadata removal then fails, the fragment is left in
        // the same "metadata without data" state a torn replace produces.
        match fs::remove_file(self.object_path(owner_id, id)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::remove_file(&meta_path)
            .await
            .map_err(|e| not_found_or_io(e, id))
    }
}
