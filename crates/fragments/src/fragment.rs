//! The fragment entity: a validated, owner-scoped record plus its lifecycle.
//!
//! Metadata and data are persisted separately. [`Fragment::replace_data`]
//! writes metadata first and data second; there is no transaction around the
//! pair. If the data write fails after the metadata write succeeded, the
//! fragment is left degraded: its metadata reports the new size but a data
//! read may fail or return the previous payload. The error is surfaced and a
//! warning is logged; nothing is rolled back.
//!
//! Two concurrent replaces against the same fragment race and the last
//! metadata/data pair to land wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::{FragmentError, FragmentResult};
use crate::gateway::StorageGateway;
use crate::record::{FragmentRecord, ListEntry};
use crate::registry::{self, Representation};

/// An owner-scoped stored payload with a declared MIME type.
///
/// Fields are private: `id`, `owner_id`, `content_type` and `created` never
/// change after construction, and `size`/`updated` only move through the
/// write operations below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "FragmentRecord", try_from = "FragmentRecord")]
pub struct Fragment {
    id: String,
    owner_id: String,
    content_type: String,
    representation: Representation,
    size: u64,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

/// Result of [`Fragment::list_by_owner`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FragmentListing {
    Ids(Vec<String>),
    Expanded(Vec<Fragment>),
}

impl FragmentListing {
    fn empty(expand: bool) -> Self {
        if expand {
            FragmentListing::Expanded(Vec::new())
        } else {
            FragmentListing::Ids(Vec::new())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FragmentListing::Ids(ids) => ids.len(),
            FragmentListing::Expanded(fragments) => fragments.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids in listing order, whichever form the listing took.
    pub fn ids(&self) -> Vec<&str> {
        match self {
            FragmentListing::Ids(ids) => ids.iter().map(String::as_str).collect(),
            FragmentListing::Expanded(fragments) => fragments.iter().map(|f| f.id()).collect(),
        }
    }
}

impl Fragment {
    /// Construct a new, empty fragment with a generated id.
    pub fn new(owner_id: impl Into<String>, content_type: impl Into<String>) -> FragmentResult<Self> {
        Self::from_record(FragmentRecord::new(owner_id, content_type))
    }

    /// Validate a raw record and fill in defaults.
    ///
    /// Fails with `InvalidOwner` for a missing owner, `UnsupportedType` for a
    /// type outside the registry, and `InvalidSize` for a size that is not a
    /// non-negative integer. A missing id is generated; missing timestamps
    /// default to now.
    pub fn from_record(record: FragmentRecord) -> FragmentResult<Self> {
        if record.owner_id.trim().is_empty() {
            return Err(FragmentError::InvalidOwner);
        }

        if !registry::is_supported_type(&record.content_type) {
            return Err(FragmentError::UnsupportedType(record.content_type));
        }
        let representation = Representation::from_mime(&record.content_type)
            .ok_or_else(|| FragmentError::UnsupportedType(record.content_type.clone()))?;

        let size = match &record.size {
            None => 0,
            Some(value) => parse_size(value)?,
        };

        let id = match record.id {
            Some(id) if !id.is_empty() => id,
            _ => Uuid::new_v4().to_string(),
        };

        let now = Utc::now();
        Ok(Self {
            id,
            owner_id: record.owner_id,
            content_type: record.content_type,
            representation,
            size,
            created: record.created.unwrap_or(now),
            updated: record.updated.unwrap_or(now),
        })
    }

    /// The persisted shape of this fragment.
    pub fn to_record(&self) -> FragmentRecord {
        FragmentRecord {
            id: Some(self.id.clone()),
            owner_id: self.owner_id.clone(),
            content_type: self.content_type.clone(),
            size: Some(Value::from(self.size)),
            created: Some(self.created),
            updated: Some(self.updated),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// The type exactly as declared at creation, parameters included.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The type without parameters: `"text/plain; charset=utf-8"` -> `"text/plain"`.
    pub fn mime_type(&self) -> &'static str {
        self.representation.mime()
    }

    pub fn representation(&self) -> Representation {
        self.representation
    }

    pub fn is_text(&self) -> bool {
        self.mime_type().starts_with("text/")
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn updated(&self) -> DateTime<Utc> {
        self.updated
    }

    /// MIME types this fragment may be rendered as.
    pub fn formats(&self) -> Vec<&'static str> {
        self.representation.targets().iter().map(|r| r.mime()).collect()
    }

    /// Where an HTTP adapter serves this fragment.
    pub fn location(&self, api_url: &str) -> String {
        format!("{}/v1/fragments/{}", api_url.trim_end_matches('/'), self.id)
    }

    /// Construct a fragment and store `data` as its first payload.
    #[instrument(skip(gateway, data), fields(size = data.len()))]
    pub async fn create<G>(
        gateway: &G,
        owner_id: &str,
        content_type: &str,
        data: &[u8],
    ) -> FragmentResult<Self>
    where
        G: StorageGateway + ?Sized,
    {
        let mut fragment = Self::new(owner_id, content_type)?;
        fragment.replace_data(gateway, data).await?;
        info!(id = %fragment.id, "fragment created");
        Ok(fragment)
    }

    /// List an owner's fragments.
    ///
    /// Any storage or validation failure yields an empty listing instead of an
    /// error, so one broken record cannot fail the call. This lenience hides
    /// real faults and should be revisited before production hardening.
    #[instrument(skip(gateway))]
    pub async fn list_by_owner<G>(gateway: &G, owner_id: &str, expand: bool) -> FragmentListing
    where
        G: StorageGateway + ?Sized,
    {
        match Self::try_list(gateway, owner_id, expand).await {
            Ok(listing) => {
                debug!(count = listing.len(), "listed fragments");
                listing
            }
            Err(err) => {
                warn!(%err, "listing failed, returning an empty listing");
                FragmentListing::empty(expand)
            }
        }
    }

    async fn try_list<G>(gateway: &G, owner_id: &str, expand: bool) -> FragmentResult<FragmentListing>
    where
        G: StorageGateway + ?Sized,
    {
        let entries = gateway.list_metadata(owner_id, expand).await?;

        if expand {
            let fragments = entries
                .into_iter()
                .map(|entry| match entry {
                    ListEntry::Record(record) => Self::from_record(record),
                    ListEntry::Id(id) => Err(FragmentError::Io(format!(
                        "gateway returned a bare id for an expanded listing: {}",
                        id
                    ))),
                })
                .collect::<FragmentResult<Vec<_>>>()?;
            Ok(FragmentListing::Expanded(fragments))
        } else {
            let ids = entries
                .into_iter()
                .map(|entry| match entry {
                    ListEntry::Id(id) => Ok(id),
                    ListEntry::Record(record) => record
                        .id
                        .ok_or_else(|| FragmentError::Io("listed record has no id".to_string())),
                })
                .collect::<FragmentResult<Vec<_>>>()?;
            Ok(FragmentListing::Ids(ids))
        }
    }

    /// Load a fragment's metadata.
    ///
    /// Fails with `NotFound` unless `owner_id` created it; a fragment owned by
    /// someone else is indistinguishable from one that does not exist.
    #[instrument(skip(gateway))]
    pub async fn load_by_owner<G>(gateway: &G, owner_id: &str, id: &str) -> FragmentResult<Self>
    where
        G: StorageGateway + ?Sized,
    {
        let record = gateway.read_metadata(owner_id, id).await?;
        if record.owner_id != owner_id {
            return Err(FragmentError::NotFound(id.to_string()));
        }

        Self::from_record(record).map_err(|err| match err {
            FragmentError::Io(_) => err,
            other => FragmentError::Io(format!("stored metadata for {} is invalid: {}", id, other)),
        })
    }

    /// Remove a fragment's metadata and data together.
    #[instrument(skip(gateway))]
    pub async fn delete_by_owner<G>(gateway: &G, owner_id: &str, id: &str) -> FragmentResult<()>
    where
        G: StorageGateway + ?Sized,
    {
        gateway.delete(owner_id, id).await?;
        info!("fragment deleted");
        Ok(())
    }

    /// Refresh `updated` and write metadata.
    #[instrument(skip(self, gateway), fields(id = %self.id))]
    pub async fn persist_metadata<G>(&mut self, gateway: &G) -> FragmentResult<()>
    where
        G: StorageGateway + ?Sized,
    {
        let mut record = self.to_record();
        let updated = Utc::now();
        record.updated = Some(updated);

        gateway.write_metadata(&self.owner_id, &self.id, &record).await?;
        self.updated = updated;
        Ok(())
    }

    /// The bytes most recently stored for this fragment.
    #[instrument(skip(self, gateway), fields(id = %self.id))]
    pub async fn read_data<G>(&self, gateway: &G) -> FragmentResult<Vec<u8>>
    where
        G: StorageGateway + ?Sized,
    {
        gateway.read_data(&self.owner_id, &self.id).await
    }

    /// Replace the payload.
    ///
    /// Rejects an empty payload with `EmptyData`. Otherwise recomputes `size`,
    /// refreshes `updated`, writes metadata, then writes data. If the metadata
    /// write fails nothing has changed; if the data write fails the fragment is
    /// degraded as described in the module docs.
    #[instrument(skip(self, gateway, data), fields(id = %self.id, size = data.len()))]
    pub async fn replace_data<G>(&mut self, gateway: &G, data: &[u8]) -> FragmentResult<()>
    where
        G: StorageGateway + ?Sized,
    {
        if data.is_empty() {
            return Err(FragmentError::EmptyData);
        }

        let size = data.len() as u64;
        let updated = Utc::now();
        let mut record = self.to_record();
        record.size = Some(Value::from(size));
        record.updated = Some(updated);

        gateway.write_metadata(&self.owner_id, &self.id, &record).await?;
        self.size = size;
        self.updated = updated;

        if let Err(err) = gateway.write_data(&self.owner_id, &self.id, data).await {
            warn!(
                %err,
                owner = %self.owner_id,
                size,
                "metadata written but data write failed; fragment is degraded"
            );
            return Err(err);
        }

        debug!(content_type = %self.content_type, "fragment data replaced");
        Ok(())
    }

    /// Replace the payload of a write that declared `declared_type`.
    ///
    /// A fragment's type never changes, so a mismatched declaration is
    /// rejected with `TypeMismatch` before anything is written.
    pub async fn replace_data_as<G>(
        &mut self,
        gateway: &G,
        declared_type: &str,
        data: &[u8],
    ) -> FragmentResult<()>
    where
        G: StorageGateway + ?Sized,
    {
        if declared_type != self.content_type {
            return Err(FragmentError::TypeMismatch {
                expected: self.content_type.clone(),
                declared: declared_type.to_string(),
            });
        }
        self.replace_data(gateway, data).await
    }
}

impl From<Fragment> for FragmentRecord {
    fn from(fragment: Fragment) -> Self {
        fragment.to_record()
    }
}

impl TryFrom<FragmentRecord> for Fragment {
    type Error = FragmentError;

    fn try_from(record: FragmentRecord) -> Result<Self, Self::Error> {
        Fragment::from_record(record)
    }
}

fn parse_size(value: &Value) -> FragmentResult<u64> {
    value
        .as_u64()
        .ok_or_else(|| FragmentError::InvalidSize(value.to_string()))
}

/// Split a requested resource into fragment id and extension.
///
/// `"abc.html"` -> `("abc", Some("html"))`, `"abc"` -> `("abc", None)`. Only
/// the last dot counts, and a leading or trailing dot is not an extension.
pub fn split_resource(resource: &str) -> (&str, Option<&str>) {
    match resource.rsplit_once('.') {
        Some((id, ext)) if !id.is_empty() && !ext.is_empty() => (id, Some(ext)),
        _ => (resource, None),
    }
}
