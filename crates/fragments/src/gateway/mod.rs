//! Storage gateway: owner-scoped persistence for fragment metadata and data.
//!
//! Metadata and data live in two parallel maps keyed by `(owner_id, id)`.
//! Implementations carry no business logic and must keep different keys
//! isolated from each other; the core relies on nothing else.

use async_trait::async_trait;

use crate::error::FragmentResult;
use crate::record::{FragmentRecord, ListEntry};

pub mod file;
pub mod key;
pub mod memory;

pub use file::FileGateway;
pub use key::{IdKey, OwnerKey};
pub use memory::MemoryGateway;

/// Owner-scoped get/put/list/delete contract consumed by the fragment core.
///
/// Lookups for an `(owner_id, id)` pair that was never written, or that was
/// written under a different owner, fail with `NotFound`.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Read the metadata record for a fragment.
    async fn read_metadata(&self, owner_id: &str, id: &str) -> FragmentResult<FragmentRecord>;

    /// Insert or replace the metadata record for a fragment.
    async fn write_metadata(
        &self,
        owner_id: &str,
        id: &str,
        record: &FragmentRecord,
    ) -> FragmentResult<()>;

    /// Read the raw payload for a fragment.
    async fn read_data(&self, owner_id: &str, id: &str) -> FragmentResult<Vec<u8>>;

    /// Insert or replace the raw payload for a fragment.
    async fn write_data(&self, owner_id: &str, id: &str, data: &[u8]) -> FragmentResult<()>;

    /// List an owner's fragments, as ids or as full records when `expand` is set.
    async fn list_metadata(&self, owner_id: &str, expand: bool) -> FragmentResult<Vec<ListEntry>>;

    /// Remove both metadata and data. Fails with `NotFound` when there is no
    /// metadata for the pair.
    async fn delete(&self, owner_id: &str, id: &str) -> FragmentResult<()>;
}
