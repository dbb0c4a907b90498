//! Owner-scoped fragment storage with format conversion on read.
//!
//! A fragment is an opaque payload tagged with a MIME type. It is stored
//! through a [`StorageGateway`] as two records keyed by `(owner_id, id)`:
//! metadata and data. On read it can be rendered as any representation its
//! type allows (markdown as HTML, JSON as plain text, any raster image as any
//! other supported codec).
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use fragments::{convert, Fragment, MemoryGateway};
//!
//! # async fn demo() -> fragments::FragmentResult<()> {
//! let gateway = MemoryGateway::new();
//!
//! // Store content
//! let fragment = Fragment::create(&gateway, "owner-1", "text/markdown", b"# Title").await?;
//!
//! // Read it back as HTML
//! let html = convert::render(&gateway, &fragment, Some("html")).await?;
//! assert_eq!(html.data, b"<h1>Title</h1>\n");
//! assert_eq!(html.content_type, "text/html");
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `FRAGMENTS_BACKEND`: `file` (default) or `memory`
//! - `FRAGMENTS_PATH`: Base path for the file backend (default: `~/.fragments/store`)
//! - `API_URL`: Public base URL for fragment locations
//!
//! # Consistency
//!
//! There are no transactions. Replacing data writes metadata then data, and
//! concurrent replaces of one fragment race (last writer wins). See
//! [`fragment`] for the degraded state a failed data write leaves behind.

pub mod config;
pub mod convert;
pub mod error;
pub mod fragment;
pub mod gateway;
pub mod record;
pub mod registry;
pub mod telemetry;

// Re-exports for convenience
pub use config::{Backend, FragmentsConfig};
pub use convert::{render, Rendered, Target};
pub use error::{FragmentError, FragmentResult};
pub use fragment::{split_resource, Fragment, FragmentListing};
pub use gateway::{FileGateway, MemoryGateway, StorageGateway};
pub use record::{FragmentRecord, ListEntry};
pub use registry::{convertible_formats, is_supported_type, ImageCodec, Representation};
