//! SRR metadata records
//!
//! An SRR record describes a scene release's original RAR layout (archived
//! file names and CRCs, without the packed data) and carries small auxiliary
//! files (NFO, SFV, SRS, cover images) verbatim.
//!
//! ## Architecture
//!
//! The pipeline depends on the [`MetadataStore`] trait only. [`SrrStore`] is
//! the pure-Rust implementation reading the SRR block format.
//!
//! ## Usage
//!
//! ```no_run
//! use srrdb_verify::srr::{MetadataStore, SrrStore};
//! use std::path::Path;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SrrStore::default();
//! let record = store.parse(Path::new("Movie-GRP.srr")).await?;
//! for entry in &record.archived {
//!     println!("{} {:?}", entry.name, entry.crc32);
//! }
//! # Ok(())
//! # }
//! ```

mod parser;
mod store;

pub use parser::parse_srr_bytes;
pub use store::SrrStore;

#[cfg(test)]
pub(crate) use parser::test_support;

use crate::checksum::ChecksumService;
use crate::types::FileCheck;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A file stored inside the archives the SRR describes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedFileEntry {
    /// File name as recorded in the RAR file header
    pub name: String,
    /// CRC-32 of the complete file, if recorded
    pub crc32: Option<u32>,
    /// Unpacked size in bytes
    pub size: u64,
}

/// An auxiliary file packaged verbatim inside the SRR
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFileEntry {
    /// Packaged name, possibly with a directory (`Sample/x.srs`)
    pub name: String,
    /// File contents
    pub data: Vec<u8>,
}

/// Parsed contents of an SRR file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    /// Path the record was read from
    pub path: PathBuf,
    /// Application that created the record
    pub app_name: Option<String>,
    /// RAR volumes described by the record, in order
    pub volumes: Vec<String>,
    /// Archived files in first-seen order
    pub archived: Vec<ArchivedFileEntry>,
    /// Stored auxiliary files in record order
    pub stored: Vec<StoredFileEntry>,
}

impl MetadataRecord {
    /// Recorded name of the primary media file
    ///
    /// When several archived files exist the last one wins.
    pub fn primary_name(&self) -> Option<&str> {
        self.archived.last().map(|e| e.name.as_str())
    }
}

/// Decides which stored entries get extracted
pub trait ExtractFilter: Send + Sync {
    /// True if the stored entry with this packaged name should be extracted
    fn should_extract(&self, name: &str) -> bool;
}

/// Outcome of extracting one stored entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    /// File written
    Extracted,
    /// Target already held identical bytes, nothing written
    Unchanged,
    /// Extraction failed (reason attached); never fatal on its own
    Failed(String),
}

/// Per-entry extraction report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntry {
    /// Packaged name inside the record
    pub name: String,
    /// Target path in the release directory
    pub path: PathBuf,
    /// What happened
    pub outcome: ExtractOutcome,
}

/// Reads SRR records and acts on their contents
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Parse an SRR file into a structured record
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid SRR.
    async fn parse(&self, record: &Path) -> crate::Result<MetadataRecord>;

    /// Extract the stored entries accepted by `filter` flat into `dest`
    ///
    /// Per-entry failures are reported in the result, not raised.
    async fn extract(
        &self,
        record: &MetadataRecord,
        dest: &Path,
        filter: &dyn ExtractFilter,
    ) -> crate::Result<Vec<ExtractedEntry>>;

    /// Compare every archived entry carrying a CRC against the file in `dir`
    ///
    /// Entries without a recorded CRC are not included in the result.
    async fn verify_archived(
        &self,
        record: &MetadataRecord,
        dir: &Path,
        checksums: &dyn ChecksumService,
    ) -> crate::Result<Vec<FileCheck>>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
