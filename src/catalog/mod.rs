//! Remote release catalog
//!
//! When a release directory carries no SRR record, the catalog is asked for
//! one, first by release name and then by the CRC-32 of the largest file.
//!
//! ## Architecture
//!
//! The pipeline depends on the [`RemoteCatalog`] trait only:
//!
//! - [`SrrDbCatalog`]: srrDB's JSON search API over HTTP
//!
//! A search either finds nothing, finds exactly one release, or fails with
//! [`PipelineError::AmbiguousMatch`](crate::error::PipelineError::AmbiguousMatch).
//! There is no automatic disambiguation: two releases can share a checksum or a
//! partial name, and picking one silently risks rewriting the wrong directory.

mod srrdb;

pub use srrdb::SrrDbCatalog;

use crate::checksum::format_crc;
use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};

/// What to search the catalog for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Exact release name
    Name(String),
    /// CRC-32 of an archived file
    ArchiveCrc(u32),
}

impl SearchQuery {
    /// Path segment appended to the search endpoint
    ///
    /// # Examples
    ///
    /// ```
    /// use srrdb_verify::catalog::SearchQuery;
    ///
    /// assert_eq!(SearchQuery::ArchiveCrc(0xdeadbeef).path_segment(), "archive-crc:DEADBEEF");
    /// assert_eq!(SearchQuery::Name("Movie.2024-GRP".into()).path_segment(), "Movie.2024-GRP");
    /// ```
    pub fn path_segment(&self) -> String {
        match self {
            SearchQuery::Name(name) => urlencoding::encode(name).into_owned(),
            SearchQuery::ArchiveCrc(crc) => format!("archive-crc:{}", format_crc(*crc)),
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchQuery::Name(name) => write!(f, "{name}"),
            SearchQuery::ArchiveCrc(crc) => write!(f, "archive-crc:{}", format_crc(*crc)),
        }
    }
}

/// The single release a search resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogMatch {
    /// Catalogued release name
    pub release: String,
    /// URL the SRR record can be downloaded from
    pub download_url: String,
}

/// Lookup service for SRR records
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Search for `query` on behalf of the release named `release`
    ///
    /// `release` only selects which catalog instance is asked.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when nothing matched, `Ok(Some(_))` for exactly one match.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::AmbiguousMatch`](crate::error::PipelineError::AmbiguousMatch)
    ///   when more than one release matched
    /// - [`PipelineError::NetworkFailure`](crate::error::PipelineError::NetworkFailure)
    ///   on a non-success HTTP status
    async fn search(&self, release: &str, query: &SearchQuery) -> Result<Option<CatalogMatch>>;

    /// Download the SRR record of `candidate` into `dest_dir`
    ///
    /// Returns the path of the written record.
    async fn download(&self, candidate: &CatalogMatch, dest_dir: &Path) -> Result<PathBuf>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
