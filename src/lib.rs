//! # srrdb-verify
//!
//! Post-download verification and reconstruction of scene releases.
//!
//! ## Design Philosophy
//!
//! srrdb-verify is designed to be:
//! - **One pass, one directory** - Runs once per completed download and exits with a status code
//! - **Never guess** - Ambiguous catalog matches and missing checksum sources stop the run
//! - **Idempotent** - Re-running on a verified release changes nothing
//! - **Host friendly** - Reads SABnzbd's post-processing environment directly
//!
//! ## Pipeline
//!
//! 1. Find the release's SRR record, or fetch it from srrDB by name or CRC
//! 2. Extract NFO, SFV, playlist and cover files from the record
//! 3. Rename an obfuscated main file back to its recorded name
//! 4. Verify CRCs against the record (or the SFV for music releases)
//! 5. Delete the sample, archive the NZB, optionally file albums under their artist
//!
//! ## Quick Start
//!
//! ```no_run
//! use srrdb_verify::{Config, JobContext, Pipeline, PipelineStatus};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = Pipeline::with_defaults(Config::default())?;
//!     let job = JobContext::standalone("/downloads/Movie.2024.1080p.BluRay.x264-GRP");
//!
//!     let report = pipeline.run(&job).await?;
//!     if let PipelineStatus::Verified { outcome, .. } = report.status {
//!         println!("{} files verified", outcome.checks.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Remote release catalog (srrDB)
pub mod catalog;
/// CRC-32 checksum service
pub mod checksum;
/// Configuration types
pub mod config;
/// Primary file deobfuscation
pub mod deobfuscation;
/// Error types
pub mod error;
/// Verification pipeline
pub mod pipeline;
/// SFV checksum lists
pub mod sfv;
/// SRR metadata records
pub mod srr;
/// SRS sample descriptors
pub mod srs;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use catalog::{CatalogMatch, RemoteCatalog, SearchQuery, SrrDbCatalog};
pub use checksum::{ChecksumService, Crc32Checksum};
pub use config::{Config, JobContext};
pub use error::{Error, PipelineError, Result, RunReport, ToExitCode};
pub use pipeline::Pipeline;
pub use srr::{MetadataRecord, MetadataStore, SrrStore};
pub use types::{
    CheckStatus, ContentKind, FileCheck, PipelineReport, PipelineStatus, ReleaseDirectory,
    SkipReason, VerificationOutcome,
};
