//! Verification pipeline for a completed download
//!
//! One run handles one release directory:
//! 1. Validate - skip P2P names and season packs before touching anything
//! 2. Locate - find the SRR record, or fetch it from the catalog
//! 3. Reconstruct - extract auxiliary files and restore the primary file name
//! 4. Verify - compare CRCs from the record (or the SFV for music)
//! 5. Clean samples - delete sample media described by stored SRS files
//! 6. Finalize - remove the record, archive the NZB, relocate albums
//!
//! Every stage is awaited in sequence and the first error ends the run.

use crate::catalog::{RemoteCatalog, SrrDbCatalog};
use crate::checksum::{ChecksumService, Crc32Checksum};
use crate::config::{Config, JobContext};
use crate::deobfuscation::find_largest_file;
use crate::error::Result;
use crate::srr::{MetadataStore, SrrStore};
use crate::types::{PipelineReport, PipelineStatus, SkipReason};
use crate::utils::{has_extension, root_files};
use std::sync::Arc;
use tracing::{debug, info};

mod cleanup;
mod finalize;
mod locate;
mod reconstruct;
mod verify;

use cleanup::run_sample_stage;
use finalize::run_finalize_stage;
use locate::run_locate_stage;
use reconstruct::run_reconstruct_stage;
use verify::run_verify_stage;

/// Pipeline executor
///
/// Collaborators are injected as trait objects so tests can replace the
/// catalog and checksum service.
pub struct Pipeline {
    /// Policy switches
    config: Arc<Config>,
    /// SRR reader
    store: Arc<dyn MetadataStore>,
    /// Remote lookup for releases without a local record
    catalog: Arc<dyn RemoteCatalog>,
    /// CRC-32 computation
    checksums: Arc<dyn ChecksumService>,
}

impl Pipeline {
    /// Create a pipeline from explicit collaborators
    pub fn new(
        config: Arc<Config>,
        store: Arc<dyn MetadataStore>,
        catalog: Arc<dyn RemoteCatalog>,
        checksums: Arc<dyn ChecksumService>,
    ) -> Self {
        Self {
            config,
            store,
            catalog,
            checksums,
        }
    }

    /// Create a pipeline with the SRR reader, srrDB client and CRC-32 service
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn with_defaults(config: Config) -> Result<Self> {
        let catalog = SrrDbCatalog::new(config.catalog.clone())?;
        Ok(Self::new(
            Arc::new(config),
            Arc::new(SrrStore),
            Arc::new(catalog),
            Arc::new(Crc32Checksum),
        ))
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every stage for one release directory
    ///
    /// # Returns
    ///
    /// A report that is either [`PipelineStatus::Skipped`] (nothing touched)
    /// or [`PipelineStatus::Verified`].
    ///
    /// # Errors
    ///
    /// Any [`PipelineError`](crate::error::PipelineError) ends the run, as do
    /// I/O failures and malformed records.
    pub async fn run(&self, job: &JobContext) -> Result<PipelineReport> {
        let release = &job.release;
        info!(
            release = %release.basename,
            path = ?release.path,
            host_run = job.is_host_run(),
            "starting verification pipeline"
        );

        if let Some(reason) = release.validate() {
            info!(release = %release.basename, %reason, "skipping release");
            return Ok(skipped(&release.basename, reason));
        }

        let files = root_files(&release.path)?;
        if files.is_empty() {
            info!(release = %release.basename, "skipping release: directory is empty");
            return Ok(skipped(&release.basename, SkipReason::NoContent));
        }

        // The record itself is never the primary media file
        let candidates: Vec<_> = files.into_iter().filter(|p| !has_extension(p, "srr")).collect();
        let primary = find_largest_file(&candidates);
        debug!(primary = ?primary, "primary file");

        let record_path = run_locate_stage(
            release,
            primary.as_deref(),
            self.catalog.as_ref(),
            self.checksums.as_ref(),
        )
        .await?;

        let record = self.store.parse(&record_path).await?;
        debug!(store = self.store.name(), record = ?record_path, "record loaded");

        run_reconstruct_stage(
            release,
            &record,
            primary.as_deref(),
            self.store.as_ref(),
            &self.config.extraction,
        )
        .await?;

        let outcome = run_verify_stage(
            release,
            &record,
            self.store.as_ref(),
            self.checksums.as_ref(),
        )
        .await?;

        if outcome.is_audio_album() {
            debug!("audio album, sample cleanup not applicable");
        } else {
            run_sample_stage(release, &record, self.store.as_ref(), &self.config.cleanup).await?;
        }

        let relocated_to = run_finalize_stage(job, &record_path, &outcome, &self.config).await?;

        info!(release = %release.basename, "pipeline complete");

        Ok(PipelineReport {
            release: release.basename.clone(),
            status: PipelineStatus::Verified {
                outcome,
                relocated_to,
            },
        })
    }
}

fn skipped(release: &str, reason: SkipReason) -> PipelineReport {
    PipelineReport {
        release: release.to_string(),
        status: PipelineStatus::Skipped(reason),
    }
}
