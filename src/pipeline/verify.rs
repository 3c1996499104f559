//! Checksum verification stage
//!
//! The record decides the strategy: archived entries present means their
//! CRCs are checked, otherwise the release is treated as a music album and
//! checked against its SFV.

use crate::checksum::ChecksumService;
use crate::error::{PipelineError, Result};
use crate::sfv::{find_sfv_files, read_sfv};
use crate::srr::{MetadataRecord, MetadataStore};
use crate::types::{
    ContentKind, FileCheck, ReleaseDirectory, VerificationOutcome, VerificationStrategy,
};
use crate::utils::{DEFAULT_NAME_TRANSFORMS, resolve_listed_file};
use std::path::Path;
use tracing::{debug, info, warn};

/// Verify the release and return the outcome if every file matched
pub(crate) async fn run_verify_stage(
    release: &ReleaseDirectory,
    record: &MetadataRecord,
    store: &dyn MetadataStore,
    checksums: &dyn ChecksumService,
) -> Result<VerificationOutcome> {
    debug!(path = ?release.path, "running verify stage");

    let outcome = if record.archived.is_empty() {
        verify_checksum_list(&release.path, checksums)?
    } else {
        verify_record(record, &release.path, store, checksums).await?
    };

    for check in &outcome.checks {
        info!("{} {}", check.name, check.status);
    }

    if outcome.passed() {
        info!(
            strategy = ?outcome.strategy,
            files = outcome.checks.len(),
            "Everything OK"
        );
        Ok(outcome)
    } else {
        warn!(
            failures = outcome.failures(),
            files = outcome.checks.len(),
            "verification failed"
        );
        Err(PipelineError::VerificationFailed { outcome }.into())
    }
}

async fn verify_record(
    record: &MetadataRecord,
    dir: &Path,
    store: &dyn MetadataStore,
    checksums: &dyn ChecksumService,
) -> Result<VerificationOutcome> {
    let checks = store.verify_archived(record, dir, checksums).await?;
    if checks.is_empty() {
        return Err(unavailable("no archived file in the record carries a CRC"));
    }

    Ok(VerificationOutcome {
        strategy: VerificationStrategy::Record,
        content: ContentKind::Generic,
        checks,
    })
}

fn verify_checksum_list(
    dir: &Path,
    checksums: &dyn ChecksumService,
) -> Result<VerificationOutcome> {
    let lists = find_sfv_files(dir)?;
    let Some(list) = lists.first() else {
        return Err(unavailable("record has no archived files and no .sfv exists"));
    };
    if lists.len() > 1 {
        info!(
            chosen = ?list.file_name(),
            ignored = lists.len() - 1,
            "several SFV files found, using the first by name"
        );
    }

    let entries = read_sfv(list)?;
    if entries.is_empty() {
        return Err(unavailable("checksum list has no entries"));
    }

    let mut checks = Vec::with_capacity(entries.len());
    for entry in entries {
        let path = resolve_listed_file(dir, &entry.name, DEFAULT_NAME_TRANSFORMS);
        let actual = match &path {
            Some(p) => Some(checksums.crc32(p)?),
            None => None,
        };
        checks.push(FileCheck::new(entry.name, path, entry.crc32, actual));
    }

    Ok(VerificationOutcome {
        strategy: VerificationStrategy::ChecksumList,
        content: ContentKind::AudioAlbum,
        checks,
    })
}

fn unavailable(reason: &str) -> crate::Error {
    PipelineError::VerificationUnavailable {
        reason: reason.to_string(),
    }
    .into()
}
