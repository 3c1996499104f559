//! Release locator stage

use crate::catalog::{RemoteCatalog, SearchQuery};
use crate::checksum::{ChecksumService, format_crc};
use crate::error::{PipelineError, Result};
use crate::types::ReleaseDirectory;
use crate::utils::files_with_extension;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Records nested for subtitle packs, never the release's own record
const SUBTITLE_MARKER: &str = "subs";

/// Find the release's SRR record, fetching it from the catalog if needed
///
/// A local record under a non-canonical name is renamed to `<basename>.srr`.
pub(crate) async fn run_locate_stage(
    release: &ReleaseDirectory,
    primary: Option<&Path>,
    catalog: &dyn RemoteCatalog,
    checksums: &dyn ChecksumService,
) -> Result<PathBuf> {
    debug!(path = ?release.path, "running locate stage");

    if let Some(record) = find_local_record(release).await? {
        return Ok(record);
    }

    info!(release = %release.basename, "no SRR found locally, asking {}", catalog.name());
    acquire_remote(release, primary, catalog, checksums).await?;

    find_local_record(release)
        .await?
        .ok_or_else(|| unknown(release))
}

fn unknown(release: &ReleaseDirectory) -> crate::Error {
    PipelineError::UnknownRelease {
        release: release.basename.clone(),
    }
    .into()
}

/// SRR files in the directory root, subtitle records excluded, sorted by name
fn local_records(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut records: Vec<PathBuf> = files_with_extension(dir, "srr")?
        .into_iter()
        .filter(|p| {
            p.file_name()
                .map(|n| !n.to_string_lossy().to_lowercase().contains(SUBTITLE_MARKER))
                .unwrap_or(false)
        })
        .collect();
    records.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(records)
}

async fn find_local_record(release: &ReleaseDirectory) -> Result<Option<PathBuf>> {
    let records = local_records(&release.path)?;
    let canonical_name = format!("{}.srr", release.basename).to_lowercase();

    // A record already carrying the canonical name always wins
    if let Some(existing) = records.iter().find(|p| {
        p.file_name()
            .is_some_and(|n| n.to_string_lossy().to_lowercase() == canonical_name)
    }) {
        debug!(record = ?existing, "found canonical SRR");
        return Ok(Some(existing.clone()));
    }

    let Some(first) = records.first() else {
        return Ok(None);
    };
    if records.len() > 1 {
        info!(
            chosen = ?first.file_name(),
            ignored = records.len() - 1,
            "several SRR files found, using the first by name"
        );
    }

    let canonical = release.canonical_record_path();
    tokio::fs::rename(first, &canonical).await?;
    info!(from = ?first.file_name(), to = ?canonical.file_name(), "renamed SRR to canonical name");

    Ok(Some(canonical))
}

/// Two-phase lookup: by release name, then by the CRC of the primary file
async fn acquire_remote(
    release: &ReleaseDirectory,
    primary: Option<&Path>,
    catalog: &dyn RemoteCatalog,
    checksums: &dyn ChecksumService,
) -> Result<()> {
    let by_name = SearchQuery::Name(release.basename.clone());
    let mut candidate = catalog.search(&release.basename, &by_name).await?;

    if candidate.is_none() {
        let Some(primary) = primary else {
            return Err(unknown(release));
        };
        let crc = checksums.crc32(primary)?;
        info!(file = ?primary.file_name(), crc = %format_crc(crc), "searching by archive CRC");
        candidate = catalog
            .search(&release.basename, &SearchQuery::ArchiveCrc(crc))
            .await?;
    }

    let Some(candidate) = candidate else {
        return Err(unknown(release));
    };

    let written = catalog.download(&candidate, &release.path).await?;
    info!(release = %candidate.release, path = ?written, "downloaded SRR");
    Ok(())
}
