//! Finalization stage: record removal, NZB archival, album relocation

use crate::config::{Config, FinalizeConfig, JobContext};
use crate::error::{PipelineError, Result};
use crate::types::{ReleaseDirectory, VerificationOutcome};
use crate::utils::files_with_extension;
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Run the post-verification housekeeping
///
/// Returns the new release location if the directory was relocated.
pub(crate) async fn run_finalize_stage(
    job: &JobContext,
    record_path: &Path,
    outcome: &VerificationOutcome,
    config: &Config,
) -> Result<Option<PathBuf>> {
    let release = &job.release;
    debug!(path = ?release.path, "running finalize stage");

    if config.cleanup.remove_valid_record && record_path.is_file() {
        tokio::fs::remove_file(record_path).await?;
        info!(record = ?record_path.file_name(), "removed verified SRR");
    }

    archive_job_descriptor(job, &config.finalize).await?;

    if !outcome.is_audio_album() {
        return Ok(None);
    }
    if !config.finalize.relocate_albums || !job.is_host_run() {
        debug!("album relocation disabled for this run");
        return Ok(None);
    }

    relocate_album(release, &config.finalize.placeholder_artists).await
}

/// Decompress the host's original NZB into `<basename>.nzb`
async fn archive_job_descriptor(job: &JobContext, config: &FinalizeConfig) -> Result<()> {
    if !config.archive_job_descriptor || !job.is_host_run() {
        return Ok(());
    }
    let Some(source) = &job.original_job_descriptor else {
        debug!("host supplied no original NZB");
        return Ok(());
    };

    let release = &job.release;
    if !files_with_extension(&release.path, "nzb")?.is_empty() {
        debug!("NZB already present, not archiving");
        return Ok(());
    }

    let compressed = tokio::fs::read(source).await?;
    let mut nzb = Vec::new();
    GzDecoder::new(compressed.as_slice()).read_to_end(&mut nzb)?;

    let target = release.path.join(format!("{}.nzb", release.basename));
    tokio::fs::write(&target, &nzb).await?;
    info!(nzb = ?target.file_name(), "archived original NZB");
    Ok(())
}

/// Artist directory name derived from an album release name
///
/// The artist is everything before the first `-`, with underscores turned
/// into spaces. Returns `None` for placeholder artists such as `VA`.
fn album_artist(basename: &str, placeholders: &[String]) -> Option<String> {
    let leading = basename.split('-').next().unwrap_or_default();
    let artist = leading.replace('_', " ").trim().to_string();
    if artist.is_empty() {
        return None;
    }
    let lowered = artist.to_lowercase();
    if placeholders.iter().any(|p| p.to_lowercase() == lowered) {
        return None;
    }
    Some(artist)
}

async fn relocate_album(
    release: &ReleaseDirectory,
    placeholders: &[String],
) -> Result<Option<PathBuf>> {
    let Some(artist) = album_artist(&release.basename, placeholders) else {
        info!(release = %release.basename, "no artist directory for this album");
        return Ok(None);
    };
    let Some(parent) = release.path.parent() else {
        return Ok(None);
    };

    // Already filed under its artist by an earlier run
    if parent
        .file_name()
        .is_some_and(|n| n.to_string_lossy().to_lowercase() == artist.to_lowercase())
    {
        debug!(%artist, "album already under its artist directory");
        return Ok(None);
    }

    let artist_dir = parent.join(&artist);
    let destination = artist_dir.join(&release.basename);
    if tokio::fs::try_exists(&destination).await? {
        return Err(PipelineError::DestinationConflict { path: destination }.into());
    }

    tokio::fs::create_dir_all(&artist_dir).await?;
    tokio::fs::rename(&release.path, &destination).await?;
    info!(%artist, to = ?destination, "relocated album");

    Ok(Some(destination))
}
