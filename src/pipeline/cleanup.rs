//! Sample cleanup stage
//!
//! Scene releases ship a short sample clip. Once the release is verified the
//! sample is redundant: its SRS descriptor (stored in the SRR) names the clip,
//! and the clip is deleted from the release root or its `Sample/` directory.

use crate::config::CleanupConfig;
use crate::error::Result;
use crate::srr::{ExtractFilter, MetadataRecord, MetadataStore, StoredFileEntry};
use crate::srs::parse_srs;
use crate::types::ReleaseDirectory;
use crate::utils::{entry_dir_name, entry_file_name, entry_relative_path, has_extension};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Extracts one stored entry by its packaged name
struct SingleEntry<'a>(&'a str);

impl ExtractFilter for SingleEntry<'_> {
    fn should_extract(&self, name: &str) -> bool {
        name == self.0
    }
}

fn is_sample_descriptor(name: &str) -> bool {
    name.to_lowercase().contains("sample") && has_extension(Path::new(name), "srs")
}

/// Delete sample media described by the record's SRS entries
pub(crate) async fn run_sample_stage(
    release: &ReleaseDirectory,
    record: &MetadataRecord,
    store: &dyn MetadataStore,
    config: &CleanupConfig,
) -> Result<()> {
    debug!(path = ?release.path, "running sample cleanup stage");

    if !config.remove_samples {
        debug!("sample removal disabled, skipping");
        return Ok(());
    }

    let descriptors: Vec<&StoredFileEntry> = record
        .stored
        .iter()
        .filter(|s| is_sample_descriptor(&s.name))
        .collect();

    if descriptors.is_empty() {
        debug!("no sample descriptors in record");
        return Ok(());
    }

    for entry in descriptors {
        handle_descriptor_file(release, record, entry, store, config).await?;

        let descriptor = match parse_srs(&entry.data) {
            Ok(d) => d,
            Err(e) => {
                warn!(descriptor = %entry.name, error = %e, "unreadable sample descriptor");
                continue;
            }
        };

        let sample_name = entry_file_name(&descriptor.sample_name);
        if entry_relative_path(sample_name).is_none() {
            warn!(
                descriptor = %entry.name,
                sample = %descriptor.sample_name,
                "unusable sample name"
            );
            continue;
        }

        let candidates = sample_candidates(&release.path, &entry.name, sample_name);
        match candidates.iter().find(|p| p.is_file()) {
            Some(sample) => remove_sample(&release.path, sample).await,
            None => info!(sample = %sample_name, "sample not found, nothing to remove"),
        }
    }

    Ok(())
}

/// The release root first, then the directory the SRS was packaged in
fn sample_candidates(root: &Path, descriptor_name: &str, sample_name: &str) -> Vec<PathBuf> {
    let mut candidates = vec![root.join(sample_name)];
    if let Some(dir) = entry_dir_name(descriptor_name).and_then(entry_relative_path) {
        candidates.push(root.join(dir).join(sample_name));
    }
    candidates
}

async fn remove_sample(root: &Path, sample: &Path) {
    match tokio::fs::remove_file(sample).await {
        Ok(()) => info!(sample = ?sample.file_name(), "removed sample"),
        Err(e) => {
            warn!(sample = ?sample, error = %e, "failed to remove sample");
            return;
        }
    }

    // Drop the sample directory too once it is empty
    if let Some(parent) = sample.parent()
        && parent != root
        && tokio::fs::remove_dir(parent).await.is_ok()
    {
        debug!(dir = ?parent, "removed empty sample directory");
    }
}

/// Keep the descriptor on disk, or make sure no copy of it is left behind
async fn handle_descriptor_file(
    release: &ReleaseDirectory,
    record: &MetadataRecord,
    entry: &StoredFileEntry,
    store: &dyn MetadataStore,
    config: &CleanupConfig,
) -> Result<()> {
    if config.remove_sample_descriptors {
        let flattened = release.path.join(entry_file_name(&entry.name));
        if flattened.is_file() {
            tokio::fs::remove_file(&flattened).await?;
            info!(descriptor = ?flattened.file_name(), "removed sample descriptor");
        }
        return Ok(());
    }

    store
        .extract(record, &release.path, &SingleEntry(&entry.name))
        .await?;
    Ok(())
}
