//! Reconstruction stage: auxiliary file extraction and deobfuscation

use crate::deobfuscation::{RenamePlan, canonical_name, plan_rename};
use crate::error::Result;
use crate::srr::{ExtractFilter, ExtractOutcome, MetadataRecord, MetadataStore};
use crate::types::ReleaseDirectory;
use std::path::Path;
use tracing::{debug, info, warn};

/// Extract the allow-listed stored files, then restore the primary file name
pub(crate) async fn run_reconstruct_stage(
    release: &ReleaseDirectory,
    record: &MetadataRecord,
    primary: Option<&Path>,
    store: &dyn MetadataStore,
    filter: &dyn ExtractFilter,
) -> Result<()> {
    debug!(path = ?release.path, "running reconstruct stage");

    let extracted = store.extract(record, &release.path, filter).await?;
    if extracted.is_empty() {
        info!("no matching files to extract");
    }
    for entry in &extracted {
        match &entry.outcome {
            ExtractOutcome::Extracted => info!(file = %entry.name, "extracted"),
            ExtractOutcome::Unchanged => debug!(file = %entry.name, "already present"),
            // logged by the store
            ExtractOutcome::Failed(_) => {}
        }
    }

    let Some(primary) = primary else {
        return Ok(());
    };
    deobfuscate(record, primary).await
}

async fn deobfuscate(record: &MetadataRecord, primary: &Path) -> Result<()> {
    let Some(recorded) = canonical_name(record) else {
        debug!("record lists no archived files, keeping primary file name");
        return Ok(());
    };

    match plan_rename(primary, recorded) {
        RenamePlan::AlreadyCanonical => {
            debug!(file = %recorded, "primary file already carries its recorded name");
        }
        RenamePlan::ExtensionMismatch { recorded } => {
            info!(
                file = ?primary.file_name(),
                %recorded,
                "extension differs from recorded name, not renaming"
            );
        }
        RenamePlan::TargetOccupied(target) => {
            warn!(
                file = ?primary.file_name(),
                target = ?target,
                "recorded name already taken by another file, not renaming"
            );
        }
        RenamePlan::Rename { from, to } => {
            tokio::fs::rename(&from, &to).await?;
            info!(from = ?from.file_name(), to = ?to.file_name(), "deobfuscated primary file");
        }
    }
    Ok(())
}
