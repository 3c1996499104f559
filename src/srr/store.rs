//! File-system backed [`MetadataStore`] reading SRR files directly

use super::parser::parse_srr_file;
use super::{ExtractFilter, ExtractOutcome, ExtractedEntry, MetadataRecord, MetadataStore};
use crate::checksum::{ChecksumService, format_crc};
use crate::types::FileCheck;
use crate::utils::{entry_file_name, entry_relative_path};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Pure Rust SRR store
///
/// Extraction always flattens packaged directories: `Sample/x.srs` is written
/// as `<dest>/x.srs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SrrStore;

impl SrrStore {
    async fn extract_one(name: &str, data: &[u8], dest: &Path) -> ExtractedEntry {
        let file_name = entry_file_name(name);
        let target = dest.join(file_name);

        if entry_relative_path(file_name).is_none() {
            return ExtractedEntry {
                name: name.to_string(),
                path: target,
                outcome: ExtractOutcome::Failed("unsafe entry name".to_string()),
            };
        }

        // Re-running on an already reconstructed release must not touch the disk
        if let Ok(existing) = tokio::fs::read(&target).await
            && existing == data
        {
            return ExtractedEntry {
                name: name.to_string(),
                path: target,
                outcome: ExtractOutcome::Unchanged,
            };
        }

        let outcome = match tokio::fs::write(&target, data).await {
            Ok(()) => ExtractOutcome::Extracted,
            Err(e) => ExtractOutcome::Failed(e.to_string()),
        };

        ExtractedEntry {
            name: name.to_string(),
            path: target,
            outcome,
        }
    }
}

/// Where an archived entry may live: its recorded relative path, then the
/// release root, where deobfuscation places a renamed primary file
fn archived_candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    let Some(relative) = entry_relative_path(name) else {
        return Vec::new();
    };
    let mut candidates = vec![dir.join(&relative)];
    if relative.parent().is_some_and(|p| !p.as_os_str().is_empty()) {
        candidates.push(dir.join(entry_file_name(name)));
    }
    candidates
}

#[async_trait]
impl MetadataStore for SrrStore {
    async fn parse(&self, record: &Path) -> crate::Result<MetadataRecord> {
        let parsed = parse_srr_file(record)?;
        debug!(
            record = ?record,
            app = parsed.app_name.as_deref().unwrap_or("unknown"),
            archived = parsed.archived.len(),
            stored = parsed.stored.len(),
            volumes = parsed.volumes.len(),
            "parsed SRR record"
        );
        Ok(parsed)
    }

    async fn extract(
        &self,
        record: &MetadataRecord,
        dest: &Path,
        filter: &dyn ExtractFilter,
    ) -> crate::Result<Vec<ExtractedEntry>> {
        let mut results = Vec::new();

        for entry in record.stored.iter().filter(|s| filter.should_extract(&s.name)) {
            let result = Self::extract_one(&entry.name, &entry.data, dest).await;
            if let ExtractOutcome::Failed(reason) = &result.outcome {
                warn!(entry = %entry.name, %reason, "failed to extract stored file");
            }
            results.push(result);
        }

        Ok(results)
    }

    async fn verify_archived(
        &self,
        record: &MetadataRecord,
        dir: &Path,
        checksums: &dyn ChecksumService,
    ) -> crate::Result<Vec<FileCheck>> {
        let mut checks = Vec::new();

        for entry in &record.archived {
            let Some(expected) = entry.crc32 else {
                debug!(file = %entry.name, "no CRC recorded, skipping");
                continue;
            };

            let path = archived_candidates(dir, &entry.name)
                .into_iter()
                .find(|p| p.is_file());

            let actual = match &path {
                Some(p) => Some(checksums.crc32(p)?),
                None => None,
            };

            let check = FileCheck::new(&entry.name, path, expected, actual);
            debug!(
                file = %check.name,
                expected = %format_crc(expected),
                actual = ?actual.map(format_crc),
                status = %check.status,
                "checked archived file"
            );
            checks.push(check);
        }

        Ok(checks)
    }

    fn name(&self) -> &'static str {
        "srr"
    }
}
