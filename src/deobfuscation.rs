//! Primary file deobfuscation
//!
//! Usenet posts often carry the main media file under a random name. The SRR
//! record remembers the name the file had inside the original RAR set, so the
//! file can be renamed back once the record is known.

use crate::srr::MetadataRecord;
use crate::utils::{entry_file_name, same_extension};
use std::fs;
use std::path::{Path, PathBuf};

/// What to do with the primary file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenamePlan {
    /// Already carries its recorded name
    AlreadyCanonical,
    /// Recorded name has a different extension; renaming would mislabel content
    ExtensionMismatch {
        /// Name recorded in the SRR
        recorded: String,
    },
    /// Another file already occupies the recorded name
    TargetOccupied(PathBuf),
    /// Rename `from` to `to`
    Rename {
        /// Current path
        from: PathBuf,
        /// Path carrying the recorded name
        to: PathBuf,
    },
}

/// Canonical file name of the primary media file
///
/// The last archived entry wins when the record lists several, and any
/// directory recorded with the entry is dropped.
///
/// # Examples
///
/// ```
/// use srrdb_verify::deobfuscation::canonical_name;
/// use srrdb_verify::srr::{ArchivedFileEntry, MetadataRecord};
///
/// let record = MetadataRecord {
///     archived: vec![ArchivedFileEntry {
///         name: "Subs\\movie.idx".into(),
///         crc32: None,
///         size: 0,
///     }],
///     ..Default::default()
/// };
/// assert_eq!(canonical_name(&record), Some("movie.idx"));
/// ```
#[must_use]
pub fn canonical_name(record: &MetadataRecord) -> Option<&str> {
    record
        .primary_name()
        .map(entry_file_name)
        .filter(|n| !n.is_empty())
}

/// Decide how `primary` should be renamed to carry `recorded`
///
/// Nothing is touched on disk.
pub fn plan_rename(primary: &Path, recorded: &str) -> RenamePlan {
    let current = primary
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if current == recorded {
        return RenamePlan::AlreadyCanonical;
    }

    if !same_extension(&current, recorded) {
        return RenamePlan::ExtensionMismatch {
            recorded: recorded.to_string(),
        };
    }

    let target = primary.with_file_name(recorded);
    if target.exists() && !is_same_file(primary, &target) {
        return RenamePlan::TargetOccupied(target);
    }

    RenamePlan::Rename {
        from: primary.to_path_buf(),
        to: target,
    }
}

/// Case-insensitive filesystems resolve both names to one file
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Find the largest file in a list of paths
///
/// Ties keep the earliest path in `files`. Directories and paths that fail to
/// stat are ignored.
///
/// # Examples
///
/// ```no_run
/// use std::path::PathBuf;
/// use srrdb_verify::deobfuscation::find_largest_file;
///
/// let files = vec![PathBuf::from("movie.nfo"), PathBuf::from("a8f3c1.mkv")];
/// let primary = find_largest_file(&files);
/// ```
pub fn find_largest_file(files: &[PathBuf]) -> Option<PathBuf> {
    let mut largest: Option<(&PathBuf, u64)> = None;

    for file in files {
        let Ok(metadata) = fs::metadata(file) else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let size = metadata.len();
        if largest.is_none_or(|(_, best)| size > best) {
            largest = Some((file, size));
        }
    }

    largest.map(|(path, _)| path.clone())
}
