//! Core types for srrdb-verify

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// The unit of work: a completed download directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseDirectory {
    /// Directory on disk
    pub path: PathBuf,
    /// Canonical release name (normally the directory's basename)
    pub basename: String,
}

/// Why a release was intentionally not processed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Literal whitespace in the release name (usually a P2P release)
    Whitespace,
    /// Season pack (`.S01.`), bundling several episodes
    SeasonPack,
    /// No files in the directory root
    NoContent,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Whitespace => write!(f, "literal space in release name (P2P?)"),
            SkipReason::SeasonPack => write!(f, "season pack detected"),
            SkipReason::NoContent => write!(f, "no files found in directory root"),
        }
    }
}

fn season_pack_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"(?i)\.S[0-9]+\.").unwrap()
    })
}

impl ReleaseDirectory {
    /// Create a release directory whose basename is derived from the path
    ///
    /// Trailing separators are ignored, so `/downloads/Foo-Bar/` yields `Foo-Bar`.
    ///
    /// # Examples
    ///
    /// ```
    /// use srrdb_verify::types::ReleaseDirectory;
    ///
    /// let rel = ReleaseDirectory::from_path("/downloads/Group-Movie-2024/");
    /// assert_eq!(rel.basename, "Group-Movie-2024");
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = trim_trailing_separators(path.as_ref());
        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, basename }
    }

    /// Create a release directory with an explicit canonical name
    pub fn with_name(path: impl AsRef<Path>, basename: impl Into<String>) -> Self {
        Self {
            path: trim_trailing_separators(path.as_ref()),
            basename: basename.into(),
        }
    }

    /// Check the naming invariants before any mutation happens
    ///
    /// Returns the reason the release must be skipped, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use srrdb_verify::types::{ReleaseDirectory, SkipReason};
    ///
    /// let rel = ReleaseDirectory::from_path("/dl/Show.S02.1080p.WEB-GRP");
    /// assert_eq!(rel.validate(), Some(SkipReason::SeasonPack));
    /// ```
    #[must_use]
    pub fn validate(&self) -> Option<SkipReason> {
        if self.basename.split_whitespace().count() > 1 {
            return Some(SkipReason::Whitespace);
        }
        if season_pack_pattern().is_match(&self.basename) {
            return Some(SkipReason::SeasonPack);
        }
        None
    }

    /// Path of the metadata record in its canonical `<basename>.srr` form
    pub fn canonical_record_path(&self) -> PathBuf {
        self.path.join(format!("{}.srr", self.basename))
    }
}

fn trim_trailing_separators(path: &Path) -> PathBuf {
    // Path::components already drops trailing separators
    path.components().collect()
}

/// Which verification strategy ran
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStrategy {
    /// Archived-entry CRCs from the SRR record
    Record,
    /// Per-track checksum list (SFV), used when the record has no archived entries
    ChecksumList,
}

/// Content classification derived during verification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Video or other archived content
    Generic,
    /// Music release verified through its SFV
    AudioAlbum,
}

/// Result of comparing a single file against its recorded checksum
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Checksum matches
    Ok,
    /// File present but checksum differs
    Mismatch,
    /// File not found under any candidate name
    Missing,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Ok => write!(f, "OK"),
            CheckStatus::Mismatch => write!(f, "MISMATCH"),
            CheckStatus::Missing => write!(f, "MISSING"),
        }
    }
}

/// Per-file verification detail
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileCheck {
    /// Name as recorded in the SRR or SFV
    pub name: String,
    /// File that was actually checked, if one was found
    pub path: Option<PathBuf>,
    /// Recorded CRC-32
    pub expected: u32,
    /// Computed CRC-32, if the file was found
    pub actual: Option<u32>,
    /// Comparison result
    pub status: CheckStatus,
}

impl FileCheck {
    /// Classify a file given its expected and computed checksums
    pub fn new(
        name: impl Into<String>,
        path: Option<PathBuf>,
        expected: u32,
        actual: Option<u32>,
    ) -> Self {
        let status = match actual {
            None => CheckStatus::Missing,
            Some(crc) if crc == expected => CheckStatus::Ok,
            Some(_) => CheckStatus::Mismatch,
        };
        Self {
            name: name.into(),
            path,
            expected,
            actual,
            status,
        }
    }
}

/// Outcome of a verification pass
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationOutcome {
    /// Strategy that produced the checks
    pub strategy: VerificationStrategy,
    /// Content classification
    pub content: ContentKind,
    /// Per-file results in record/list order
    pub checks: Vec<FileCheck>,
}

impl VerificationOutcome {
    /// True when every file matched
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.status == CheckStatus::Ok)
    }

    /// Number of files that did not match
    pub fn failures(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status != CheckStatus::Ok)
            .count()
    }

    /// True when the release was classified as a music album
    pub fn is_audio_album(&self) -> bool {
        self.content == ContentKind::AudioAlbum
    }
}

/// How a pipeline run ended, when it did not end in an error
#[derive(Clone, Debug)]
pub enum PipelineStatus {
    /// Nothing was touched
    Skipped(SkipReason),
    /// Verification passed and follow-up steps ran
    Verified {
        /// Verification detail
        outcome: VerificationOutcome,
        /// New location of the release directory if it was relocated
        relocated_to: Option<PathBuf>,
    },
}

/// Summary of a successful pipeline run
#[derive(Clone, Debug)]
pub struct PipelineReport {
    /// Release name
    pub release: String,
    /// How the run ended
    pub status: PipelineStatus,
}
