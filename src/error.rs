//! Error types for srrdb-verify
//!
//! This module provides the error taxonomy of the verification pipeline:
//! - Terminal pipeline outcomes (ambiguous match, unknown release, network failure, ...)
//! - Format errors for the SRR and SRS readers
//! - Exit code mapping for the command-line entry point
//! - A serializable run report for machine-readable output

use crate::types::{CheckStatus, PipelineReport, PipelineStatus, VerificationOutcome};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for srrdb-verify operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for srrdb-verify
#[derive(Debug, Error)]
pub enum Error {
    /// Terminal pipeline condition (see [`PipelineError`])
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Malformed SRR metadata record
    #[error("invalid SRR record: {0}")]
    Srr(#[from] SrrError),

    /// Malformed SRS sample descriptor
    #[error("invalid SRS descriptor: {0}")]
    Srs(#[from] SrsError),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "catalog.base_url")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error (connect, timeout, body decoding)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Conditions that end a pipeline run without a passing verification
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The catalog returned more than one candidate release
    #[error("srrDB returned {count} releases for {query:?}, verify manually")]
    AmbiguousMatch {
        /// The name or checksum query that was searched
        query: String,
        /// Number of results reported by the catalog
        count: u64,
    },

    /// Neither a local record nor a catalog match exists
    #[error("unknown scene release {release:?}, possibly P2P or no SRR available")]
    UnknownRelease {
        /// The release name that could not be resolved
        release: String,
    },

    /// The catalog answered with a non-success status
    #[error("HTTP {status} from {url}: {body}")]
    NetworkFailure {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
        /// Response body (truncated)
        body: String,
    },

    /// At least one file failed its checksum comparison
    #[error(
        "verification failed: {} of {} file(s) did not match",
        .outcome.failures(),
        .outcome.checks.len()
    )]
    VerificationFailed {
        /// Per-file verification detail
        outcome: VerificationOutcome,
    },

    /// No checksum source exists for this release
    #[error("verification unavailable: {reason}")]
    VerificationUnavailable {
        /// Why no verdict could be reached
        reason: String,
    },

    /// Album relocation target already exists
    #[error("destination already exists: {}", .path.display())]
    DestinationConflict {
        /// The occupied destination directory
        path: PathBuf,
    },
}

/// Errors raised while reading an SRR record
#[derive(Debug, Error)]
pub enum SrrError {
    /// The data ended in the middle of a block
    #[error("truncated block at offset {offset}")]
    Truncated {
        /// Byte offset of the block start
        offset: usize,
    },

    /// A block header declares an impossible size
    #[error("block at offset {offset} declares header size {size}")]
    BadHeaderSize {
        /// Byte offset of the block start
        offset: usize,
        /// Declared header size
        size: u16,
    },

    /// The first block is not an SRR header
    #[error("missing SRR header block (found type {found:#04x})")]
    MissingHeader {
        /// Block type found at offset 0
        found: u8,
    },
}

/// Errors raised while reading an SRS sample descriptor
#[derive(Debug, Error)]
pub enum SrsError {
    /// No file data block could be located
    #[error("no SRSF file data block found")]
    MissingFileData,

    /// A field ran past the end of its block
    #[error("truncated {field} field")]
    Truncated {
        /// Name of the field being decoded
        field: &'static str,
    },
}

/// Map errors to process exit codes
///
/// The exit code is the authoritative machine-readable signal for the
/// download host; `error_code` is the stable name used in JSON reports.
pub trait ToExitCode {
    /// Process exit code for this error
    fn exit_code(&self) -> i32;

    /// Machine-readable error code
    fn error_code(&self) -> &str;
}

/// Exit code for a passing or intentionally skipped run
pub const EXIT_OK: i32 = 0;
/// Exit code for a failed checksum verification
pub const EXIT_VERIFICATION_FAILED: i32 = 1;
/// Exit code for an ambiguous catalog match
pub const EXIT_AMBIGUOUS_MATCH: i32 = 2;
/// Exit code for an unknown release
pub const EXIT_UNKNOWN_RELEASE: i32 = 3;
/// Exit code for a non-success HTTP response
pub const EXIT_NETWORK_FAILURE: i32 = 4;
/// Exit code when no checksum source exists
pub const EXIT_VERIFICATION_UNAVAILABLE: i32 = 5;
/// Exit code for local failures (I/O, configuration, malformed records)
pub const EXIT_INTERNAL: i32 = 6;
/// Exit code when the album destination already exists
pub const EXIT_DESTINATION_CONFLICT: i32 = 10;

impl ToExitCode for PipelineError {
    fn exit_code(&self) -> i32 {
        match self {
            PipelineError::VerificationFailed { .. } => EXIT_VERIFICATION_FAILED,
            PipelineError::AmbiguousMatch { .. } => EXIT_AMBIGUOUS_MATCH,
            PipelineError::UnknownRelease { .. } => EXIT_UNKNOWN_RELEASE,
            PipelineError::NetworkFailure { .. } => EXIT_NETWORK_FAILURE,
            PipelineError::VerificationUnavailable { .. } => EXIT_VERIFICATION_UNAVAILABLE,
            PipelineError::DestinationConflict { .. } => EXIT_DESTINATION_CONFLICT,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            PipelineError::VerificationFailed { .. } => "verification_failed",
            PipelineError::AmbiguousMatch { .. } => "ambiguous_match",
            PipelineError::UnknownRelease { .. } => "unknown_release",
            PipelineError::NetworkFailure { .. } => "network_failure",
            PipelineError::VerificationUnavailable { .. } => "verification_unavailable",
            PipelineError::DestinationConflict { .. } => "destination_conflict",
        }
    }
}

impl ToExitCode for Error {
    fn exit_code(&self) -> i32 {
        match self {
            Error::Pipeline(e) => e.exit_code(),
            // Transport errors are network failures as far as the host is concerned
            Error::Network(_) => EXIT_NETWORK_FAILURE,
            Error::Srr(_)
            | Error::Srs(_)
            | Error::Config { .. }
            | Error::Io(_)
            | Error::Serialization(_)
            | Error::Other(_) => EXIT_INTERNAL,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Pipeline(e) => e.error_code(),
            Error::Srr(_) => "invalid_srr",
            Error::Srs(_) => "invalid_srs",
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Other(_) => "internal_error",
        }
    }
}

/// Machine-readable summary of a run
///
/// # Example JSON
///
/// ```json
/// {
///   "release": "Group-Movie-2024-1080p",
///   "code": "verification_failed",
///   "exit_code": 1,
///   "message": "verification failed: 1 of 1 file(s) did not match",
///   "checks": [{ "name": "movie.mkv", "status": "mismatch" }]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Release basename
    pub release: String,
    /// Machine-readable status code ("verified", "skipped", or an error code)
    pub code: String,
    /// Process exit code
    pub exit_code: i32,
    /// Human-readable message
    pub message: String,
    /// Per-file verification results, when verification ran
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<ReportedCheck>,
}

/// One per-file line of a [`RunReport`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportedCheck {
    /// File name as listed in the record or checksum list
    pub name: String,
    /// Result of the comparison
    pub status: CheckStatus,
}

impl RunReport {
    /// Build a report for a run that ended in an error
    pub fn from_error(release: impl Into<String>, error: &Error) -> Self {
        let checks = match error {
            Error::Pipeline(PipelineError::VerificationFailed { outcome }) => {
                ReportedCheck::from_outcome(outcome)
            }
            _ => Vec::new(),
        };

        Self {
            release: release.into(),
            code: error.error_code().to_string(),
            exit_code: error.exit_code(),
            message: error.to_string(),
            checks,
        }
    }
}

impl From<&PipelineReport> for RunReport {
    fn from(report: &PipelineReport) -> Self {
        let (code, message, checks) = match &report.status {
            PipelineStatus::Skipped(reason) => {
                ("skipped", format!("skipped: {reason}"), Vec::new())
            }
            PipelineStatus::Verified {
                outcome,
                relocated_to,
            } => {
                let message = match relocated_to {
                    Some(path) => format!("Everything OK, moved to {}", path.display()),
                    None => "Everything OK".to_string(),
                };
                ("verified", message, ReportedCheck::from_outcome(outcome))
            }
        };

        Self {
            release: report.release.clone(),
            code: code.to_string(),
            exit_code: EXIT_OK,
            message,
            checks,
        }
    }
}

impl ReportedCheck {
    /// Flatten an outcome into report lines
    pub fn from_outcome(outcome: &VerificationOutcome) -> Vec<Self> {
        outcome
            .checks
            .iter()
            .map(|c| Self {
                name: c.name.clone(),
                status: c.status,
            })
            .collect()
    }
}
