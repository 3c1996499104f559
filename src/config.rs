//! Configuration types for srrdb-verify
//!
//! [`Config`] holds every policy switch of the pipeline and is loadable from a
//! TOML file. [`JobContext`] holds the per-run inputs supplied by the download
//! host (or by the command line when run standalone).

use crate::error::{Error, Result};
use crate::srr::ExtractFilter;
use crate::types::ReleaseDirectory;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the completed job directory (SABnzbd)
pub const ENV_COMPLETE_DIR: &str = "SAB_COMPLETE_DIR";
/// Environment variable naming the final job name (SABnzbd)
pub const ENV_FINAL_NAME: &str = "SAB_FINAL_NAME";
/// Environment variable naming the gzipped original NZB (SABnzbd)
pub const ENV_ORIG_NZB_GZ: &str = "SAB_ORIG_NZB_GZ";

/// Remote catalog (srrDB) settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog base URL (default: "https://www.srrdb.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Catalog base URL used for `.XXX.` releases (default: "https://www.srrxxx.com")
    #[serde(default = "default_adult_base_url")]
    pub adult_base_url: String,

    /// Timeout for each HTTP request in seconds (default: 30)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            adult_base_url: default_adult_base_url(),
            timeout: default_timeout(),
        }
    }
}

impl CatalogConfig {
    /// Base URL to use for a given release name
    ///
    /// # Examples
    ///
    /// ```
    /// use srrdb_verify::config::CatalogConfig;
    ///
    /// let cfg = CatalogConfig::default();
    /// assert_eq!(cfg.base_for("Movie.2024.1080p-GRP"), "https://www.srrdb.com");
    /// assert_eq!(cfg.base_for("Studio.24.01.01.XXX.1080p-GRP"), "https://www.srrxxx.com");
    /// ```
    pub fn base_for(&self, release: &str) -> &str {
        if release.contains(".XXX.") {
            &self.adult_base_url
        } else {
            &self.base_url
        }
    }
}

/// Which stored SRR entries are extracted into the release directory
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// File extensions to extract, compared case-insensitively
    /// (default: nfo, m3u, jpg, sfv)
    #[serde(default = "default_extract_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            extensions: default_extract_extensions(),
        }
    }
}

impl ExtractFilter for ExtractionConfig {
    fn should_extract(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

/// Post-verification cleanup settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Delete the SRR record once verification passed (default: false)
    #[serde(default)]
    pub remove_valid_record: bool,

    /// Delete sample media described by stored SRS files (default: true)
    #[serde(default = "default_true")]
    pub remove_samples: bool,

    /// Delete the SRS descriptors themselves (default: true)
    #[serde(default = "default_true")]
    pub remove_sample_descriptors: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            remove_valid_record: false,
            remove_samples: true,
            remove_sample_descriptors: true,
        }
    }
}

/// Terminal housekeeping settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FinalizeConfig {
    /// Write the host's original NZB next to the release (default: true)
    #[serde(default = "default_true")]
    pub archive_job_descriptor: bool,

    /// Move verified music albums under an artist directory (default: false)
    #[serde(default)]
    pub relocate_albums: bool,

    /// Artist tags that never get their own directory, lowercase (default: va, ost)
    #[serde(default = "default_placeholder_artists")]
    pub placeholder_artists: Vec<String>,
}

impl Default for FinalizeConfig {
    fn default() -> Self {
        Self {
            archive_job_descriptor: true,
            relocate_albums: false,
            placeholder_artists: default_placeholder_artists(),
        }
    }
}

/// Main configuration for the verification pipeline
///
/// Every field has a default, so an empty TOML file is a valid configuration:
///
/// ```toml
/// [catalog]
/// timeout = 15
///
/// [cleanup]
/// remove_valid_record = true
///
/// [finalize]
/// relocate_albums = true
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote catalog settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Stored-entry extraction allow-list
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Sample and record cleanup
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// Job descriptor archival and album relocation
    #[serde(default)]
    pub finalize: FinalizeConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&text).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("catalog.base_url", &self.catalog.base_url),
            ("catalog.adult_base_url", &self.catalog.adult_base_url),
        ] {
            url::Url::parse(value).map_err(|e| Error::Config {
                message: format!("invalid URL {value:?}: {e}"),
                key: Some(key.to_string()),
            })?;
        }

        if self.catalog.timeout.is_zero() {
            return Err(Error::Config {
                message: "timeout must be greater than zero".to_string(),
                key: Some("catalog.timeout".to_string()),
            });
        }

        if self.extraction.extensions.is_empty() {
            return Err(Error::Config {
                message: "at least one extraction extension is required".to_string(),
                key: Some("extraction.extensions".to_string()),
            });
        }

        Ok(())
    }
}

/// Per-run inputs: which directory, under which name, from which host
#[derive(Clone, Debug)]
pub struct JobContext {
    /// Directory and canonical release name
    pub release: ReleaseDirectory,

    /// Launched by a download host rather than from a shell
    ///
    /// Host-only steps (job descriptor archival, album relocation) are
    /// skipped for standalone runs.
    pub host_run: bool,

    /// Gzipped original job descriptor supplied by the host
    pub original_job_descriptor: Option<PathBuf>,
}

impl JobContext {
    /// Standalone run on a directory given on the command line
    pub fn standalone(dir: impl AsRef<Path>) -> Self {
        Self {
            release: ReleaseDirectory::from_path(dir),
            host_run: false,
            original_job_descriptor: None,
        }
    }

    /// Build the context from SABnzbd's post-processing environment
    ///
    /// Returns `None` when `SAB_COMPLETE_DIR` is not set.
    pub fn from_env() -> Option<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the context from an arbitrary variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let dir = lookup(ENV_COMPLETE_DIR).filter(|d| !d.is_empty())?;

        let release = match lookup(ENV_FINAL_NAME).filter(|n| !n.is_empty()) {
            Some(name) => ReleaseDirectory::with_name(&dir, name),
            None => ReleaseDirectory::from_path(&dir),
        };

        Some(Self {
            release,
            host_run: true,
            original_job_descriptor: lookup(ENV_ORIG_NZB_GZ)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        })
    }

    /// True when a download host launched this run
    pub fn is_host_run(&self) -> bool {
        self.host_run
    }
}

// Helper functions for serde defaults
fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://www.srrdb.com".to_string()
}

fn default_adult_base_url() -> String {
    "https://www.srrxxx.com".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_extract_extensions() -> Vec<String> {
    ["nfo", "m3u", "jpg", "sfv"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_placeholder_artists() -> Vec<String> {
    vec!["va".to_string(), "ost".to_string()]
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
