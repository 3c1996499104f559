//! SFV checksum lists
//!
//! Music releases carry no archived entries in their SRR, so their tracks are
//! verified against the release's `.sfv` instead.

use crate::checksum::parse_crc;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// One `name crc` line of an SFV file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumListEntry {
    /// File name as written in the list
    pub name: String,
    /// Recorded CRC-32
    pub crc32: u32,
}

/// Parse the contents of an SFV file
///
/// Blank lines and `;` comments are skipped. The CRC is the last
/// whitespace-separated token, so names containing spaces survive.
/// Malformed lines are logged and skipped.
///
/// # Examples
///
/// ```
/// use srrdb_verify::sfv::parse_sfv;
///
/// let entries = parse_sfv("; generated by foo\n01-artist-track.flac 1A2B3C4D\n");
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].name, "01-artist-track.flac");
/// assert_eq!(entries[0].crc32, 0x1A2B3C4D);
/// ```
pub fn parse_sfv(text: &str) -> Vec<ChecksumListEntry> {
    let mut entries = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        let parsed = line
            .rsplit_once(|c: char| c.is_whitespace())
            .and_then(|(name, crc)| {
                let name = name.trim();
                (!name.is_empty())
                    .then_some(name)
                    .zip(parse_crc(crc.trim()))
            });

        match parsed {
            Some((name, crc32)) => entries.push(ChecksumListEntry {
                name: name.to_string(),
                crc32,
            }),
            None => warn!(line = line_no + 1, content = line, "skipping malformed SFV line"),
        }
    }

    entries
}

/// Read and parse an SFV file
///
/// SFV files are frequently written in legacy code pages, so invalid UTF-8 is
/// replaced rather than rejected.
pub fn read_sfv(path: &Path) -> Result<Vec<ChecksumListEntry>> {
    let bytes = std::fs::read(path)?;
    Ok(parse_sfv(&String::from_utf8_lossy(&bytes)))
}

/// Find SFV files in the directory root, sorted by file name
pub fn find_sfv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = crate::utils::files_with_extension(dir, "sfv")?;
    found.sort();
    debug!(?dir, count = found.len(), "found SFV files");
    Ok(found)
}
