//! CRC-32 checksums of files on disk
//!
//! The pipeline only ever talks to [`ChecksumService`], so tests (or a host
//! with cached checksums) can substitute their own implementation.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read buffer size for streaming checksums
const BUFFER_SIZE: usize = 1024 * 1024;

/// Computes the CRC-32 of a file
pub trait ChecksumService: Send + Sync {
    /// CRC-32 (IEEE) of the file's full contents
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    fn crc32(&self, path: &Path) -> crate::Result<u32>;
}

/// Streaming CRC-32 over the file contents using `crc32fast`
#[derive(Debug, Default, Clone, Copy)]
pub struct Crc32Checksum;

impl ChecksumService for Crc32Checksum {
    fn crc32(&self, path: &Path) -> crate::Result<u32> {
        let mut file = File::open(path)?;
        let mut hasher = crc32fast::Hasher::new();
        let mut buffer = vec![0u8; BUFFER_SIZE];

        loop {
            let read = file.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(hasher.finalize())
    }
}

/// Format a CRC the way srrDB and SFV files spell it (`%08X`)
///
/// # Examples
///
/// ```
/// use srrdb_verify::checksum::format_crc;
///
/// assert_eq!(format_crc(0xDEADBEEF), "DEADBEEF");
/// assert_eq!(format_crc(0x1F), "0000001F");
/// ```
#[must_use]
pub fn format_crc(crc: u32) -> String {
    format!("{crc:08X}")
}

/// Parse an 8-digit hexadecimal CRC in either case
#[must_use]
pub fn parse_crc(text: &str) -> Option<u32> {
    if text.len() != 8 || !text.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(text, 16).ok()
}
