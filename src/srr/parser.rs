//! Pure Rust reader for the SRR block format.
//!
//! ## Block Structure
//!
//! Every block starts with a RAR-style header (little-endian):
//! - 2 bytes: header CRC
//! - 1 byte: block type
//! - 2 bytes: flags
//! - 2 bytes: header size (includes everything up to the payload)
//! - 4 bytes: payload size, only present when flags has `0x8000`
//!
//! SRR-specific blocks:
//! - `0x69` header: optional application name (`u16` length + bytes)
//! - `0x6A` stored file: `u16` name length + name, payload follows the header
//! - `0x6B` OSO hash, `0x6C` RAR padding
//! - `0x71` RAR volume: `u16` length + volume name; the volume's RAR headers follow
//!
//! RAR blocks (`0x72`..=`0x7B`) are copied header-only: their packed data is
//! what the SRR deliberately leaves out.

use super::{ArchivedFileEntry, MetadataRecord, StoredFileEntry};
use crate::error::SrrError;
use std::path::PathBuf;

pub(crate) const BLOCK_SRR_HEADER: u8 = 0x69;
pub(crate) const BLOCK_SRR_STORED_FILE: u8 = 0x6A;
const BLOCK_SRR_OSO_HASH: u8 = 0x6B;
const BLOCK_SRR_RAR_PADDING: u8 = 0x6C;
pub(crate) const BLOCK_SRR_RAR_FILE: u8 = 0x71;
pub(crate) const BLOCK_RAR_FILE: u8 = 0x74;
const RAR_BLOCK_FIRST: u8 = 0x72;
const RAR_BLOCK_LAST: u8 = 0x7B;

pub(crate) const FLAG_LONG_BLOCK: u16 = 0x8000;
pub(crate) const FLAG_SRR_APP_NAME: u16 = 0x0001;
pub(crate) const FLAG_SPLIT_AFTER: u16 = 0x0002;
pub(crate) const FLAG_LARGE_FILE: u16 = 0x0100;
pub(crate) const FLAG_UNICODE_NAME: u16 = 0x0200;
pub(crate) const FLAG_DIRECTORY: u16 = 0x00E0;

/// Size of the base block header (crc + type + flags + size)
const BASE_HEADER_SIZE: usize = 7;

/// Size of the fixed RAR file header fields after the base header
/// (pack + unp + os + crc + time + ver + method + name_len + attr)
const RAR_FILE_FIXED: usize = 4 + 4 + 1 + 4 + 4 + 1 + 1 + 2 + 4; // 25 bytes

fn read_u16(data: &[u8], at: usize) -> Option<u16> {
    data.get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32(data: &[u8], at: usize) -> Option<u32> {
    data.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Read a `u16`-length-prefixed name starting at `at`
fn read_prefixed_name(data: &[u8], at: usize) -> Option<String> {
    let len = read_u16(data, at)? as usize;
    data.get(at + 2..at + 2 + len)
        .map(|b| String::from_utf8_lossy(b).into_owned())
}

struct BlockHeader {
    kind: u8,
    flags: u16,
    header_size: usize,
    add_size: usize,
}

fn read_block_header(data: &[u8], pos: usize) -> Result<BlockHeader, SrrError> {
    let truncated = SrrError::Truncated { offset: pos };
    if pos + BASE_HEADER_SIZE > data.len() {
        return Err(truncated);
    }

    let kind = data[pos + 2];
    let flags = read_u16(data, pos + 3).ok_or(SrrError::Truncated { offset: pos })?;
    let size = read_u16(data, pos + 5).ok_or(SrrError::Truncated { offset: pos })?;
    let header_size = size as usize;

    let long = flags & FLAG_LONG_BLOCK != 0;
    let min_size = if long {
        BASE_HEADER_SIZE + 4
    } else {
        BASE_HEADER_SIZE
    };
    if header_size < min_size {
        return Err(SrrError::BadHeaderSize { offset: pos, size });
    }
    if pos + header_size > data.len() {
        return Err(truncated);
    }

    let add_size = if long {
        read_u32(data, pos + BASE_HEADER_SIZE).unwrap_or(0) as usize
    } else {
        0
    };

    Ok(BlockHeader {
        kind,
        flags,
        header_size,
        add_size,
    })
}

/// Parse a complete SRR file held in memory.
///
/// # Errors
///
/// Returns an error if the first block is not an SRR header or if any block
/// runs past the end of the data.
pub fn parse_srr_bytes(data: &[u8]) -> Result<MetadataRecord, SrrError> {
    let mut record = MetadataRecord::default();
    let mut pos = 0;
    let mut first = true;

    while pos < data.len() {
        let block = read_block_header(data, pos)?;
        let header = &data[pos..pos + block.header_size];

        if first {
            if block.kind != BLOCK_SRR_HEADER {
                return Err(SrrError::MissingHeader { found: block.kind });
            }
            first = false;
        }

        let mut next = pos + block.header_size;

        match block.kind {
            BLOCK_SRR_HEADER => {
                if block.flags & FLAG_SRR_APP_NAME != 0 {
                    record.app_name = read_prefixed_name(header, BASE_HEADER_SIZE);
                }
            }
            BLOCK_SRR_STORED_FILE => {
                let name = read_prefixed_name(header, BASE_HEADER_SIZE + 4)
                    .ok_or(SrrError::Truncated { offset: pos })?;
                let payload = data
                    .get(next..next + block.add_size)
                    .ok_or(SrrError::Truncated { offset: pos })?;
                record.stored.push(StoredFileEntry {
                    name,
                    data: payload.to_vec(),
                });
                next += block.add_size;
            }
            BLOCK_SRR_OSO_HASH => {}
            BLOCK_SRR_RAR_PADDING => next += block.add_size,
            BLOCK_SRR_RAR_FILE => {
                if let Some(volume) = read_prefixed_name(header, BASE_HEADER_SIZE) {
                    record.volumes.push(volume);
                }
            }
            BLOCK_RAR_FILE => read_rar_file_header(header, block.flags, &mut record.archived),
            RAR_BLOCK_FIRST..=RAR_BLOCK_LAST => {}
            _ => next += block.add_size,
        }

        if next > data.len() {
            return Err(SrrError::Truncated { offset: pos });
        }
        pos = next;
    }

    if first {
        return Err(SrrError::Truncated { offset: 0 });
    }

    Ok(record)
}

/// Record the file described by a RAR file header, merging split parts.
fn read_rar_file_header(header: &[u8], flags: u16, archived: &mut Vec<ArchivedFileEntry>) {
    if flags & FLAG_DIRECTORY == FLAG_DIRECTORY {
        return;
    }

    let base = BASE_HEADER_SIZE;
    let (Some(unp_low), Some(crc), Some(name_len)) = (
        read_u32(header, base + 4),
        read_u32(header, base + 9),
        read_u16(header, base + 19),
    ) else {
        return;
    };

    let mut name_at = base + RAR_FILE_FIXED;
    let mut size = unp_low as u64;
    if flags & FLAG_LARGE_FILE != 0 {
        let high_unp = read_u32(header, name_at + 4).unwrap_or(0);
        size |= (high_unp as u64) << 32;
        name_at += 8;
    }

    let Some(raw_name) = header.get(name_at..name_at + name_len as usize) else {
        return;
    };
    // Unicode names are stored as "ascii\0encoded"; the ascii part is enough here
    let raw_name = if flags & FLAG_UNICODE_NAME != 0 {
        let end = raw_name.iter().position(|&b| b == 0).unwrap_or(raw_name.len());
        &raw_name[..end]
    } else {
        raw_name
    };
    let name = String::from_utf8_lossy(raw_name).into_owned();

    // Only the last part of a split file records the CRC of the whole file
    let final_part = flags & FLAG_SPLIT_AFTER == 0;

    match archived.iter_mut().find(|e| e.name == name) {
        Some(entry) => {
            if final_part {
                entry.crc32 = Some(crc);
            }
        }
        None => archived.push(ArchivedFileEntry {
            name,
            crc32: final_part.then_some(crc),
            size,
        }),
    }
}

/// Read and parse an SRR file from disk.
pub(crate) fn parse_srr_file(path: &std::path::Path) -> crate::Result<MetadataRecord> {
    let data = std::fs::read(path)?;
    let mut record = parse_srr_bytes(&data)?;
    record.path = PathBuf::from(path);
    Ok(record)
}
