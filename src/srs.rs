//! SRS sample descriptors
//!
//! An SRS file is a stripped copy of a release's sample with the media data
//! removed. It names the original sample file and describes its tracks, which
//! is all the cleanup stage needs to find and delete the sample.
//!
//! ## Layouts
//!
//! The descriptor payloads are the same in every container:
//! - file data: `flags u16, app_len u16, app, name_len u16, name, size u64, crc u32`
//! - track data: `flags u16, number u16|u32, length u32|u64, match_offset u64,
//!   sig_len u16, signature`
//!
//! Only the wrapping differs:
//! - AVI (`RIFF`) and stream samples: `SRSF`/`SRST` fourcc, `u32` LE size, payload
//! - MP4: atoms, `u32` BE size (including the 8-byte atom header) then `SRSF`/`SRST`
//! - MKV: EBML element `1F 69 75 76` holding `6A 75` (file) and `6B 75` (track) children

use crate::error::SrsError;

const RIFF_MAGIC: &[u8; 4] = b"RIFF";
const EBML_MAGIC: &[u8; 4] = &[0x1A, 0x45, 0xDF, 0xA3];
const MP4_FTYP: &[u8; 4] = b"ftyp";

const FILE_MARKER: &[u8; 4] = b"SRSF";
const TRACK_MARKER: &[u8; 4] = b"SRST";

const MKV_RESAMPLE: &[u8; 4] = &[0x1F, 0x69, 0x75, 0x76];
const MKV_RESAMPLE_FILE: [u8; 2] = [0x6A, 0x75];
const MKV_RESAMPLE_TRACK: [u8; 2] = [0x6B, 0x75];

const TRACK_FLAG_BIG_FILE: u16 = 0x0004;
const TRACK_FLAG_BIG_NUMBER: u16 = 0x0008;

/// Container the sample was cut from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// AVI (RIFF)
    Avi,
    /// Matroska
    Mkv,
    /// MP4 / QuickTime
    Mp4,
    /// Elementary stream (MP3, VOB, ...)
    Stream,
}

/// One track of the original sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleTrack {
    /// Track number within the container
    pub number: u32,
    /// Bytes of media data in the track
    pub data_length: u64,
    /// Offset of the track's signature inside the main release file
    pub match_offset: u64,
}

/// Parsed SRS descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleDescriptor {
    /// Container type
    pub kind: SampleKind,
    /// Tool that wrote the SRS
    pub app_name: String,
    /// File name of the original sample
    pub sample_name: String,
    /// Size of the original sample in bytes
    pub sample_size: u64,
    /// CRC-32 of the original sample
    pub crc32: u32,
    /// Track layout
    pub tracks: Vec<SampleTrack>,
}

/// Detect the container of an SRS file from its magic bytes
pub fn detect_kind(data: &[u8]) -> SampleKind {
    if data.starts_with(RIFF_MAGIC) {
        SampleKind::Avi
    } else if data.starts_with(EBML_MAGIC) {
        SampleKind::Mkv
    } else if data.get(4..8) == Some(MP4_FTYP.as_slice()) {
        SampleKind::Mp4
    } else {
        SampleKind::Stream
    }
}

/// Parse an SRS file held in memory
///
/// # Errors
///
/// Returns [`SrsError::MissingFileData`] when no file data block exists and
/// [`SrsError::Truncated`] when a payload is cut short.
pub fn parse_srs(data: &[u8]) -> Result<SampleDescriptor, SrsError> {
    let kind = detect_kind(data);

    let (file_payloads, track_payloads) = match kind {
        SampleKind::Avi | SampleKind::Stream => (
            riff_payloads(data, FILE_MARKER),
            riff_payloads(data, TRACK_MARKER),
        ),
        SampleKind::Mp4 => (
            atom_payloads(data, FILE_MARKER),
            atom_payloads(data, TRACK_MARKER),
        ),
        SampleKind::Mkv => mkv_payloads(data),
    };

    let file = file_payloads.first().ok_or(SrsError::MissingFileData)?;
    let mut reader = Reader::new(file);
    let _flags = reader.u16("file flags")?;
    let app_name = reader.string("application name")?;
    let sample_name = reader.string("sample name")?;
    let sample_size = reader.u64("sample size")?;
    let crc32 = reader.u32("sample crc")?;

    let tracks = track_payloads
        .iter()
        .map(|payload| parse_track(payload))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SampleDescriptor {
        kind,
        app_name,
        sample_name,
        sample_size,
        crc32,
        tracks,
    })
}

fn parse_track(payload: &[u8]) -> Result<SampleTrack, SrsError> {
    let mut reader = Reader::new(payload);
    let flags = reader.u16("track flags")?;
    let number = if flags & TRACK_FLAG_BIG_NUMBER != 0 {
        reader.u32("track number")?
    } else {
        reader.u16("track number")? as u32
    };
    let data_length = if flags & TRACK_FLAG_BIG_FILE != 0 {
        reader.u64("track length")?
    } else {
        reader.u32("track length")? as u64
    };
    let match_offset = reader.u64("match offset")?;
    // The signature itself is only needed to rebuild the sample
    let sig_len = reader.u16("signature length")? as usize;
    reader.skip(sig_len, "signature")?;

    Ok(SampleTrack {
        number,
        data_length,
        match_offset,
    })
}

fn find_all(data: &[u8], marker: &[u8]) -> Vec<usize> {
    data.windows(marker.len())
        .enumerate()
        .filter(|(_, w)| *w == marker)
        .map(|(i, _)| i)
        .collect()
}

/// Payloads of `marker` chunks laid out as fourcc + `u32` LE size + data
fn riff_payloads<'a>(data: &'a [u8], marker: &[u8]) -> Vec<&'a [u8]> {
    find_all(data, marker)
        .into_iter()
        .filter_map(|at| {
            let size_bytes = data.get(at + 4..at + 8)?;
            let size = u32::from_le_bytes(size_bytes.try_into().ok()?) as usize;
            data.get(at + 8..at + 8 + size)
        })
        .collect()
}

/// Payloads of `marker` atoms laid out as `u32` BE size + type + data
fn atom_payloads<'a>(data: &'a [u8], marker: &[u8]) -> Vec<&'a [u8]> {
    find_all(data, marker)
        .into_iter()
        .filter(|&at| at >= 4)
        .filter_map(|at| {
            let size_bytes = data.get(at - 4..at)?;
            let size = u32::from_be_bytes(size_bytes.try_into().ok()?) as usize;
            let body = size.checked_sub(8)?;
            data.get(at + 4..at + 4 + body)
        })
        .collect()
}

/// Decode an EBML variable-length integer, returning (value, encoded length)
fn read_vint(data: &[u8]) -> Option<(u64, usize)> {
    let first = *data.first()?;
    if first == 0 {
        return None;
    }
    let len = first.leading_zeros() as usize + 1;
    let bytes = data.get(..len)?;
    let mut value = (first as u64) & ((1u64 << (8 - len)) - 1);
    for &b in &bytes[1..] {
        value = (value << 8) | b as u64;
    }
    Some((value, len))
}

fn mkv_payloads(data: &[u8]) -> (Vec<&[u8]>, Vec<&[u8]>) {
    let mut files = Vec::new();
    let mut tracks = Vec::new();

    for at in find_all(data, MKV_RESAMPLE) {
        let Some((size, len)) = data.get(at + 4..).and_then(read_vint) else {
            continue;
        };
        let start = at + 4 + len;
        let end = start.saturating_add(size as usize).min(data.len());
        let mut pos = start;

        while pos + 2 < end {
            let id = [data[pos], data[pos + 1]];
            let Some((child_size, child_len)) = read_vint(&data[pos + 2..end]) else {
                break;
            };
            let body_start = pos + 2 + child_len;
            let Some(body) = data.get(body_start..body_start + child_size as usize) else {
                break;
            };
            match id {
                MKV_RESAMPLE_FILE => files.push(body),
                MKV_RESAMPLE_TRACK => tracks.push(body),
                _ => {}
            }
            pos = body_start + child_size as usize;
        }
    }

    (files, tracks)
}

/// Little-endian cursor over a descriptor payload
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize, field: &'static str) -> Result<&'a [u8], SrsError> {
        let slice = self
            .data
            .get(self.pos..self.pos + n)
            .ok_or(SrsError::Truncated { field })?;
        self.pos += n;
        Ok(slice)
    }

    fn skip(&mut self, n: usize, field: &'static str) -> Result<(), SrsError> {
        self.take(n, field).map(|_| ())
    }

    fn u16(&mut self, field: &'static str) -> Result<u16, SrsError> {
        let b = self.take(2, field)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, field: &'static str) -> Result<u32, SrsError> {
        let b = self.take(4, field)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self, field: &'static str) -> Result<u64, SrsError> {
        let b = self.take(8, field)?;
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(b);
        Ok(u64::from_le_bytes(bytes))
    }

    fn string(&mut self, field: &'static str) -> Result<String, SrsError> {
        let len = self.u16(field)? as usize;
        let bytes = self.take(len, field)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}
