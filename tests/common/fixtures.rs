//! SRR fixtures and release directory generators

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Release name used by most tests
pub const MOVIE: &str = "Movie.2024.1080p.BluRay.x264-GRP";

/// Contents whose CRC-32 is the standard check value `CBF43926`
pub const CHECK_CONTENT: &[u8] = b"123456789";

/// CRC-32 of [`CHECK_CONTENT`]
pub const CHECK_CRC: u32 = 0xCBF43926;

fn block(kind: u8, flags: u16, fields: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0u16.to_le_bytes());
    out.push(kind);
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&((7 + fields.len()) as u16).to_le_bytes());
    out.extend_from_slice(fields);
    out
}

fn prefixed(name: &str) -> Vec<u8> {
    let mut out = (name.len() as u16).to_le_bytes().to_vec();
    out.extend_from_slice(name.as_bytes());
    out
}

/// Builds SRR files byte by byte
pub struct SrrFixture {
    data: Vec<u8>,
}

impl SrrFixture {
    /// SRR header block naming the creating application
    pub fn new() -> Self {
        Self {
            data: block(0x69, 0x0001, &prefixed("fixture")),
        }
    }

    /// Stored auxiliary file
    pub fn stored(mut self, name: &str, contents: &[u8]) -> Self {
        let mut fields = (contents.len() as u32).to_le_bytes().to_vec();
        fields.extend_from_slice(&prefixed(name));
        self.data.extend_from_slice(&block(0x6A, 0x8000, &fields));
        self.data.extend_from_slice(contents);
        self
    }

    /// RAR volume with one stored file header
    pub fn archived(mut self, volume: &str, name: &str, crc: u32) -> Self {
        self.data.extend_from_slice(&block(0x71, 0, &prefixed(volume)));
        self.data
            .extend_from_slice(&[0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x00]);

        let mut fields = Vec::new();
        fields.extend_from_slice(&9u32.to_le_bytes());
        fields.extend_from_slice(&9u32.to_le_bytes());
        fields.push(2);
        fields.extend_from_slice(&crc.to_le_bytes());
        fields.extend_from_slice(&0u32.to_le_bytes());
        fields.push(29);
        fields.push(0x30);
        fields.extend_from_slice(&(name.len() as u16).to_le_bytes());
        fields.extend_from_slice(&0x20u32.to_le_bytes());
        fields.extend_from_slice(name.as_bytes());
        self.data.extend_from_slice(&block(0x74, 0x8000, &fields));
        self
    }

    /// Finished SRR bytes
    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

impl Default for SrrFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// SRR of a single-file movie release whose main file has CRC [`CHECK_CRC`]
pub fn movie_srr() -> Vec<u8> {
    SrrFixture::new()
        .stored("movie.nfo", b"nfo")
        .archived("movie.rar", "movie.mkv", CHECK_CRC)
        .build()
}

/// Create `<root>/<name>` holding an obfuscated main file
pub fn obfuscated_release(root: &TempDir, name: &str) -> PathBuf {
    let dir = root.path().join(name);
    std::fs::create_dir_all(&dir).expect("create release dir");
    std::fs::write(dir.join("f3a9c0d1e2.mkv"), CHECK_CONTENT).expect("write main file");
    dir
}

/// File names in `dir`, sorted
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
