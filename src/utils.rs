//! Utility functions for file lookup and path manipulation

use crate::error::Result;
use std::path::{Component, Path, PathBuf};

/// List regular files in `dir` (not recursive) whose extension matches `ext`
/// case-insensitively, in directory enumeration order
pub fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && has_extension(&path, ext) {
            found.push(path);
        }
    }
    Ok(found)
}

/// List regular files in `dir` (not recursive), in directory enumeration order
pub fn root_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            found.push(entry.path());
        }
    }
    Ok(found)
}

/// Case-insensitive extension check
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use srrdb_verify::utils::has_extension;
///
/// assert!(has_extension(Path::new("Movie.SRR"), "srr"));
/// assert!(!has_extension(Path::new("movie.srr.part"), "srr"));
/// ```
#[must_use]
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// True when both names carry the same extension, ignoring case
///
/// Two names without an extension are considered equal.
#[must_use]
pub fn same_extension(a: &str, b: &str) -> bool {
    let ext_a = Path::new(a).extension().map(|e| e.to_string_lossy().to_lowercase());
    let ext_b = Path::new(b).extension().map(|e| e.to_string_lossy().to_lowercase());
    ext_a == ext_b
}

/// Last path component of an entry name packaged in an SRR
///
/// SRR entries use either separator regardless of the host that created them.
///
/// # Examples
///
/// ```
/// use srrdb_verify::utils::entry_file_name;
///
/// assert_eq!(entry_file_name("Sample\\movie-sample.srs"), "movie-sample.srs");
/// assert_eq!(entry_file_name("Proof/cover.jpg"), "cover.jpg");
/// assert_eq!(entry_file_name("movie.nfo"), "movie.nfo");
/// ```
#[must_use]
pub fn entry_file_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Directory part of an entry name packaged in an SRR, if any
#[must_use]
pub fn entry_dir_name(name: &str) -> Option<&str> {
    name.rfind(['/', '\\'])
        .map(|idx| &name[..idx])
        .filter(|d| !d.is_empty())
}

/// Convert an SRR entry name to a relative path, refusing anything that
/// would escape the release directory
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use srrdb_verify::utils::entry_relative_path;
///
/// assert_eq!(entry_relative_path("Sample\\x.srs"), Some(PathBuf::from("Sample/x.srs")));
/// assert_eq!(entry_relative_path("../etc/passwd"), None);
/// assert_eq!(entry_relative_path("/abs/path"), None);
/// ```
#[must_use]
pub fn entry_relative_path(name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    let path = Path::new(&normalized);
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!out.as_os_str().is_empty()).then_some(out)
}

/// Name variants tried, in order, when a listed file is not found as written
///
/// Checksum lists authored on case-insensitive filesystems often disagree with
/// the on-disk casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameTransform {
    /// The name exactly as listed
    Exact,
    /// Entire name lowercased
    Lowercase,
    /// Entire name uppercased
    Uppercase,
    /// Extension lowercased, stem untouched
    LowercaseExtension,
}

/// Default lookup order for checksum-list names
pub const DEFAULT_NAME_TRANSFORMS: &[NameTransform] = &[
    NameTransform::Exact,
    NameTransform::Lowercase,
    NameTransform::LowercaseExtension,
    NameTransform::Uppercase,
];

impl NameTransform {
    /// Apply the transform to a listed name
    pub fn apply(self, name: &str) -> String {
        match self {
            NameTransform::Exact => name.to_string(),
            NameTransform::Lowercase => name.to_lowercase(),
            NameTransform::Uppercase => name.to_uppercase(),
            NameTransform::LowercaseExtension => match name.rfind('.') {
                Some(idx) => format!("{}{}", &name[..idx], name[idx..].to_lowercase()),
                None => name.to_string(),
            },
        }
    }
}

/// Resolve a listed name to an existing file under `dir`
///
/// Tries each transform in order and returns the first candidate that is a
/// regular file.
pub fn resolve_listed_file(
    dir: &Path,
    name: &str,
    transforms: &[NameTransform],
) -> Option<PathBuf> {
    let relative = entry_relative_path(name)?;
    let relative = relative.to_string_lossy();
    transforms
        .iter()
        .map(|t| dir.join(t.apply(&relative)))
        .find(|candidate| candidate.is_file())
}
