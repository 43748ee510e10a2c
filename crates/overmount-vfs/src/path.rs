//! Logical paths.
//!
//! A [`LogicalPath`] is the only path type that crosses the VFS boundary.
//! Parsing never fails: malformed input produces a value whose
//! [`is_valid`](LogicalPath::is_valid) is `false`.
//!
//! ```text
//! assets://Textures/foo.png
//! ^^^^^^^^^^^^^^^^^^          parent_directory
//!                   ^^^^^^^   file_name
//!                      ^^^^   extension
//! ```

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Separator between a mount scheme and the rest of the path.
pub const SCHEME_MARKER: &str = "://";

/// A parsed, normalized virtual path.
///
/// Identity is the normalized [`full_path`](Self::full_path): equality,
/// ordering and hashing ignore everything else. Comparison is
/// case-sensitive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct LogicalPath {
    full_path: String,
    file_name: String,
    extension: String,
    parent_directory: String,
    is_directory: bool,
    is_valid: bool,
}

impl LogicalPath {
    /// Parse a path string.
    pub fn new(path: impl AsRef<str>) -> Self {
        let path = path.as_ref();
        if path.is_empty() {
            return Self::default();
        }

        if let Some(root) = mount_root(path) {
            return Self {
                full_path: root.clone(),
                parent_directory: root,
                is_directory: true,
                is_valid: true,
                ..Self::default()
            };
        }

        let is_directory = path.ends_with('/');
        let trimmed = path.trim_end_matches('/');
        let (parent_directory, file_name) = match trimmed.rfind('/') {
            Some(idx) => (&trimmed[..=idx], &trimmed[idx + 1..]),
            None => ("", trimmed),
        };

        let extension = if is_directory {
            ""
        } else {
            file_name.rfind('.').map_or("", |idx| &file_name[idx..])
        };

        let mut full_path = String::with_capacity(path.len());
        full_path.push_str(parent_directory);
        full_path.push_str(file_name);
        if is_directory && !file_name.is_empty() {
            full_path.push('/');
        }

        Self {
            full_path,
            file_name: file_name.to_string(),
            extension: extension.to_string(),
            parent_directory: parent_directory.to_string(),
            is_directory,
            is_valid: !file_name.is_empty(),
        }
    }

    /// The normalized path string.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Last path component, without any trailing slash.
    ///
    /// Empty for a bare mount root such as `assets://`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Extension including the leading dot (`.png`), empty for directories.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Everything up to and including the last `/`.
    pub fn parent_directory(&self) -> &str {
        &self.parent_directory
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// True for a bare `scheme://` path.
    pub fn is_mount_root(&self) -> bool {
        self.is_valid && self.file_name.is_empty()
    }

    /// True if the path carries a mount scheme anywhere.
    pub fn is_virtual(&self) -> bool {
        self.full_path.contains(SCHEME_MARKER)
    }

    /// File name with the extension stripped.
    pub fn file_name_without_extension(&self) -> &str {
        &self.file_name[..self.file_name.len() - self.extension.len()]
    }

    /// The same path as a directory (trailing slash).
    pub fn as_directory(&self) -> LogicalPath {
        if self.is_directory || !self.is_valid {
            self.clone()
        } else {
            LogicalPath::new(format!("{}/", self.full_path))
        }
    }

    /// Append a relative path below this one, treating `self` as a directory.
    pub fn join(&self, child: impl AsRef<str>) -> LogicalPath {
        let child = child.as_ref().trim_start_matches('/');
        if !self.is_valid {
            return LogicalPath::new(child);
        }
        LogicalPath::new(format!("{}{}", self.as_directory().full_path, child))
    }

    /// The part of this path below `base`, if `base` (as a directory) is a
    /// prefix of it.
    pub fn strip_prefix(&self, base: &LogicalPath) -> Option<&str> {
        let base = base.as_directory();
        self.full_path.strip_prefix(base.full_path.as_str())
    }
}

/// Detect `scheme://` (and `scheme:///...` with only slashes after the
/// marker), returning the canonical root string.
fn mount_root(path: &str) -> Option<String> {
    if path.ends_with(SCHEME_MARKER) {
        return Some(path.to_string());
    }
    let trimmed = path.trim_end_matches('/');
    let slashes = path.len() - trimmed.len();
    if slashes >= 3 && trimmed.ends_with(':') {
        return Some(format!("{trimmed}//"));
    }
    None
}

impl PartialEq for LogicalPath {
    fn eq(&self, other: &Self) -> bool {
        self.full_path == other.full_path
    }
}

impl Eq for LogicalPath {}

impl Hash for LogicalPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full_path.hash(state);
    }
}

impl PartialOrd for LogicalPath {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogicalPath {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.full_path.cmp(&other.full_path)
    }
}

impl PartialEq<str> for LogicalPath {
    fn eq(&self, other: &str) -> bool {
        self.full_path == LogicalPath::new(other).full_path
    }
}

impl PartialEq<&str> for LogicalPath {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path)
    }
}

impl FromStr for LogicalPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(LogicalPath::new(s))
    }
}

impl From<&str> for LogicalPath {
    fn from(s: &str) -> Self {
        LogicalPath::new(s)
    }
}

impl From<String> for LogicalPath {
    fn from(s: String) -> Self {
        LogicalPath::new(s)
    }
}

impl From<&String> for LogicalPath {
    fn from(s: &String) -> Self {
        LogicalPath::new(s)
    }
}

impl From<LogicalPath> for String {
    fn from(path: LogicalPath) -> Self {
        path.full_path
    }
}

impl AsRef<str> for LogicalPath {
    fn as_ref(&self) -> &str {
        &self.full_path
    }
}
