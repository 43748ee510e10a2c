//! RON mount manifests.
//!
//! A manifest lists mounts to perform at startup, in order:
//!
//! ```ron
//! (
//!     mounts: [
//!         (point: "assets://", path: Some("./assets"), permissions: "READ"),
//!         (point: "assets://", path: Some("./mods/assets")),
//!         (point: "project://", path: Some("/home/amy/game")),
//!         (point: "", path: Some("")),
//!     ],
//! )
//! ```
//!
//! `path: None` (or omitted) means `./<point>`; `permissions` defaults to
//! `"READ | WRITE"`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::VfsResult;
use crate::path::LogicalPath;
use crate::permissions::Permissions;
use crate::router::Vfs;

/// Ordered list of mounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountManifest {
    #[serde(default)]
    pub mounts: Vec<MountEntry>,
}

/// One `mount` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountEntry {
    #[serde(default)]
    pub point: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_permissions")]
    pub permissions: Permissions,
}

fn default_permissions() -> Permissions {
    Permissions::READ_WRITE
}

impl MountManifest {
    /// Parse a manifest from RON text.
    pub fn from_ron(text: &str) -> VfsResult<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Load a manifest from a host file.
    pub fn load(path: impl AsRef<Path>) -> VfsResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Load a manifest through the VFS itself.
    ///
    /// Returns `None` when the file is absent or empty.
    pub fn read_from(vfs: &Vfs, path: &LogicalPath) -> VfsResult<Option<Self>> {
        let text = vfs.read_text(path)?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        Self::from_ron(&text).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_defaults() {
        let manifest = MountManifest::from_ron(r#"(mounts: [(point: "cache")])"#).unwrap();
        assert_eq!(
            manifest.mounts,
            vec![MountEntry {
                point: "cache".to_string(),
                path: None,
                permissions: Permissions::READ_WRITE,
            }]
        );
    }

    #[test]
    fn test_parse_empty() {
        let manifest = MountManifest::from_ron("(mounts: [])").unwrap();
        assert!(manifest.mounts.is_empty());
    }

    #[test]
    fn test_parse_error() {
        let result = MountManifest::from_ron("(mounts: [(point: 42)])");
        assert!(matches!(result, Err(crate::VfsError::Manifest(_))));
    }

    #[test]
    fn test_load_from_host_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("mounts.ron");
        fs::write(
            &file,
            r#"(mounts: [(point: "save://", path: Some("/var/save"), permissions: "WRITE")])"#,
        )
        .unwrap();

        let manifest = MountManifest::load(&file).unwrap();
        assert_eq!(manifest.mounts[0].path.as_deref(), Some("/var/save"));
        assert_eq!(manifest.mounts[0].permissions, Permissions::WRITE);
    }

    #[test]
    fn test_read_through_vfs() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("mounts.ron"),
            r#"(mounts: [(point: "mods://", path: Some("project://mods"))])"#,
        )
        .unwrap();

        let mut vfs = Vfs::new();
        vfs.mount("project://", &dir.path().to_string_lossy());

        let manifest = MountManifest::read_from(&vfs, &LogicalPath::new("project://mounts.ron"))
            .unwrap()
            .unwrap();
        vfs.apply_manifest(&manifest);
        assert!(vfs.is_mounted("mods://"));

        let missing =
            MountManifest::read_from(&vfs, &LogicalPath::new("project://none.ron")).unwrap();
        assert!(missing.is_none());
    }
}
