//! Local filesystem mapping.
//!
//! Translates logical paths to host paths by swapping the mount point for
//! the mapping's root, then performs plain `std::fs` I/O.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{VfsError, VfsResult};
use crate::mapping::Mapping;
use crate::path::LogicalPath;
use crate::permissions::Permissions;
use crate::router::Vfs;

/// Local filesystem mapping.
///
/// With `mount_point = "project://"` and `mount_path = "/home/amy/project"`,
/// `project://src/main.rs` is `/home/amy/project/src/main.rs`.
///
/// The mount path may itself be a logical path (`assets://mods`), in which
/// case it is expanded through the router on every call. An empty mount
/// path is an absolute passthrough: logical paths are used as host paths
/// unchanged.
#[derive(Debug, Clone)]
pub struct LocalMapping {
    mount_point: String,
    mount_path: String,
    permissions: Permissions,
}

impl LocalMapping {
    /// Create a read-write mapping.
    pub fn new(mount_point: impl Into<String>, mount_path: impl Into<String>) -> Self {
        Self {
            mount_point: mount_point.into(),
            mount_path: mount_path.into(),
            permissions: Permissions::READ_WRITE,
        }
    }

    /// Create a read-only mapping.
    pub fn read_only(mount_point: impl Into<String>, mount_path: impl Into<String>) -> Self {
        Self::new(mount_point, mount_path).with_permissions(Permissions::READ)
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    /// True for the empty-root mapping that exposes host paths directly.
    pub fn is_passthrough(&self) -> bool {
        self.mount_path.is_empty()
    }

    /// Root directory in native form, always ending in `/`.
    fn root(&self, vfs: &Vfs, need_existing_file: bool) -> LogicalPath {
        let literal = LogicalPath::new(&self.mount_path).as_directory();
        if !literal.is_virtual() {
            return literal;
        }
        vfs.resolve_mount_path(&self.mount_point, &self.mount_path, need_existing_file)
            .unwrap_or(literal)
    }

    /// Host path for `path`, or `None` if it still names a virtual location.
    fn host_path(&self, vfs: &Vfs, path: &LogicalPath) -> Option<PathBuf> {
        if !path.is_valid() {
            return None;
        }
        let expanded = self.expand_path(vfs, path, false);
        if expanded.is_virtual() {
            return None;
        }
        Some(PathBuf::from(expanded.full_path()))
    }

    /// Walk below `root` once, keeping only directories or only files.
    ///
    /// Symlinks are followed: a link to a directory is listed and descended
    /// into as a directory. Link loops surface as entry errors and are
    /// skipped.
    fn walk(
        root: &Path,
        directory: &LogicalPath,
        recursive: bool,
        want_dirs: bool,
        out: &mut Vec<LogicalPath>,
    ) -> VfsResult<()> {
        let max_depth = if recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.path() == Some(root) => return Err(err.into()),
                Err(err) => {
                    tracing::warn!("skipping unreadable entry under {}: {err}", root.display());
                    continue;
                }
            };
            if entry.file_type().is_dir() != want_dirs {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let mut relative = relative.to_string_lossy().replace('\\', "/");
            if want_dirs {
                relative.push('/');
            }
            out.push(directory.join(relative));
        }
        Ok(())
    }
}

impl Mapping for LocalMapping {
    fn mount_point(&self) -> &str {
        &self.mount_point
    }

    fn mount_path(&self) -> &str {
        &self.mount_path
    }

    fn permissions(&self) -> Permissions {
        self.permissions
    }

    fn set_permissions(&mut self, permissions: Permissions) {
        self.permissions = permissions;
    }

    fn exists(&self, vfs: &Vfs, path: &LogicalPath) -> bool {
        match self.host_path(vfs, path) {
            Some(host) if path.is_directory() => host.is_dir(),
            Some(host) => host.exists(),
            None => false,
        }
    }

    fn expand_path(&self, vfs: &Vfs, path: &LogicalPath, need_existing_file: bool) -> LogicalPath {
        if self.is_passthrough() {
            return path.clone();
        }

        let root = self.root(vfs, need_existing_file);
        let full = path.full_path();
        let relative = match full.find(self.mount_point.as_str()) {
            Some(idx) => &full[idx + self.mount_point.len()..],
            None => full,
        };
        LogicalPath::new(format!(
            "{}{}",
            root.full_path(),
            relative.trim_start_matches('/')
        ))
    }

    fn native_path(&self, vfs: &Vfs, path: &LogicalPath) -> Option<PathBuf> {
        self.host_path(vfs, path)
    }

    fn read(&self, vfs: &Vfs, path: &LogicalPath) -> VfsResult<Vec<u8>> {
        let Some(host) = self.host_path(vfs, path) else {
            return Ok(Vec::new());
        };
        if path.is_directory() || !host.is_file() {
            return Ok(Vec::new());
        }
        match fs::read(&host) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, vfs: &Vfs, path: &LogicalPath, data: &[u8], append: bool) -> VfsResult<()> {
        if path.is_directory() {
            return Err(VfsError::is_a_directory(path.full_path()));
        }
        let host = self
            .host_path(vfs, path)
            .ok_or_else(|| VfsError::invalid_path(format!("{path} has no host location")))?;

        if let Some(parent) = host.parent() {
            fs::create_dir_all(parent)?;
        }

        if append {
            let mut file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&host)?;
            file.write_all(data)?;
        } else {
            fs::write(&host, data)?;
        }
        Ok(())
    }

    fn remove(&self, vfs: &Vfs, path: &LogicalPath) -> VfsResult<()> {
        let Some(host) = self.host_path(vfs, path) else {
            return Ok(());
        };
        if host.is_dir() {
            self.remove_directory(vfs, path)?;
            return Ok(());
        }
        match fs::remove_file(&host) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn create_directory(&self, vfs: &Vfs, path: &LogicalPath) -> VfsResult<bool> {
        let Some(host) = self.host_path(vfs, &path.as_directory()) else {
            return Ok(false);
        };
        fs::create_dir_all(&host)?;
        Ok(host.is_dir())
    }

    fn remove_directory(&self, vfs: &Vfs, path: &LogicalPath) -> VfsResult<bool> {
        let Some(host) = self.host_path(vfs, &path.as_directory()) else {
            return Ok(false);
        };
        if !host.is_dir() {
            return Ok(false);
        }
        fs::remove_dir_all(&host)?;
        Ok(true)
    }

    fn get_files(
        &self,
        vfs: &Vfs,
        directory: &LogicalPath,
        recursive: bool,
    ) -> VfsResult<Vec<LogicalPath>> {
        let directory = directory.as_directory();
        let Some(root) = self.host_path(vfs, &directory) else {
            return Ok(Vec::new());
        };
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        Self::walk(&root, &directory, recursive, true, &mut entries)?;
        Self::walk(&root, &directory, recursive, false, &mut entries)?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (Vfs, LocalMapping, TempDir) {
        let dir = TempDir::new().unwrap();
        let mapping = LocalMapping::new("project://", dir.path().to_string_lossy());
        (Vfs::new(), mapping, dir)
    }

    fn p(s: &str) -> LogicalPath {
        LogicalPath::new(s)
    }

    #[test]
    fn test_expand_path() {
        let vfs = Vfs::new();
        let mapping = LocalMapping::new("project://", "/tmp/proj");
        let native = mapping.expand_path(&vfs, &p("project://a/b.txt"), false);
        assert_eq!(native.full_path(), "/tmp/proj/a/b.txt");

        let root = mapping.expand_path(&vfs, &p("project://"), false);
        assert_eq!(root.full_path(), "/tmp/proj/");
        assert!(root.is_directory());
    }

    #[test]
    fn test_expand_path_passthrough() {
        let vfs = Vfs::new();
        let mapping = LocalMapping::new("", "");
        assert!(mapping.is_passthrough());
        let native = mapping.expand_path(&vfs, &p("/etc/hosts"), false);
        assert_eq!(native.full_path(), "/etc/hosts");
    }

    #[test]
    fn test_virtual_leftover_has_no_host_path() {
        let vfs = Vfs::new();
        let mapping = LocalMapping::new("", "");
        assert!(mapping.native_path(&vfs, &p("assets://x.png")).is_none());
        assert!(!mapping.exists(&vfs, &p("assets://x.png")));
        assert!(matches!(
            mapping.write(&vfs, &p("assets://x.png"), b"x", false),
            Err(VfsError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_write_creates_parents_and_reads_back() {
        let (vfs, mapping, dir) = setup();
        let file = p("project://deep/er/still/file.bin");
        mapping.write(&vfs, &file, &[0, 1, 2, 255], false).unwrap();

        assert!(dir.path().join("deep/er/still/file.bin").is_file());
        assert_eq!(mapping.read(&vfs, &file).unwrap(), vec![0, 1, 2, 255]);
        assert!(mapping.exists(&vfs, &file));
    }

    #[test]
    fn test_write_append() {
        let (vfs, mapping, _dir) = setup();
        let file = p("project://log.txt");
        mapping.write_text(&vfs, &file, "one\n", true).unwrap();
        mapping.write_text(&vfs, &file, "two\n", true).unwrap();
        assert_eq!(mapping.read_text(&vfs, &file).unwrap(), "one\ntwo\n");

        mapping.write_text(&vfs, &file, "reset", false).unwrap();
        assert_eq!(mapping.read_text(&vfs, &file).unwrap(), "reset");
    }

    #[test]
    fn test_write_to_directory_path_fails() {
        let (vfs, mapping, _dir) = setup();
        let result = mapping.write(&vfs, &p("project://dir/"), b"x", false);
        assert!(matches!(result, Err(VfsError::IsADirectory(_))));
    }

    #[test]
    fn test_read_missing_is_empty() {
        let (vfs, mapping, _dir) = setup();
        assert!(mapping.read(&vfs, &p("project://nope.txt")).unwrap().is_empty());
        assert_eq!(mapping.read_text(&vfs, &p("project://nope.txt")).unwrap(), "");
        assert!(!mapping.exists(&vfs, &p("project://nope.txt")));
    }

    #[test]
    fn test_read_directory_is_empty() {
        let (vfs, mapping, dir) = setup();
        fs::create_dir(dir.path().join("sub")).unwrap();
        assert!(mapping.read(&vfs, &p("project://sub")).unwrap().is_empty());
    }

    #[test]
    fn test_read_text_strips_bom() {
        let (vfs, mapping, dir) = setup();
        fs::write(dir.path().join("bom.json"), b"\xEF\xBB\xBF{}").unwrap();
        assert_eq!(mapping.read_text(&vfs, &p("project://bom.json")).unwrap(), "{}");
    }

    #[test]
    fn test_read_text_invalid_utf8() {
        let (vfs, mapping, dir) = setup();
        fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0xfd]).unwrap();
        let result = mapping.read_text(&vfs, &p("project://bad.txt"));
        assert!(matches!(result, Err(VfsError::Utf8(_))));
    }

    #[test]
    fn test_directory_exists_only_as_directory() {
        let (vfs, mapping, dir) = setup();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("file.txt"), b"x").unwrap();

        assert!(mapping.exists(&vfs, &p("project://sub/")));
        assert!(mapping.exists(&vfs, &p("project://sub")));
        assert!(mapping.exists(&vfs, &p("project://file.txt")));
        assert!(!mapping.exists(&vfs, &p("project://file.txt/")));
    }

    #[test]
    fn test_create_and_remove_directory() {
        let (vfs, mapping, dir) = setup();
        assert!(mapping.create_directory(&vfs, &p("project://a/b")).unwrap());
        assert!(dir.path().join("a/b").is_dir());

        // Creating again is fine.
        assert!(mapping.create_directory(&vfs, &p("project://a/b/")).unwrap());

        fs::write(dir.path().join("a/b/inner.txt"), b"x").unwrap();
        assert!(mapping.remove_directory(&vfs, &p("project://a")).unwrap());
        assert!(!dir.path().join("a").exists());
        assert!(!mapping.remove_directory(&vfs, &p("project://a")).unwrap());
    }

    #[test]
    fn test_remove() {
        let (vfs, mapping, dir) = setup();
        fs::write(dir.path().join("gone.txt"), b"x").unwrap();
        mapping.remove(&vfs, &p("project://gone.txt")).unwrap();
        assert!(!dir.path().join("gone.txt").exists());

        // Missing file is a no-op.
        mapping.remove(&vfs, &p("project://gone.txt")).unwrap();
    }

    #[test]
    fn test_get_files_directories_first() {
        let (vfs, mapping, dir) = setup();
        fs::create_dir_all(dir.path().join("zeta/inner")).unwrap();
        fs::create_dir_all(dir.path().join("alpha")).unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("zeta/inner/deep.txt"), b"d").unwrap();

        let top = mapping.get_files(&vfs, &p("project://"), false).unwrap();
        let names: Vec<_> = top.iter().map(|e| e.full_path()).collect();
        assert_eq!(
            names,
            vec!["project://alpha/", "project://zeta/", "project://a.txt", "project://b.txt"]
        );

        let all = mapping.get_files(&vfs, &p("project://"), true).unwrap();
        let names: Vec<_> = all.iter().map(|e| e.full_path()).collect();
        assert_eq!(
            names,
            vec![
                "project://alpha/",
                "project://zeta/",
                "project://zeta/inner/",
                "project://a.txt",
                "project://b.txt",
                "project://zeta/inner/deep.txt",
            ]
        );
    }

    #[test]
    fn test_get_files_keeps_logical_prefix() {
        let (vfs, mapping, dir) = setup();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("a/b.txt"), b"b").unwrap();

        let entries = mapping.get_files(&vfs, &p("project://a"), false).unwrap();
        assert_eq!(entries, vec![p("project://a/b.txt")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_get_files_follows_directory_symlinks() {
        let (vfs, mapping, dir) = setup();
        let shared = TempDir::new().unwrap();
        fs::write(shared.path().join("tex.png"), b"png").unwrap();
        std::os::unix::fs::symlink(shared.path(), dir.path().join("linked")).unwrap();

        let top = mapping.get_files(&vfs, &p("project://"), false).unwrap();
        assert_eq!(top, vec![p("project://linked/")]);

        let all = mapping.get_files(&vfs, &p("project://"), true).unwrap();
        assert_eq!(all, vec![p("project://linked/"), p("project://linked/tex.png")]);
    }

    #[test]
    fn test_get_files_missing_directory() {
        let (vfs, mapping, _dir) = setup();
        assert!(mapping.get_files(&vfs, &p("project://none"), true).unwrap().is_empty());
    }

    #[test]
    fn test_read_only_constructor() {
        let mapping = LocalMapping::read_only("assets://", "./assets");
        assert_eq!(mapping.permissions(), Permissions::READ);
        assert!(!mapping.permissions().can_write());
    }
}
