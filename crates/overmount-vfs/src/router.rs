//! The VFS router.
//!
//! [`Vfs`] owns the mount table and resolves every call to a mapping.
//!
//! Resolution walks mount points in table order and accepts a point when the
//! requested path's parent directory *contains* it. This is deliberately
//! looser than prefix matching: nested mounts registered as bare fragments
//! (`Textures/`) resolve anywhere they appear.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;

use crate::backends::LocalMapping;
use crate::error::VfsResult;
use crate::manifest::MountManifest;
use crate::mapping::Mapping;
use crate::path::LogicalPath;
use crate::permissions::Permissions;

/// Information about a registered mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountInfo {
    /// Mount point key (e.g. `assets://`).
    pub point: String,
    /// Backend root as registered.
    pub path: String,
    pub permissions: Permissions,
}

/// Mount table and path-based file API.
///
/// Owned by the application root and passed by reference; there is no
/// global instance. Mutation (mount/unmount) needs `&mut self`, every file
/// operation only `&self`, so the two can never interleave.
///
/// `Vfs` is single-threaded (`!Sync`): it tracks in-flight mount-chain
/// expansion to stop self-referential chains.
#[derive(Default)]
pub struct Vfs {
    /// Mount point → mappings, both in insertion order. Never holds an
    /// empty list.
    mounts: IndexMap<String, Vec<Box<dyn Mapping>>>,
    /// Mappings whose mount path is currently being expanded.
    chain: RefCell<Vec<String>>,
    /// Set when a chain loops; the whole chain then falls back.
    chain_broken: Cell<bool>,
}

impl std::fmt::Debug for Vfs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vfs")
            .field("mounts", &self.mounts.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Vfs {
    /// Create an empty VFS.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Mount table
    // ========================================================================

    /// Mount a local directory (or a logical path into another mount) at
    /// `point`. The new mapping is appended after existing ones for the same
    /// point and starts out read-write.
    #[tracing::instrument(skip(self), name = "vfs.mount")]
    pub fn mount(&mut self, point: &str, path: &str) -> &mut dyn Mapping {
        let mapping = LocalMapping::new(normalize_separators(point), normalize_separators(path));
        self.mount_mapping(Box::new(mapping))
    }

    /// Mount `point` at `./<point>`, or an absolute passthrough mount when
    /// `point` is empty.
    pub fn mount_default(&mut self, point: &str) -> &mut dyn Mapping {
        if point.is_empty() {
            self.mount("", "")
        } else {
            self.mount(point, &format!("./{point}"))
        }
    }

    /// Register an arbitrary backend under its own mount point.
    pub fn mount_mapping(&mut self, mapping: Box<dyn Mapping>) -> &mut dyn Mapping {
        tracing::debug!(
            point = mapping.mount_point(),
            path = mapping.mount_path(),
            permissions = ?mapping.permissions(),
            "mounted"
        );
        let list = self.mounts.entry(mapping.mount_point().to_string()).or_default();
        let idx = list.len();
        list.push(mapping);
        &mut *list[idx]
    }

    /// Remove every mapping registered at `point`.
    ///
    /// Returns `true` if anything was removed.
    #[tracing::instrument(skip(self), name = "vfs.unmount")]
    pub fn unmount(&mut self, point: &str) -> bool {
        self.mounts.shift_remove(&normalize_separators(point)).is_some()
    }

    /// Remove the single mapping at `point` whose mount path is `path`.
    ///
    /// Returns `true` if a mapping was removed.
    #[tracing::instrument(skip(self), name = "vfs.unmount")]
    pub fn unmount_path(&mut self, point: &str, path: &str) -> bool {
        let point = normalize_separators(point);
        let path = normalize_separators(path);
        let Some(list) = self.mounts.get_mut(&point) else {
            return false;
        };
        let Some(idx) = list.iter().position(|m| m.mount_path() == path) else {
            return false;
        };
        list.remove(idx);
        if list.is_empty() {
            self.mounts.shift_remove(&point);
        }
        true
    }

    /// True if at least one mapping is registered at `point`.
    pub fn is_mounted(&self, point: &str) -> bool {
        self.mounts.contains_key(&normalize_separators(point))
    }

    /// List all mappings in resolution order.
    pub fn mounts(&self) -> Vec<MountInfo> {
        self.mounts
            .iter()
            .flat_map(|(point, list)| {
                list.iter().map(move |m| MountInfo {
                    point: point.clone(),
                    path: m.mount_path().to_string(),
                    permissions: m.permissions(),
                })
            })
            .collect()
    }

    /// Perform the mounts listed in a manifest, in order.
    ///
    /// Returns the number of mappings added.
    pub fn apply_manifest(&mut self, manifest: &MountManifest) -> usize {
        for entry in &manifest.mounts {
            let mapping = match &entry.path {
                Some(path) => self.mount(&entry.point, path),
                None => self.mount_default(&entry.point),
            };
            mapping.set_permissions(entry.permissions);
        }
        manifest.mounts.len()
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Find the mapping responsible for `file`.
    ///
    /// Mount points are tried in table order, mappings within a point in
    /// registration order. A mapping qualifies when its permissions
    /// intersect `required_permissions` and, if `need_existing_file` is set,
    /// the file exists in it.
    pub fn get_mapping(
        &self,
        file: &LogicalPath,
        need_existing_file: bool,
        required_permissions: Permissions,
    ) -> Option<&dyn Mapping> {
        for (point, list) in &self.mounts {
            if !file.parent_directory().contains(point.as_str()) {
                continue;
            }
            for mapping in list {
                if !mapping.permissions().intersects(required_permissions) {
                    continue;
                }
                if need_existing_file && !mapping.exists(self, file) {
                    continue;
                }
                return Some(&**mapping);
            }
        }
        None
    }

    /// Expand a logical path to its backend-native form.
    pub fn expand_path(&self, path: &LogicalPath, need_existing_file: bool) -> Option<LogicalPath> {
        let mapping = self.get_mapping(path, need_existing_file, Permissions::READ_WRITE)?;
        Some(mapping.expand_path(self, path, need_existing_file))
    }

    /// Host filesystem path for `path`, if its mapping is backed by one.
    pub fn native_path(&self, path: &LogicalPath) -> Option<PathBuf> {
        self.get_mapping(path, false, Permissions::READ_WRITE)?
            .native_path(self, path)
    }

    /// Expand a mapping's own mount path through the table (mount chaining).
    ///
    /// Returns `None` when nothing resolves it or when the chain leads back
    /// to a mapping already being expanded; callers then use the mount path
    /// literally.
    pub fn resolve_mount_path(
        &self,
        mount_point: &str,
        mount_path: &str,
        need_existing_file: bool,
    ) -> Option<LogicalPath> {
        let key = format!("{mount_point} => {mount_path}");
        if self.chain.borrow().contains(&key) {
            tracing::warn!(mount_point, mount_path, "mount chain loops back to itself");
            self.chain_broken.set(true);
            return None;
        }

        let frame = ChainFrame::enter(self, key);
        let root = LogicalPath::new(mount_path).as_directory();
        let expanded = self.expand_path(&root, need_existing_file);
        let broken = self.chain_broken.get();
        if frame.outermost {
            self.chain_broken.set(false);
        }
        if broken { None } else { expanded }
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// True if some readable mapping holds `path`.
    pub fn exists(&self, path: &LogicalPath) -> bool {
        self.get_mapping(path, true, Permissions::READ).is_some()
    }

    /// Read a whole file. Missing files read as empty.
    pub fn read(&self, path: &LogicalPath) -> VfsResult<Vec<u8>> {
        match self.readable(path) {
            Some(mapping) => mapping.read(self, path),
            None => Ok(Vec::new()),
        }
    }

    /// Read a whole file as text. Missing files read as empty.
    pub fn read_text(&self, path: &LogicalPath) -> VfsResult<String> {
        match self.readable(path) {
            Some(mapping) => mapping.read_text(self, path),
            None => Ok(String::new()),
        }
    }

    /// List a directory: subdirectories first, then files.
    #[tracing::instrument(
        skip_all,
        fields(directory = %directory, recursive = recursive),
        name = "vfs.get_files"
    )]
    pub fn get_files(
        &self,
        directory: &LogicalPath,
        recursive: bool,
    ) -> VfsResult<Vec<LogicalPath>> {
        let directory = directory.as_directory();
        match self.readable(&directory) {
            Some(mapping) => mapping.get_files(self, &directory, recursive),
            None => Ok(Vec::new()),
        }
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Write a file through the first writable mapping.
    ///
    /// Returns `false` (and writes nothing) when no writable mapping exists.
    pub fn write(
        &self,
        path: &LogicalPath,
        data: impl AsRef<[u8]>,
        append: bool,
    ) -> VfsResult<bool> {
        match self.writable(path) {
            Some(mapping) => mapping.write(self, path, data.as_ref(), append).map(|_| true),
            None => Ok(false),
        }
    }

    /// Write a text file, see [`write`](Self::write).
    pub fn write_text(&self, path: &LogicalPath, text: &str, append: bool) -> VfsResult<bool> {
        match self.writable(path) {
            Some(mapping) => mapping.write_text(self, path, text, append).map(|_| true),
            None => Ok(false),
        }
    }

    /// Copy a file or directory tree.
    #[tracing::instrument(
        skip_all,
        fields(source = %source, destination = %destination),
        name = "vfs.copy"
    )]
    pub fn copy(&self, source: &LogicalPath, destination: &LogicalPath) -> VfsResult<bool> {
        match self.readable(source) {
            Some(mapping) => mapping.copy(self, source, destination),
            None => Ok(false),
        }
    }

    /// Move a file or directory tree.
    ///
    /// The source is resolved like [`remove`](Self::remove): only a
    /// writable mapping holding it qualifies, so nothing moves out of a
    /// read-only mount.
    #[tracing::instrument(
        skip_all,
        fields(source = %source, destination = %destination),
        name = "vfs.rename"
    )]
    pub fn rename(&self, source: &LogicalPath, destination: &LogicalPath) -> VfsResult<bool> {
        match self.get_mapping(source, true, Permissions::WRITE) {
            Some(mapping) => mapping.rename(self, source, destination),
            None => Ok(false),
        }
    }

    /// Remove a file. Returns `false` if nothing writable held it.
    pub fn remove(&self, path: &LogicalPath) -> VfsResult<bool> {
        match self.get_mapping(path, true, Permissions::WRITE) {
            Some(mapping) => mapping.remove(self, path).map(|_| true),
            None => Ok(false),
        }
    }

    /// Create a directory (and parents) through the first writable mapping.
    pub fn create_directory(&self, path: &LogicalPath) -> VfsResult<bool> {
        let directory = path.as_directory();
        match self.writable(&directory) {
            Some(mapping) => mapping.create_directory(self, &directory),
            None => Ok(false),
        }
    }

    /// Remove a directory tree.
    pub fn remove_directory(&self, path: &LogicalPath) -> VfsResult<bool> {
        let directory = path.as_directory();
        match self.get_mapping(&directory, true, Permissions::WRITE) {
            Some(mapping) => mapping.remove_directory(self, &directory),
            None => Ok(false),
        }
    }

    fn readable(&self, path: &LogicalPath) -> Option<&dyn Mapping> {
        let mapping = self.get_mapping(path, true, Permissions::READ);
        if mapping.is_none() {
            tracing::debug!(path = %path, "no readable mapping");
        }
        mapping
    }

    fn writable(&self, path: &LogicalPath) -> Option<&dyn Mapping> {
        let mapping = self.get_mapping(path, false, Permissions::WRITE);
        if mapping.is_none() {
            tracing::debug!(path = %path, "no writable mapping");
        }
        mapping
    }
}

/// One level of mount-chain expansion; popped on drop.
struct ChainFrame<'a> {
    vfs: &'a Vfs,
    outermost: bool,
}

impl<'a> ChainFrame<'a> {
    fn enter(vfs: &'a Vfs, key: String) -> Self {
        let mut chain = vfs.chain.borrow_mut();
        let outermost = chain.is_empty();
        chain.push(key);
        Self { vfs, outermost }
    }
}

impl Drop for ChainFrame<'_> {
    fn drop(&mut self) {
        self.vfs.chain.borrow_mut().pop();
    }
}

fn normalize_separators(s: &str) -> String {
    s.replace('\\', "/")
}
