//! The mapping contract.
//!
//! A [`Mapping`] binds a storage backend to a mount point. The router picks
//! a mapping for each call and hands it the [`Vfs`] so the mapping can
//! resolve its own mount path through other mounts (mount chaining) and
//! re-resolve copy/move destinations.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{VfsError, VfsResult};
use crate::path::LogicalPath;
use crate::permissions::Permissions;
use crate::router::Vfs;

/// A storage backend registered under a mount point.
///
/// Missing files are never errors: reads return empty content, removals are
/// no-ops and enumeration of a missing directory is empty. `Err` is reserved
/// for real backend failures.
///
/// A directory path (trailing `/`) only exists if a directory is there.
pub trait Mapping: fmt::Debug {
    /// Key this mapping is registered under (e.g. `assets://`).
    fn mount_point(&self) -> &str;

    /// Backend root. May itself be a logical path into another mount.
    fn mount_path(&self) -> &str;

    fn permissions(&self) -> Permissions;

    fn set_permissions(&mut self, permissions: Permissions);

    fn exists(&self, vfs: &Vfs, path: &LogicalPath) -> bool;

    /// Translate a logical path into this backend's native form.
    fn expand_path(&self, vfs: &Vfs, path: &LogicalPath, need_existing_file: bool) -> LogicalPath;

    /// Host filesystem path, for backends that have one.
    fn native_path(&self, _vfs: &Vfs, _path: &LogicalPath) -> Option<PathBuf> {
        None
    }

    fn read(&self, vfs: &Vfs, path: &LogicalPath) -> VfsResult<Vec<u8>>;

    /// Read a file as UTF-8, dropping a leading byte-order mark.
    fn read_text(&self, vfs: &Vfs, path: &LogicalPath) -> VfsResult<String> {
        let mut bytes = self.read(vfs, path)?;
        if bytes.starts_with(UTF8_BOM) {
            bytes.drain(..UTF8_BOM.len());
        }
        Ok(String::from_utf8(bytes)?)
    }

    /// Write a file, creating missing parent directories.
    fn write(&self, vfs: &Vfs, path: &LogicalPath, data: &[u8], append: bool) -> VfsResult<()>;

    fn write_text(&self, vfs: &Vfs, path: &LogicalPath, text: &str, append: bool) -> VfsResult<()> {
        self.write(vfs, path, text.as_bytes(), append)
    }

    fn remove(&self, vfs: &Vfs, path: &LogicalPath) -> VfsResult<()>;

    /// Create a directory and its parents. Returns whether it exists afterwards.
    fn create_directory(&self, vfs: &Vfs, path: &LogicalPath) -> VfsResult<bool>;

    /// Remove a directory and its contents. Returns `false` if it was absent.
    fn remove_directory(&self, vfs: &Vfs, path: &LogicalPath) -> VfsResult<bool>;

    /// List subdirectories (trailing `/`) and then files below `directory`,
    /// expressed under the same logical prefix as `directory`.
    fn get_files(
        &self,
        vfs: &Vfs,
        directory: &LogicalPath,
        recursive: bool,
    ) -> VfsResult<Vec<LogicalPath>>;

    /// Copy a file or directory tree. The destination is resolved through
    /// the router and may live in a different mapping.
    fn copy(&self, vfs: &Vfs, source: &LogicalPath, destination: &LogicalPath) -> VfsResult<bool> {
        transfer(self, vfs, source, destination, Transfer::Copy)
    }

    /// Move a file or directory tree, see [`copy`](Self::copy).
    ///
    /// Moving removes the source, so this mapping must be writable; a
    /// read-only source makes the move a no-op returning `false`.
    fn rename(
        &self,
        vfs: &Vfs,
        source: &LogicalPath,
        destination: &LogicalPath,
    ) -> VfsResult<bool> {
        transfer(self, vfs, source, destination, Transfer::Move)
    }
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Copy,
    Move,
}

fn transfer<M: Mapping + ?Sized>(
    mapping: &M,
    vfs: &Vfs,
    source: &LogicalPath,
    destination: &LogicalPath,
    op: Transfer,
) -> VfsResult<bool> {
    if op == Transfer::Move && !mapping.permissions().can_write() {
        tracing::debug!(source = %source, "source mapping is read-only, not moving");
        return Ok(false);
    }

    let destination = if destination.is_directory() {
        destination.join(source.file_name())
    } else {
        destination.clone()
    };

    if mapping.exists(vfs, &source.as_directory()) {
        transfer_directory(mapping, vfs, &source.as_directory(), &destination.as_directory(), op)
    } else if !source.is_directory() && mapping.exists(vfs, source) {
        transfer_file(mapping, vfs, source, &destination, op)
    } else {
        tracing::debug!(source = %source, "transfer source does not exist");
        Ok(false)
    }
}

fn transfer_file<M: Mapping + ?Sized>(
    mapping: &M,
    vfs: &Vfs,
    source: &LogicalPath,
    destination: &LogicalPath,
    op: Transfer,
) -> VfsResult<bool> {
    if source == destination {
        return Ok(true);
    }

    let Some(target) = vfs.get_mapping(destination, false, Permissions::WRITE) else {
        tracing::debug!(destination = %destination, "no writable mapping for destination");
        return Ok(false);
    };

    if let (Some(from), Some(to)) = (
        mapping.native_path(vfs, source),
        target.native_path(vfs, destination),
    ) {
        if same_host_path(&from, &to) {
            return Ok(true);
        }
        native_transfer_file(&from, &to, op)?;
        return Ok(true);
    }

    let data = mapping.read(vfs, source)?;
    target.write(vfs, destination, &data, false)?;
    if op == Transfer::Move {
        mapping.remove(vfs, source)?;
    }
    Ok(true)
}

/// True when two host paths name the same file or directory, e.g. through
/// two mounts of one directory.
fn same_host_path(from: &Path, to: &Path) -> bool {
    if from == to {
        return true;
    }
    match (fs::canonicalize(from), fs::canonicalize(to)) {
        (Ok(from), Ok(to)) => from == to,
        _ => false,
    }
}

fn native_transfer_file(from: &Path, to: &Path, op: Transfer) -> VfsResult<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    match op {
        Transfer::Copy => {
            fs::copy(from, to)?;
        }
        Transfer::Move => {
            if let Err(e) = fs::rename(from, to) {
                tracing::debug!("rename {} failed ({e}), copying instead", from.display());
                fs::copy(from, to)?;
                fs::remove_file(from)?;
            }
        }
    }
    Ok(())
}

fn transfer_directory<M: Mapping + ?Sized>(
    mapping: &M,
    vfs: &Vfs,
    source: &LogicalPath,
    destination: &LogicalPath,
    op: Transfer,
) -> VfsResult<bool> {
    if source == destination {
        return Ok(true);
    }
    if destination.strip_prefix(source).is_some() {
        return Err(VfsError::invalid_path(format!(
            "cannot transfer {source} into itself ({destination})"
        )));
    }

    let Some(target) = vfs.get_mapping(destination, false, Permissions::WRITE) else {
        tracing::debug!(destination = %destination, "no writable mapping for destination");
        return Ok(false);
    };

    if let (Some(from), Some(to)) = (
        mapping.native_path(vfs, source),
        target.native_path(vfs, destination),
    ) {
        if same_host_path(&from, &to) {
            return Ok(true);
        }
        if op == Transfer::Move && !to.exists() {
            if let Some(parent) = to.parent() {
                fs::create_dir_all(parent)?;
            }
            if fs::rename(&from, &to).is_ok() {
                return Ok(true);
            }
        }
    }

    target.create_directory(vfs, destination)?;
    for entry in mapping.get_files(vfs, source, true)? {
        let Some(suffix) = entry.strip_prefix(source) else {
            continue;
        };
        let child = destination.join(suffix);
        if entry.is_directory() {
            vfs.create_directory(&child)?;
        } else {
            transfer_file(mapping, vfs, &entry, &child, Transfer::Copy)?;
        }
    }

    if op == Transfer::Move {
        mapping.remove_directory(vfs, source)?;
    }
    Ok(true)
}
