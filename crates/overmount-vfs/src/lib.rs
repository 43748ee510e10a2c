//! # overmount-vfs
//!
//! Mount-point addressed virtual filesystem.
//!
//! Application code names files by logical path (`assets://Textures/foo.png`)
//! and never by host path. A [`Vfs`] maps mount points to one or more
//! backends:
//!
//! - [`LogicalPath`] - parsed, normalized path value; the only path type
//!   crossing the API
//! - [`Mapping`] - backend contract (read/write/copy/enumerate + permissions)
//! - [`LocalMapping`] - host filesystem backend, with mount chaining and an
//!   absolute passthrough mode
//! - [`Vfs`] - mount table and resolution
//! - [`MountManifest`] - RON list of mounts to apply at startup
//!
//! ## Design Decisions
//!
//! - **Soft failure**: missing files read as empty, absent mappings turn
//!   writes into no-ops. Only real I/O failures are `Err`.
//! - **Overlay lists**: several mappings may share a mount point; reads take
//!   the first one holding the file, writes the first writable one.
//! - **Substring matching**: a mount point matches any path whose parent
//!   directory contains it.
//! - **Explicit context**: no global mount table; pass `&Vfs` around.
//!
//! ```no_run
//! use overmount_vfs::{LogicalPath, Mapping, Permissions, Vfs};
//!
//! # fn main() -> overmount_vfs::VfsResult<()> {
//! let mut vfs = Vfs::new();
//! vfs.mount("assets://", "./assets").set_permissions(Permissions::READ);
//! vfs.mount("assets://", "./mods/assets");
//!
//! let scene = vfs.read_text(&LogicalPath::new("assets://scenes/main.json"))?;
//! # let _ = scene;
//! # Ok(())
//! # }
//! ```

pub mod backends;
mod error;
mod manifest;
mod mapping;
mod path;
mod permissions;
mod router;

pub use backends::LocalMapping;
pub use error::{VfsError, VfsResult};
pub use manifest::{MountEntry, MountManifest};
pub use mapping::Mapping;
pub use path::{LogicalPath, SCHEME_MARKER};
pub use permissions::Permissions;
pub use router::{MountInfo, Vfs};
