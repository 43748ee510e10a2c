//! VFS backends.
//!
//! Backends implement [`Mapping`](crate::Mapping) for different storage
//! types. Only the host filesystem ships here; archive or network backends
//! plug in through [`Vfs::mount_mapping`](crate::Vfs::mount_mapping).

mod local;

pub use local::LocalMapping;
