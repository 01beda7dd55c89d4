//! Filesystem layer for Hook Manager
//!
//! Provides content checksums, the on-disk cache layout, atomic I/O and
//! file type tagging used by the higher layers.

pub mod checksum;
pub mod error;
pub mod io;
pub mod layout;
pub mod tags;

pub use checksum::{compute_content_checksum, fingerprint_files};
pub use error::{Error, Result};
pub use layout::CacheLayout;
pub use tags::tags_for_path;
