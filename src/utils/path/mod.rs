//! Path utilities.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `resolve_from`)

pub mod fs;

pub use fs::{normalize_path, resolve_from};
