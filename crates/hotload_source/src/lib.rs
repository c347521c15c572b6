//! Source discovery on an ordered search path.
//!
//! This crate provides the [`SearchPath`] of source roots, the
//! [`SourceLocator`] that maps unit names to [`SourceHandle`]s, a directory
//! scan that lists every discoverable unit, and the [`PathFingerprint`] used
//! to detect structural changes (files added or removed) between reloads.

#![warn(missing_docs)]

pub mod fingerprint;
pub mod locator;
pub mod search_path;
pub mod source_file;

pub use fingerprint::PathFingerprint;
pub use locator::SourceLocator;
pub use search_path::SearchPath;
pub use source_file::{SourceHandle, Timestamp};
