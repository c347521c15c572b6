//! Shared foundational types used across the hotload runtime.
//!
//! This crate provides content hashing for the persisted caches and the
//! dotted unit-name conventions (nesting separator, owning package, source
//! path mapping) that every other crate agrees on.

#![warn(missing_docs)]

pub mod hash;
pub mod unit_name;

pub use hash::ContentHash;
pub use unit_name::{
    name_from_relative_path, outer_unit, owning_package, package_path, relative_path,
    NESTING_SEPARATOR,
};
