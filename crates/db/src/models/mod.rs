//! Row structs for the points tables.
//!
//! Each submodule contains a `FromRow` struct matching the database row and
//! the conversion into the matching `caltrack_core` record.

pub mod achievement;
pub mod milestone;
pub mod points;
pub mod reward;
