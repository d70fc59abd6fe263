//! Repository layer.
//!
//! Each repository is a zero-sized struct. Reads accept `&PgPool`; writes
//! and row locks accept `&mut PgConnection` so they run inside the caller's
//! transaction.

pub mod achievement_repo;
pub mod milestone_repo;
pub mod points_repo;
pub mod reward_repo;
