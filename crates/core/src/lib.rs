//! Domain logic for the caltrack points and gamification engine.
//!
//! Pure rules (level table, milestone tiers, achievement codes, purchase
//! gating) live in their own modules; [`points`] ties them to storage
//! through the [`points::store::PointsStore`] seam.

pub mod achievements;
pub mod error;
pub mod levels;
pub mod milestones;
pub mod pagination;
pub mod points;
pub mod rewards;
pub mod roles;
pub mod types;
