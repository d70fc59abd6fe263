pub mod achievements;
pub mod activity;
pub mod milestones;
pub mod points;
pub mod rewards;
