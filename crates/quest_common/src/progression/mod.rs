//! Progression Module v0.1.0
//!
//! RPG-style leveling for the player and the nine attribute tracks.
//!
//! ## Level System
//!
//! - XP required for level L: ceil(500 * L^1.5)
//! - Attributes use the same curve on their own XP pools
//! - Task rewards scale with difficulty and the primary attribute's level

pub mod attributes;
pub mod levels;
pub mod xp;

pub use attributes::{parse_attributes, Attribute, AttributeWeights, AttributeXp};
pub use levels::{
    attribute_level_for_xp, level_for_total_xp, xp_required_for_level, LevelProgress,
};
pub use xp::{
    calculate_xp, distribute_xp, habit_reward, project_bonus, HABIT_DECAY_WINDOW_DAYS,
};
