//! XP Calculator
//!
//! Task rewards, project bonuses, habit diminishing returns and the
//! attribute-weighted split of an award.
//!
//! ## Task reward
//!
//! xp = round(TASK_BASE_XP * difficulty_multiplier * (1 + attribute_level * 0.05))
//!
//! | Difficulty | Multiplier |
//! |------------|------------|
//! | trivial    | 1          |
//! | easy       | 2          |
//! | medium     | 5          |
//! | hard       | 10         |
//! | epic       | 25         |

use super::attributes::{Attribute, AttributeWeights};
use crate::types::Difficulty;

/// Base XP scaled by the difficulty multiplier
pub const TASK_BASE_XP: f64 = 50.0;

/// Reward bonus per level of the primary attribute (5%)
pub const ATTRIBUTE_LEVEL_BONUS_RATE: f64 = 0.05;

/// Share of the project volume paid out on project completion
pub const PROJECT_BONUS_RATE: f64 = 0.10;

/// Same-difficulty completions inside the window before decay kicks in
pub const HABIT_DECAY_THRESHOLD: u32 = 5;

/// Rolling window for habit decay
pub const HABIT_DECAY_WINDOW_DAYS: i64 = 7;

/// Fraction of the nominal reward paid once decay applies
pub const HABIT_DECAY_FACTOR: f64 = 0.5;

/// Reward for a task, frozen at creation (or at a difficulty edit)
pub fn calculate_xp(difficulty: Difficulty, attribute_level: u32) -> u64 {
    let base = TASK_BASE_XP * difficulty.multiplier();
    let bonus = 1.0 + attribute_level as f64 * ATTRIBUTE_LEVEL_BONUS_RATE;
    (base * bonus).round() as u64
}

/// Bonus for completing a project with the given volume
pub fn project_bonus(volume: u64) -> u64 {
    (volume as f64 * PROJECT_BONUS_RATE).round() as u64
}

/// Reward for one habit completion.
///
/// `recent_same_difficulty` counts earlier completions of this habit at its
/// current difficulty inside the decay window. Never returns less than 1.
pub fn habit_reward(xp_value: u64, recent_same_difficulty: u32) -> u64 {
    let xp = if recent_same_difficulty >= HABIT_DECAY_THRESHOLD {
        (xp_value as f64 * HABIT_DECAY_FACTOR).round() as u64
    } else {
        xp_value
    };
    xp.max(1)
}

/// Per-attribute shares of an award.
///
/// With usable weights the split is proportional (remainder to the last
/// attribute); otherwise the whole amount goes to `primary`.
pub fn distribute_xp(
    total_xp: u64,
    primary: Attribute,
    weights: Option<&AttributeWeights>,
) -> Vec<(Attribute, u64)> {
    weights
        .filter(|w| !w.is_empty())
        .and_then(|w| w.split(total_xp))
        .unwrap_or_else(|| vec![(primary, total_xp)])
}
