//! Capability gates
//!
//! Pure functions of the player level deciding which features are usable.
//! A violation is always reported as an error, never silently downgraded.

use crate::error::{EngineError, Result};
use crate::types::Difficulty;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Level at which subtasks unlock (depth 1)
pub const LEVEL_SUBTASKS: u32 = 3;
/// Level at which habits unlock
pub const LEVEL_HABITS: u32 = 5;
/// Level at which projects unlock
pub const LEVEL_PROJECTS: u32 = 7;
/// Level at which subtask depth becomes unlimited
pub const LEVEL_DEEP_SUBTASKS: u32 = 10;

/// Level at which the active-task limit rises
const LEVEL_MORE_ACTIVE: u32 = 2;

/// Level-gated feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Subtasks,
    Habits,
    Projects,
}

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Feature::Subtasks => "subtasks",
            Feature::Habits => "habits",
            Feature::Projects => "projects",
        }
    }

    pub fn required_level(&self) -> u32 {
        match self {
            Feature::Subtasks => LEVEL_SUBTASKS,
            Feature::Habits => LEVEL_HABITS,
            Feature::Projects => LEVEL_PROJECTS,
        }
    }

    fn check(&self, level: u32) -> Result<()> {
        if level < self.required_level() {
            return Err(EngineError::Gate {
                feature: *self,
                required_level: self.required_level(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Minimum player level for each difficulty tier
pub fn difficulty_unlock_level(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Trivial => 0,
        Difficulty::Easy => 2,
        Difficulty::Medium => 5,
        Difficulty::Hard => 8,
        Difficulty::Epic => 12,
    }
}

/// Highest difficulty usable at `level`
pub fn max_difficulty_for_level(level: u32) -> Difficulty {
    Difficulty::ALL
        .iter()
        .copied()
        .filter(|d| level >= difficulty_unlock_level(*d))
        .max()
        .unwrap_or(Difficulty::Trivial)
}

pub fn can_use_difficulty(level: u32, difficulty: Difficulty) -> Result<()> {
    let required_level = difficulty_unlock_level(difficulty);
    if level < required_level {
        return Err(EngineError::DifficultyGate {
            difficulty,
            required_level,
            current_level: level,
        });
    }
    Ok(())
}

/// Maximum number of open (pending/active) leaf tasks
pub fn max_active_tasks(level: u32) -> usize {
    if level >= LEVEL_MORE_ACTIVE {
        5
    } else {
        3
    }
}

/// Maximum depth of a new task below a root (root = depth 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubtaskDepth {
    Limited(u32),
    Unlimited,
}

impl SubtaskDepth {
    pub fn allows(&self, depth: u32) -> bool {
        match self {
            SubtaskDepth::Limited(max) => depth <= *max,
            SubtaskDepth::Unlimited => true,
        }
    }
}

pub fn max_subtask_depth(level: u32) -> SubtaskDepth {
    if level < LEVEL_SUBTASKS {
        SubtaskDepth::Limited(0)
    } else if level < LEVEL_DEEP_SUBTASKS {
        SubtaskDepth::Limited(1)
    } else {
        SubtaskDepth::Unlimited
    }
}

pub fn can_create_habit(level: u32) -> Result<()> {
    Feature::Habits.check(level)
}

pub fn can_create_project(level: u32) -> Result<()> {
    Feature::Projects.check(level)
}

/// Check that a new task may sit at `requested_depth`
pub fn can_attach_to_parent(level: u32, requested_depth: u32) -> Result<()> {
    if requested_depth == 0 {
        return Ok(());
    }
    match max_subtask_depth(level) {
        SubtaskDepth::Unlimited => Ok(()),
        SubtaskDepth::Limited(0) => Feature::Subtasks.check(level),
        SubtaskDepth::Limited(max) if requested_depth > max => Err(EngineError::SubtaskDepth {
            requested: requested_depth,
            max,
            level,
        }),
        SubtaskDepth::Limited(_) => Ok(()),
    }
}

/// Gate state at one level, for status views
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSummary {
    pub level: u32,
    pub max_active_tasks: usize,
    pub max_subtask_depth: SubtaskDepth,
    pub habits: bool,
    pub projects: bool,
    pub max_difficulty: Difficulty,
    /// Level that unlocks the next difficulty tier, if one remains
    pub next_difficulty_level: Option<u32>,
}

impl GateSummary {
    pub fn for_level(level: u32) -> Self {
        let max_difficulty = max_difficulty_for_level(level);
        Self {
            level,
            max_active_tasks: max_active_tasks(level),
            max_subtask_depth: max_subtask_depth(level),
            habits: can_create_habit(level).is_ok(),
            projects: can_create_project(level).is_ok(),
            max_difficulty,
            next_difficulty_level: max_difficulty.next().map(difficulty_unlock_level),
        }
    }
}
