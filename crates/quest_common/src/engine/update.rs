//! Task edits

use super::load_player;
use crate::error::{EngineError, Result};
use crate::gates;
use crate::progression::calculate_xp;
use crate::store::Repo;
use crate::types::{Difficulty, Task};
use tracing::info;

/// Set a new difficulty and re-freeze the reward at the current attribute level.
/// The habit decay counter is per difficulty, so a change starts a fresh bucket.
pub(super) fn update_task_difficulty(repo: &Repo<'_>, id: i64, difficulty: Difficulty) -> Result<Task> {
    let task = repo.require_task(id)?;
    if task.is_project {
        return Err(EngineError::ProjectDifficulty(id));
    }

    let player = load_player(repo)?;
    gates::can_use_difficulty(player.level, difficulty)?;

    let xp_value = calculate_xp(difficulty, player.attribute_level(task.attribute));
    repo.update_task_difficulty(id, difficulty, xp_value)?;
    info!(
        "task {} difficulty {} -> {} ({} xp)",
        id, task.difficulty, difficulty, xp_value
    );

    repo.require_task(id)
}
