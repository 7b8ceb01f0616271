//! Undo of the most recent completion

use super::{debit_xp, load_player};
use crate::error::{EngineError, Result};
use crate::store::Repo;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreResult {
    pub task_id: i64,
    pub xp_deducted: u64,
    pub level_before: u32,
    pub level_after: u32,
    pub level_down: bool,
}

/// Reverse the latest ledger row of `id`.
///
/// XP comes off the total and off the attributes the task currently credits
/// (weights, else primary), each counter clamped at zero. The task always ends
/// up `pending`, whatever kind it is. Blueprint unlocks are never revoked.
pub(super) fn restore_task(repo: &Repo<'_>, id: i64) -> Result<RestoreResult> {
    let task = repo.require_task(id)?;
    let last = repo
        .last_completion(id)?
        .ok_or(EngineError::NoCompletions(id))?;

    let mut player = load_player(repo)?;
    let level_before = player.level;

    debit_xp(&mut player, &task, last.xp_awarded);
    repo.update_player(&player)?;
    repo.delete_completion(last.id)?;
    repo.reset_task_to_pending(id)?;

    info!("restored {} {} (-{} xp)", task.kind().as_str(), id, last.xp_awarded);
    Ok(RestoreResult {
        task_id: id,
        xp_deducted: last.xp_awarded,
        level_before,
        level_after: player.level,
        level_down: player.level < level_before,
    })
}
