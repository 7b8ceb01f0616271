//! Task, project and habit completion

use super::tree::TaskIndex;
use super::{credit_xp, habits, load_player, refresh_unlocks_after_level_up};
use crate::error::{EngineError, Result};
use crate::progression::project_bonus;
use crate::store::Repo;
use crate::types::{Player, Task, TaskKind, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteResult {
    pub task_id: i64,
    pub xp_awarded: u64,
    pub level_before: u32,
    pub level_after: u32,
    pub level_up: bool,
    /// Set for project completions
    pub project_bonus: bool,
    pub project_volume: u64,
    /// A habit reached its goal and is now done
    pub habit_completed: bool,
    /// Blueprints that became available through the level-up
    pub unlocked: Vec<String>,
}

/// What one completion path awarded
pub(super) struct Award {
    pub xp: u64,
    pub project_volume: Option<u64>,
    pub habit_completed: bool,
}

pub(super) fn complete_task(repo: &Repo<'_>, id: i64, now: DateTime<Utc>) -> Result<CompleteResult> {
    let mut player = load_player(repo)?;
    let level_before = player.level;

    let task = repo.require_task(id)?;
    if task.is_done() {
        return Err(EngineError::AlreadyDone(id));
    }

    let award = match task.kind() {
        TaskKind::Habit => habits::complete_habit(repo, &task, &mut player, now)?,
        TaskKind::Project => complete_project(repo, &task, &mut player, now)?,
        TaskKind::Task => complete_leaf(repo, &task, &mut player, now)?,
    };

    let level_up = player.level > level_before;
    let unlocked = if level_up {
        info!("level up: {} -> {}", level_before, player.level);
        refresh_unlocks_after_level_up(repo)
    } else {
        Vec::new()
    };

    info!("completed {} {} for {} xp", task.kind().as_str(), id, award.xp);
    Ok(CompleteResult {
        task_id: id,
        xp_awarded: award.xp,
        level_before,
        level_after: player.level,
        level_up,
        project_bonus: award.project_volume.is_some(),
        project_volume: award.project_volume.unwrap_or(0),
        habit_completed: award.habit_completed,
        unlocked,
    })
}

/// Shared tail of every completion: credit, persist the player, append the
/// ledger row.
pub(super) fn record_award(
    repo: &Repo<'_>,
    task: &Task,
    player: &mut Player,
    xp: u64,
    now: DateTime<Utc>,
) -> Result<()> {
    credit_xp(player, task, xp);
    repo.update_player(player)?;
    repo.insert_completion(task.id, now, task.difficulty, xp)?;
    Ok(())
}

fn complete_leaf(repo: &Repo<'_>, task: &Task, player: &mut Player, now: DateTime<Utc>) -> Result<Award> {
    if repo.count_children(task.id)? > 0 {
        return Err(EngineError::NotLeaf(task.id));
    }

    repo.mark_task_done(task.id, now)?;
    record_award(repo, task, player, task.xp_value, now)?;

    Ok(Award {
        xp: task.xp_value,
        project_volume: None,
        habit_completed: false,
    })
}

fn complete_project(repo: &Repo<'_>, task: &Task, player: &mut Player, now: DateTime<Utc>) -> Result<Award> {
    if task.status == TaskStatus::Planning {
        return Err(EngineError::ProjectPlanning(task.id));
    }

    let index = TaskIndex::build(repo.list_tasks()?);
    let stats = index.subtree(task.id);
    debug!(
        "project {}: volume {}, {} unfinished",
        task.id, stats.volume, stats.undone
    );
    if stats.undone > 0 {
        return Err(EngineError::ProjectUnfinished(task.id));
    }

    let bonus = project_bonus(stats.volume);
    repo.mark_task_done(task.id, now)?;
    record_award(repo, task, player, bonus, now)?;

    Ok(Award {
        xp: bonus,
        project_volume: Some(stats.volume),
        habit_completed: false,
    })
}
